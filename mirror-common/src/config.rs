//! Configuration loading and data folder resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Data folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`data_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(cli_arg: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(folder) = config.get("data_folder").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(folder));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_data_folder())
}

/// Locate the configuration file for the platform
pub fn locate_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/mirrormirror/config.toml first, then /etc/mirrormirror/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("mirrormirror").join("config.toml"));
        let system_config = PathBuf::from("/etc/mirrormirror/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let config_path = dirs::config_dir()
        .map(|d| d.join("mirrormirror").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_path
        )))
    }
}

/// Get OS-dependent default data folder path
fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("mirrormirror"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/mirrormirror"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("mirrormirror"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/mirrormirror"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("mirrormirror"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\mirrormirror"))
    } else {
        PathBuf::from("./mirrormirror_data")
    }
}

/// Service-level TOML configuration
///
/// Keys the API server reads from the config file. All of them can be
/// overridden by environment variables (see mirror-api config resolution).
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TomlConfig {
    pub data_folder: Option<String>,
    pub bind_address: Option<String>,
    pub webex_client_id: Option<String>,
    pub webex_client_secret: Option<String>,
    pub webex_redirect_uri: Option<String>,
    pub chroma_url: Option<String>,
    pub chroma_collection: Option<String>,
}

impl TomlConfig {
    /// Load TOML config from the platform config file, or defaults when absent
    pub fn load() -> Self {
        let Ok(path) = locate_config_file() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_arg_wins_over_env() {
        std::env::set_var("MIRROR_TEST_FOLDER_A", "/tmp/from-env");
        let folder = resolve_data_folder(Some("/tmp/from-cli"), "MIRROR_TEST_FOLDER_A").unwrap();
        assert_eq!(folder, PathBuf::from("/tmp/from-cli"));
        std::env::remove_var("MIRROR_TEST_FOLDER_A");
    }

    #[test]
    fn env_wins_when_no_cli_arg() {
        std::env::set_var("MIRROR_TEST_FOLDER_B", "/tmp/from-env");
        let folder = resolve_data_folder(None, "MIRROR_TEST_FOLDER_B").unwrap();
        assert_eq!(folder, PathBuf::from("/tmp/from-env"));
        std::env::remove_var("MIRROR_TEST_FOLDER_B");
    }

    #[test]
    fn falls_back_to_default() {
        let folder = resolve_data_folder(None, "MIRROR_TEST_FOLDER_UNSET").unwrap();
        assert!(!folder.as_os_str().is_empty());
    }
}
