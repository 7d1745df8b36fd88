//! Configuration resolution for mirror-api
//!
//! Service settings resolve ENV → TOML → default. Integration credentials
//! (WebEx OAuth app, Chroma endpoint) are optional: the service starts
//! without them and the corresponding endpoints answer 503 until configured.

use mirror_common::config::TomlConfig;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5840";
pub const DEFAULT_CHROMA_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_CHROMA_COLLECTION: &str = "mirror_documents";

/// WebEx OAuth application credentials
#[derive(Debug, Clone)]
pub struct WebexConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub database_path: PathBuf,
    pub webex: Option<WebexConfig>,
    pub chroma_url: String,
    pub chroma_collection: String,
}

impl Config {
    /// Resolve configuration from environment variables and the TOML config
    /// file, with the data folder decided by the caller.
    pub fn resolve(data_folder: &PathBuf) -> Self {
        let toml = TomlConfig::load();

        let bind_address = env_or("MIRROR_BIND_ADDRESS", toml.bind_address.clone())
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let database_path = match std::env::var("MIRROR_DATABASE_PATH") {
            Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => data_folder.join("mirror.db"),
        };

        let webex = resolve_webex(&toml);
        if webex.is_none() {
            tracing::warn!(
                "WebEx credentials not configured - /api/webex endpoints will answer 503"
            );
        }

        let chroma_url = env_or("CHROMA_URL", toml.chroma_url.clone())
            .unwrap_or_else(|| DEFAULT_CHROMA_URL.to_string());
        let chroma_collection = env_or("CHROMA_COLLECTION", toml.chroma_collection.clone())
            .unwrap_or_else(|| DEFAULT_CHROMA_COLLECTION.to_string());

        Self {
            bind_address,
            database_path,
            webex,
            chroma_url,
            chroma_collection,
        }
    }
}

/// WebEx credentials need all three parts; a partial set counts as absent
fn resolve_webex(toml: &TomlConfig) -> Option<WebexConfig> {
    let client_id = env_or("WEBEX_CLIENT_ID", toml.webex_client_id.clone())?;
    let client_secret = env_or("WEBEX_CLIENT_SECRET", toml.webex_client_secret.clone())?;
    let redirect_uri = env_or("WEBEX_REDIRECT_URI", toml.webex_redirect_uri.clone())?;

    Some(WebexConfig {
        client_id,
        client_secret,
        redirect_uri,
    })
}

fn env_or(var: &str, fallback: Option<String>) -> Option<String> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => fallback.filter(|v| !v.trim().is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_wins() {
        std::env::set_var("MIRROR_TEST_ENV_OR", "from-env");
        assert_eq!(
            env_or("MIRROR_TEST_ENV_OR", Some("from-toml".into())),
            Some("from-env".to_string())
        );
        std::env::remove_var("MIRROR_TEST_ENV_OR");
    }

    #[test]
    fn toml_used_when_env_unset() {
        assert_eq!(
            env_or("MIRROR_TEST_ENV_OR_UNSET", Some("from-toml".into())),
            Some("from-toml".to_string())
        );
        assert_eq!(env_or("MIRROR_TEST_ENV_OR_UNSET", None), None);
    }
}
