//! mirror-api - MirrorMirror social-networking backend
//!
//! REST API over SQLite with JWT auth, a WebEx conferencing bridge, and a
//! ChromaDB semantic-search bridge.

use anyhow::Result;
use clap::Parser;
use mirror_common::auth::{load_jwt_secret, JwtKeys};
use mirror_common::config::resolve_data_folder;
use mirror_common::db::init::init_database;
use std::sync::Arc;
use tracing::{error, info};

use mirror_api::config::Config;
use mirror_api::services::{ChromaClient, WebexClient};
use mirror_api::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "mirror-api", about = "MirrorMirror backend API server")]
struct Args {
    /// Data folder holding the SQLite database
    #[arg(long)]
    data_folder: Option<String>,

    /// Bind address, e.g. 127.0.0.1:5840
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting MirrorMirror API (mirror-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let data_folder = resolve_data_folder(args.data_folder.as_deref(), "MIRROR_DATA_FOLDER")?;
    let mut config = Config::resolve(&data_folder);
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }

    info!("Database path: {}", config.database_path.display());

    let pool = match init_database(&config.database_path).await {
        Ok(pool) => {
            info!("✓ Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    // JWT secret: env override, else settings table (generated on first run)
    let jwt_secret = load_jwt_secret(&pool).await?;
    let jwt = JwtKeys::new(jwt_secret.as_bytes());
    info!("✓ Loaded JWT signing secret");

    let webex = Arc::new(WebexClient::new(config.webex.clone())?);
    if webex.is_configured() {
        info!("✓ WebEx integration configured");
    }

    let chroma = Arc::new(ChromaClient::new(
        &config.chroma_url,
        &config.chroma_collection,
    )?);
    info!(
        "ChromaDB endpoint: {} (collection '{}')",
        config.chroma_url, config.chroma_collection
    );

    let state = AppState::new(pool, jwt, webex, chroma);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("mirror-api listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
