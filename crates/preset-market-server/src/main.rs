//! Preset Market server binary

use std::sync::Arc;

use preset_market_server::{
    AppState,
    config::ServerConfig,
    create_router,
    error::{ApiError, Result},
    oauth::GitHubProvider,
};
use preset_market_store::Database;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "preset_market_server=debug,tower_http=debug".to_string()),
        )
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;
    info!(
        "Starting Preset Market Server on {}:{}",
        config.host, config.port
    );

    if config.uses_dev_secret() {
        warn!("JWT_SECRET_KEY is not set; tokens are signed with a development secret");
    }
    if config.github_client_id.is_none() {
        warn!("GITHUB_CLIENT_ID is not set; GitHub login is disabled");
    }

    let db = Database::connect(&config.database_url).await?;
    info!("Database ready at {}", config.database_url);

    tokio::fs::create_dir_all(config.previews_dir()).await?;
    info!("Uploads served from {}", config.upload_dir.display());

    match &config.plugin_data_dir {
        Some(dir) => info!("Plugin directory: {}", dir.display()),
        None => warn!("PLUGIN_DATA_DIR is not set; downloads are streamed as JSON"),
    }

    let oauth = Arc::new(GitHubProvider::from_config(&config)?);
    let addr = format!("{}:{}", config.host, config.port);

    // Create application state
    let state = AppState::new(db, config, oauth);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
