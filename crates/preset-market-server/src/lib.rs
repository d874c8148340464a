//! Preset Market HTTP API Server
//!
//! REST endpoints for GitHub sign-in, preset sharing, likes, comments and
//! downloads. The router is exposed as a library so it can be driven
//! in-process by tests.

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    response::Json,
    routing::get,
};
use preset_market::PreviewRenderer;
use preset_market_store::Database;
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod oauth;
pub mod routes;

use config::ServerConfig;
use oauth::OAuthProvider;

/// Public prefix the upload directory is served under
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Main application state
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ServerConfig>,
    pub oauth: Arc<dyn OAuthProvider>,
    pub previews: PreviewRenderer,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig, oauth: Arc<dyn OAuthProvider>) -> Self {
        let mut previews =
            PreviewRenderer::new(config.previews_dir(), format!("{}/previews", UPLOADS_ROUTE));
        if let Some(font) = &config.preview_font_path {
            previews = previews.with_default_font(font.clone());
        }

        Self {
            db,
            config: Arc::new(config),
            oauth,
            previews,
        }
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .route("/", get(root))
        // Health check
        .route("/health", get(health_check))
        // API routes
        .nest("/api", api_routes())
        // Preview images
        .nest_service(UPLOADS_ROUTE, uploads)
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(2 * 1024 * 1024)),
        )
        .with_state(state)
}

/// API routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", routes::auth::router())
        .nest("/presets", routes::presets::router())
        .nest("/comments", routes::comments::router())
        .nest("/users", routes::users::router())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "preset-market-server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok"
    }))
}

/// Health check endpoint
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
