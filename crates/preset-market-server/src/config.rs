//! Server configuration management

use std::path::PathBuf;

use crate::error::{ApiError, Result};
use serde::{Deserialize, Serialize};

/// Secret used when `JWT_SECRET_KEY` is unset; only fit for local development
pub const DEV_JWT_SECRET: &str = "change-me";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// SQLite connection string
    pub database_url: String,

    /// HS256 signing secret for bearer tokens
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// Bearer token lifetime in days
    pub token_ttl_days: i64,

    pub github_client_id: Option<String>,

    #[serde(skip_serializing)]
    pub github_client_secret: Option<String>,

    pub github_redirect_uri: String,

    /// Where the OAuth callback sends the browser afterwards
    pub frontend_url: String,

    /// Root of the files served under `/uploads`
    pub upload_dir: PathBuf,

    /// Shared plugin directory downloads are written into, if any
    pub plugin_data_dir: Option<PathBuf>,

    /// Font used for previews whose layout names none
    pub preview_font_path: Option<PathBuf>,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid PORT value".to_string()))?,
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            jwt_secret: std::env::var("JWT_SECRET_KEY").unwrap_or(defaults.jwt_secret),
            token_ttl_days: std::env::var("TOKEN_TTL_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .ok()
                .filter(|days: &i64| *days > 0)
                .ok_or_else(|| ApiError::Config("Invalid TOKEN_TTL_DAYS value".to_string()))?,
            github_client_id: non_empty_var("GITHUB_CLIENT_ID"),
            github_client_secret: non_empty_var("GITHUB_CLIENT_SECRET"),
            github_redirect_uri: std::env::var("GITHUB_REDIRECT_URI")
                .unwrap_or(defaults.github_redirect_uri),
            frontend_url: std::env::var("FRONTEND_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.frontend_url),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            plugin_data_dir: non_empty_var("PLUGIN_DATA_DIR").map(PathBuf::from),
            preview_font_path: non_empty_var("PREVIEW_FONT_PATH").map(PathBuf::from),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
        })
    }

    /// Directory preview images are written into
    pub fn previews_dir(&self) -> PathBuf {
        self.upload_dir.join("previews")
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database_url: "sqlite:./data/preset_market.db".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_days: 30,
            github_client_id: None,
            github_client_secret: None,
            github_redirect_uri: "http://localhost:8000/api/auth/github/callback".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            upload_dir: PathBuf::from("./uploads"),
            plugin_data_dir: None,
            preview_font_path: None,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}
