//! OAuth identity providers
//!
//! Only GitHub is supported. The provider sits behind a trait so the HTTP
//! layer can be exercised without reaching the network.

use async_trait::async_trait;
use preset_market_store::ProviderProfile;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::error::{ApiError, Result};

const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USER_URL: &str = "https://api.github.com/user";
const GITHUB_SCOPE: &str = "read:user user:email";

/// Turns an authorization code into a provider identity
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// URL the browser is sent to for consent
    fn authorize_url(&self) -> Result<String>;

    /// Exchange an authorization code for the user's profile
    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile>;
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: i64,
    login: String,
    avatar_url: Option<String>,
    email: Option<String>,
}

/// GitHub OAuth app client
#[derive(Debug, Clone)]
pub struct GitHubProvider {
    http_client: reqwest::Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: String,
}

impl GitHubProvider {
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("preset-market-server/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            client_id: config.github_client_id.clone(),
            client_secret: config.github_client_secret.clone(),
            redirect_uri: config.github_redirect_uri.clone(),
        })
    }

    fn client_id(&self) -> Result<&str> {
        self.client_id
            .as_deref()
            .ok_or_else(|| ApiError::Config("GitHub OAuth is not configured".to_string()))
    }
}

#[async_trait]
impl OAuthProvider for GitHubProvider {
    fn authorize_url(&self) -> Result<String> {
        Ok(format!(
            "{}?client_id={}&redirect_uri={}&scope={}",
            GITHUB_AUTHORIZE_URL,
            urlencoding::encode(self.client_id()?),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(GITHUB_SCOPE),
        ))
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile> {
        let client_id = self.client_id()?;
        let client_secret = self.client_secret.as_deref().unwrap_or_default();

        let token: AccessTokenResponse = self
            .http_client
            .post(GITHUB_TOKEN_URL)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ApiError::OAuth(format!("Token exchange failed: {}", e)))?
            .json()
            .await
            .map_err(|e| ApiError::OAuth(format!("Unreadable token response: {}", e)))?;

        let access_token = match token.access_token {
            Some(access_token) => access_token,
            None => {
                let reason = token
                    .error_description
                    .or(token.error)
                    .unwrap_or_else(|| "no access token returned".to_string());
                warn!("GitHub refused the authorization code: {}", reason);
                return Err(ApiError::OAuth(format!("GitHub OAuth failed: {}", reason)));
            }
        };

        let user: GitHubUser = self
            .http_client
            .get(GITHUB_USER_URL)
            .header(reqwest::header::AUTHORIZATION, format!("token {}", access_token))
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| ApiError::OAuth(format!("Profile request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| ApiError::OAuth(format!("Profile request rejected: {}", e)))?
            .json()
            .await
            .map_err(|e| ApiError::OAuth(format!("Unreadable profile: {}", e)))?;

        debug!("GitHub identity resolved: {} ({})", user.login, user.id);

        Ok(ProviderProfile {
            github_id: user.id,
            username: user.login,
            avatar_url: user.avatar_url,
            email: user.email,
        })
    }
}
