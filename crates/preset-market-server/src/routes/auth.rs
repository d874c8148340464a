//! GitHub login and session routes

use crate::{
    AppState,
    auth::{AuthUser, create_token},
    config::ServerConfig,
    error::{ApiError, Result},
    models::{MessageResponse, OAuthCallbackQuery, UserProfile},
};
use axum::{
    Json, Router,
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
};
use tracing::{info, warn};

/// Create auth routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/github", get(github_login))
        .route("/github/callback", get(github_callback))
        .route("/me", get(current_user))
        .route("/logout", post(logout))
}

/// Send the browser to GitHub's consent page
async fn github_login(State(state): State<AppState>) -> Result<Redirect> {
    let url = state.oauth.authorize_url()?;
    Ok(Redirect::temporary(&url))
}

/// Finish the OAuth dance and hand the token to the frontend.
///
/// Failures never surface as API errors here; the frontend receives them in
/// the `error` query parameter instead.
async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Redirect {
    match complete_login(&state, query).await {
        Ok(token) => Redirect::temporary(&frontend_callback(&state.config, "token", &token)),
        Err(e) => {
            warn!("GitHub login failed: {}", e);
            let reason = match e {
                ApiError::OAuth(reason) => reason,
                _ => "Login failed".to_string(),
            };
            Redirect::temporary(&frontend_callback(&state.config, "error", &reason))
        }
    }
}

async fn complete_login(state: &AppState, query: OAuthCallbackQuery) -> Result<String> {
    if let Some(error) = query.error {
        return Err(ApiError::OAuth(query.error_description.unwrap_or(error)));
    }
    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ApiError::OAuth("Missing authorization code".to_string()))?;

    let profile = state.oauth.exchange_code(&code).await?;
    let user = state.db.users().upsert_from_provider(&profile).await?;
    info!("User {} ({}) signed in", user.username, user.id);

    create_token(&state.config, user.id)
}

fn frontend_callback(config: &ServerConfig, key: &str, value: &str) -> String {
    format!(
        "{}/auth/callback?{}={}",
        config.frontend_url,
        key,
        urlencoding::encode(value)
    )
}

async fn current_user(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(UserProfile::from(user))
}

/// Tokens are stateless; the client just forgets it
async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse::new("Logged out"))
}
