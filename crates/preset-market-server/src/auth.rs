//! Bearer tokens and the extractors that resolve them to users

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use preset_market_store::{User, UserId};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::AppState;
use crate::config::ServerConfig;
use crate::error::{ApiError, Result};

/// Token payload; `sub` holds the user id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Issue a signed HS256 token for `user_id`
pub fn create_token(config: &ServerConfig, user_id: UserId) -> Result<String> {
    let issued_at = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (issued_at + Duration::days(config.token_ttl_days)).unix_timestamp(),
        iat: issued_at.unix_timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))
}

/// Verify signature and expiry and return the claims
pub fn decode_token(config: &ServerConfig, token: &str) -> Result<Claims> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError::unauthorized("Invalid or expired token")
    })
}

async fn authenticate(state: &AppState, token: &str) -> Result<User> {
    let claims = decode_token(&state.config, token)?;
    let user_id: UserId = claims
        .sub
        .parse()
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    state
        .db
        .users()
        .find(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))
}

async fn bearer_token(parts: &mut Parts, state: &AppState) -> Option<String> {
    <TypedHeader<Authorization<Bearer>> as FromRequestParts<AppState>>::from_request_parts(
        parts, state,
    )
    .await
    .ok()
    .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string())
}

/// The caller, required to hold a valid bearer token
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(parts, state)
            .await
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;
        authenticate(state, &token).await.map(AuthUser)
    }
}

/// The caller if a valid bearer token was sent; anonymous otherwise
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<User>);

impl MaybeAuthUser {
    pub fn id(&self) -> Option<UserId> {
        self.0.as_ref().map(|user| user.id)
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(token) = bearer_token(parts, state).await else {
            return Ok(Self(None));
        };

        match authenticate(state, &token).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(ApiError::Unauthorized(_)) => Ok(Self(None)),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> ServerConfig {
        ServerConfig {
            jwt_secret: secret.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn token_round_trips_subject() {
        let config = config("test-secret");
        let token = create_token(&config, 17).unwrap();
        let claims = decode_token(&config, &token).unwrap();

        assert_eq!(claims.sub, "17");
        let ttl = claims.exp - claims.iat;
        assert_eq!(ttl, Duration::days(30).whole_seconds());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_token(&config("one"), 1).unwrap();
        assert!(matches!(
            decode_token(&config("two"), &token),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = config("test-secret");
        let claims = Claims {
            sub: "1".to_string(),
            exp: OffsetDateTime::now_utc().unix_timestamp() - 3600,
            iat: OffsetDateTime::now_utc().unix_timestamp() - 7200,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(decode_token(&config, &token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_token(&config("s"), "not.a.token").is_err());
    }
}
