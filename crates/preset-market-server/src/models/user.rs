use preset_market_store::{User, UserId};
use serde::{Deserialize, Serialize};

/// The signed-in user's own profile
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            avatar_url: user.avatar_url,
            email: user.email,
        }
    }
}

/// Query string GitHub appends when redirecting back to us
#[derive(Debug, Default, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}
