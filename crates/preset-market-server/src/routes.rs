//! HTTP route handlers grouped by resource

pub mod auth;
pub mod comments;
pub mod presets;
pub mod users;
