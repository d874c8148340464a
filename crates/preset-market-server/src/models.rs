//! API models for requests and responses

pub mod api;
pub mod comment;
pub mod preset;
pub mod user;

// Re-export commonly used types
pub use api::*;
pub use comment::*;
pub use preset::*;
pub use user::*;
