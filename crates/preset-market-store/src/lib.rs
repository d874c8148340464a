//! # Preset Market Store
//!
//! SQLite persistence for the preset market:
//! - users keyed by OAuth provider identity
//! - presets with unique slugs and download/like/comment counters
//! - comments and likes, each keeping its preset counter in step
//!
//! Records are plain data; all queries live in the repositories handed out
//! by [`Database`].
//!
//! ```rust,no_run
//! use preset_market_store::{Database, NewPreset};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:./data/preset_market.db").await?;
//! let preset = db
//!     .presets()
//!     .create(NewPreset {
//!         name: "Night Mode".to_string(),
//!         description: None,
//!         layout: serde_json::json!({"canvas_width": 800}),
//!         preview_image: None,
//!         author_id: 1,
//!         is_public: true,
//!     })
//!     .await?;
//! println!("created {}", preset.preset.slug);
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod entities;
pub mod error;
pub mod repository;

pub use database::Database;
pub use entities::*;
pub use error::{Result, StoreError};
