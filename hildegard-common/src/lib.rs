//! # Hildegard Common Library
//!
//! Shared code for the Hildegard song suggester:
//! - Song catalog and suggestion domain types
//! - Timed cache entries for process-wide resources
//! - Configuration loading
//! - Timestamp and date formatting

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod time;

pub use cache::{CacheEntry, TimedCache};
pub use catalog::{Catalog, Song};
pub use error::{Error, Result};
pub use model::{Adequacy, NewSong, SongReference, Suggestion};
