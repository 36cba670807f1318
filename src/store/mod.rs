//! Feed persistence behind a repository interface.
//!
//! The pipeline never touches file I/O directly: it reads the prior feed
//! through [`FeedStore::load`] once at the start of a run and writes the new
//! feed through [`FeedStore::save`] once at the very end. Any storage backend
//! (flat file, key-value table, relational table) can sit behind the trait;
//! the shipped backend is [`JsonFeedStore`].
//!
//! # Failure Semantics
//!
//! - `load` cannot fail the run: a missing or unreadable store means "no
//!   prior history", with the two cases distinguishable in the logs.
//! - `save` is the run's only side-effecting step, so its failure is the
//!   run's only fatal error; the caller surfaces it as a non-zero exit so
//!   the whole run can be retried.

pub mod json;

pub use json::JsonFeedStore;

use crate::models::IntelFeed;
use thiserror::Error;

/// Why a feed save failed. The previous persisted feed is untouched when
/// this is returned.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The feed could not be serialized.
    #[error("failed to serialize feed: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The serialized feed could not be written or moved into place.
    #[error("failed to write feed to {path}: {source}")]
    Write {
        /// Destination path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Repository interface over the persisted feed.
pub trait FeedStore {
    /// Load the prior feed. Absence or corruption yields an empty feed,
    /// never an error; the distinction is logged.
    async fn load(&self) -> IntelFeed;

    /// Persist the feed wholesale (overwrite semantics, not append).
    async fn save(&self, feed: &IntelFeed) -> Result<(), StoreError>;
}
