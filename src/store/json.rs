//! Flat-file JSON implementation of the feed store.
//!
//! The feed lives in a single JSON file (the shape of [`IntelFeed`]). Writes
//! go to a sibling temp file first and are renamed over the target, so a
//! crash mid-write leaves the previous feed intact and readers never see a
//! half-written file.

use super::{FeedStore, StoreError};
use crate::models::IntelFeed;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// Feed store backed by one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFeedStore {
    path: PathBuf,
}

impl JsonFeedStore {
    /// Create a store for the given feed file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn path_str(&self) -> String {
        self.path.display().to_string()
    }
}

impl FeedStore for JsonFeedStore {
    /// Load the prior feed.
    ///
    /// Three outcomes, all logged distinctly so an operator can tell a first
    /// run from a broken store:
    /// - file absent: info, empty feed
    /// - file unreadable or unparseable: warn, empty feed
    /// - file fine: counts logged
    #[instrument(level = "info", skip_all, fields(path = %self.path_str()))]
    async fn load(&self) -> IntelFeed {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No existing feed file; starting with an empty feed");
                return IntelFeed::default();
            }
            Err(e) => {
                warn!(error = %e, "Feed file unreadable; treating as empty feed");
                return IntelFeed::default();
            }
        };

        match serde_json::from_str::<IntelFeed>(&raw) {
            Ok(feed) => {
                info!(
                    items = feed.items.len(),
                    videos = feed.videos.len(),
                    research = feed.research.len(),
                    "Loaded existing feed"
                );
                feed
            }
            Err(e) => {
                warn!(error = %e, "Feed file corrupt; treating as empty feed");
                IntelFeed::default()
            }
        }
    }

    /// Persist the feed: serialize, write a temp file next to the target,
    /// rename into place.
    #[instrument(level = "info", skip_all, fields(path = %self.path_str()))]
    async fn save(&self, feed: &IntelFeed) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(feed)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|source| StoreError::Write {
                path: self.path_str(),
                source,
            })?;
        }

        let tmp_path = tmp_sibling(&self.path);
        fs::write(&tmp_path, &json).await.map_err(|source| StoreError::Write {
            path: tmp_path.display().to_string(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).await.map_err(|source| StoreError::Write {
            path: self.path_str(),
            source,
        })?;

        info!(
            bytes = json.len(),
            items = feed.items.len(),
            "Wrote feed file"
        );
        Ok(())
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "feed.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}
