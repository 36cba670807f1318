//! Source adapters for discovering ClawBeat-relevant content.
//!
//! This module contains submodules for scanning different content sources.
//! Each adapter exposes a single fallible scan returning raw records (or
//! section-specific models); one adapter's failure never aborts the run,
//! the caller logs it and proceeds with zero results from that source.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Whitelisted sites | [`rss`] | RSS/Atom feeds | Keyword pre-filter, per-site isolation |
//! | Google News | [`google_news`] | RSS search | Keyword query, generic "Web Search" provenance |
//! | arXiv | [`arxiv`] | Atom API | Enriched with Semantic Scholar tldrs |
//! | YouTube | [`youtube`] | Data API | Uploads playlist of whitelisted channels |
//!
//! # Common Patterns
//!
//! Adapters use:
//! - The shared [`feed`] parser for anything RSS/Atom shaped
//! - Concurrent fetching with `futures::stream` where there are many feeds
//! - Graceful error handling (failed sites are logged and skipped)
//! - Raw publish dates converted to day buckets, with normalization
//!   supplying the discovery-date fallback

pub mod arxiv;
pub mod feed;
pub mod google_news;
pub mod rss;
pub mod youtube;

use thiserror::Error;

/// Why a source adapter produced no results.
///
/// Distinguishing these from "the source genuinely had nothing" is what lets
/// the pipeline isolate a broken adapter without hiding it in the logs.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The HTTP request failed or returned a non-success status.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The whitelist file could not be read.
    #[error("whitelist {path} unreadable: {source}")]
    Whitelist {
        /// Whitelist path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The whitelist file is not the expected JSON shape.
    #[error("whitelist {path} invalid: {source}")]
    WhitelistFormat {
        /// Whitelist path.
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// A feed body could not be parsed as RSS/Atom.
    #[error("feed parse failed: {0}")]
    Feed(String),
    /// An API response was missing an expected field.
    #[error("unexpected API response: {0}")]
    Shape(String),
}
