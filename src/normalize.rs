//! Ingestion normalizer: raw adapter records into uniform [`Article`]s.
//!
//! Every source adapter produces [`RawRecord`]s in whatever shape its feed
//! offers; this module is the single funnel that turns them into the
//! [`Article`] the clustering engine works on. The transform is pure: no
//! I/O, no clock access beyond the `run_date` the caller passes in.
//!
//! Records that cannot become articles are rejected with a typed
//! [`NormalizeError`] so the caller can tell "dropped as malformed" apart
//! from "dropped as delisted" in logs. Neither is fatal.

use crate::models::{Article, SourceType};
use crate::utils::{format_bucket, keyword_density, parse_bucket, source_type};
use chrono::NaiveDate;
use thiserror::Error;

/// A raw record from any source adapter, before normalization.
///
/// Adapters fill in what their feed exposes and leave the rest empty; the
/// normalizer decides whether that is enough to make an [`Article`].
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    /// Entry title, possibly empty if the feed omitted it.
    pub title: String,
    /// Resolved entry URL, possibly empty if the feed omitted it.
    pub url: String,
    /// Short summary, already HTML-stripped by the adapter.
    pub summary: String,
    /// Human-readable source name.
    pub source: String,
    /// Publish date as a `MM/DD/YYYY` bucket, when the feed carried one the
    /// adapter could parse.
    pub published: Option<String>,
}

/// Why a raw record was rejected at normalization.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The record lacks a URL or title; there is nothing to key or embed.
    #[error("record from {source_name:?} is missing a URL or title")]
    Malformed {
        /// Source name, for the warn log.
        source_name: String,
    },
    /// The record comes from a delisted press-release wire.
    #[error("source {source_name:?} is delisted ({url})")]
    Delisted {
        /// Source name.
        source_name: String,
        /// The rejected URL.
        url: String,
    },
}

/// Convert a raw record into an [`Article`].
///
/// The article's `date` is the record's publish bucket when it parses,
/// otherwise the run date: a coarse discovery stamp, which is all the
/// temporal bucketing downstream needs.
pub fn normalize(raw: RawRecord, run_date: NaiveDate) -> Result<Article, NormalizeError> {
    let title = raw.title.trim().to_string();
    let url = raw.url.trim().to_string();

    if url.is_empty() || title.is_empty() {
        return Err(NormalizeError::Malformed { source_name: raw.source });
    }

    let tier = source_type(&url, &raw.source);
    if tier == SourceType::Delist {
        return Err(NormalizeError::Delisted {
            source_name: raw.source,
            url,
        });
    }

    let date = raw
        .published
        .as_deref()
        .and_then(parse_bucket)
        .map(format_bucket)
        .unwrap_or_else(|| format_bucket(run_date));

    let density = keyword_density(&title, &raw.summary);

    Ok(Article {
        title,
        url,
        source: raw.source,
        date,
        summary: raw.summary,
        density,
        source_type: tier,
        vec: None,
        moreCoverage: Vec::new(),
    })
}
