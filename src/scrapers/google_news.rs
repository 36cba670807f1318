//! Google News RSS search adapter.
//!
//! One keyword search per run against the Google News RSS endpoint. Entries
//! arrive pre-filtered by the query, so no keyword check is applied here;
//! provenance is the generic "Web Search" label and the summary is a fixed
//! placeholder (Google News descriptions are markup-heavy teasers the feed
//! has no use for).

use super::{ScanError, feed};
use crate::normalize::RawRecord;
use tracing::{info, instrument};

/// Search query covering the beat's names.
const QUERY: &str = "OpenClaw OR Moltbot OR Clawdbot";

/// Entries taken per scan.
const MAX_ENTRIES: usize = 50;

/// Provenance label for search-discovered articles.
pub const SOURCE_LABEL: &str = "Web Search";

/// Scan Google News for recent coverage of the beat.
#[instrument(level = "info", skip_all)]
pub async fn scan(http: &reqwest::Client) -> Result<Vec<RawRecord>, ScanError> {
    let url = format!(
        "https://news.google.com/rss/search?q={}&hl=en-US&gl=US&ceid=US:en",
        urlencoding::encode(QUERY)
    );
    let body = http
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let entries = feed::parse_feed(&body).map_err(|e| ScanError::Feed(e.to_string()))?;

    let records: Vec<RawRecord> = entries
        .into_iter()
        .take(MAX_ENTRIES)
        .map(|entry| RawRecord {
            title: entry.title,
            url: entry.link,
            summary: "Ecosystem update.".to_string(),
            source: SOURCE_LABEL.to_string(),
            published: entry.published.as_deref().and_then(feed::entry_bucket),
        })
        .collect();

    info!(count = records.len(), "Google News scan complete");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_url_encoded() {
        let encoded = urlencoding::encode(QUERY);
        assert_eq!(encoded, "OpenClaw%20OR%20Moltbot%20OR%20Clawdbot");
    }
}
