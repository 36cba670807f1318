//! Whitelisted-site RSS adapter.
//!
//! Reads the whitelist file (a JSON array of sites with their feed URLs and
//! optional YouTube channel IDs), fetches every site's feed concurrently,
//! and keeps the entries that mention a tracked keyword. Failed sites are
//! logged and skipped without failing the batch; only a missing or invalid
//! whitelist file is reported as an adapter-level error.

use super::{ScanError, feed};
use crate::normalize::RawRecord;
use crate::utils::mentions_keyword;
use futures::stream::{self, StreamExt};
use scraper::Html;
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Feed entries considered per site.
const ENTRIES_PER_SITE: usize = 15;

/// Summary length kept after HTML stripping.
const SUMMARY_CHARS: usize = 200;

/// One whitelist row. Field names match the whitelist JSON, which is shared
/// with the spreadsheet the beat is curated in.
#[derive(Debug, Clone, Deserialize)]
pub struct WhitelistSite {
    /// Human-readable site name; becomes the article's `source`.
    #[serde(rename = "Source Name")]
    pub source_name: String,
    /// Feed URL, or "N/A" for sites tracked only for their channel.
    #[serde(rename = "Website RSS", default)]
    pub rss_url: Option<String>,
    /// YouTube channel to pull uploads from, when the site has one.
    #[serde(rename = "YouTube Channel ID", default)]
    pub youtube_channel_id: Option<String>,
}

/// Load the whitelist file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn load_whitelist(path: &str) -> Result<Vec<WhitelistSite>, ScanError> {
    let raw = fs::read_to_string(path)
        .await
        .map_err(|source| ScanError::Whitelist {
            path: path.to_string(),
            source,
        })?;
    let sites: Vec<WhitelistSite> =
        serde_json::from_str(&raw).map_err(|source| ScanError::WhitelistFormat {
            path: path.to_string(),
            source,
        })?;
    info!(count = sites.len(), "Loaded whitelist");
    Ok(sites)
}

/// Scan every whitelisted feed for keyword-matching entries.
///
/// Sites without a feed URL are skipped; sites whose fetch or parse fails
/// contribute zero records and a warning. Feeds are fetched concurrently,
/// four at a time.
#[instrument(level = "info", skip_all, fields(sites = whitelist.len()))]
pub async fn scan(http: &reqwest::Client, whitelist: &[WhitelistSite]) -> Vec<RawRecord> {
    let records: Vec<RawRecord> = stream::iter(whitelist)
        .map(|site| async move {
            let Some(rss_url) = site.rss_url.as_deref().filter(|u| *u != "N/A" && !u.is_empty())
            else {
                return Vec::new();
            };
            match scan_site(http, site, rss_url).await {
                Ok(records) => {
                    debug!(site = %site.source_name, count = records.len(), "Scanned site feed");
                    records
                }
                Err(e) => {
                    warn!(site = %site.source_name, url = rss_url, error = %e, "Site feed scan failed");
                    Vec::new()
                }
            }
        })
        .buffered(4)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .flatten()
        .collect();

    info!(count = records.len(), "Whitelist scan complete");
    records
}

async fn scan_site(
    http: &reqwest::Client,
    site: &WhitelistSite,
    rss_url: &str,
) -> Result<Vec<RawRecord>, ScanError> {
    let body = http
        .get(rss_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let entries = feed::parse_feed(&body).map_err(|e| ScanError::Feed(e.to_string()))?;

    let records = entries
        .into_iter()
        .take(ENTRIES_PER_SITE)
        .filter_map(|entry| {
            let summary = strip_html(&entry.summary);
            if !mentions_keyword(&format!("{} {}", entry.title, summary)) {
                return None;
            }
            Some(RawRecord {
                title: entry.title,
                url: entry.link,
                summary: clip_summary(&summary),
                source: site.source_name.clone(),
                published: entry.published.as_deref().and_then(feed::entry_bucket),
            })
        })
        .collect();
    Ok(records)
}

/// Flatten feed-summary HTML to plain text.
fn strip_html(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    fragment
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate a stripped summary for the feed, marking the cut.
fn clip_summary(summary: &str) -> String {
    if summary.chars().count() <= SUMMARY_CHARS {
        summary.to_string()
    } else {
        let head: String = summary.chars().take(SUMMARY_CHARS).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitelist_row_parses_spreadsheet_keys() {
        let json = r#"[
            {"Source Name": "Claw Weekly", "Website RSS": "https://clawweekly.example/feed.xml"},
            {"Source Name": "Molt Labs", "Website RSS": "N/A", "YouTube Channel ID": "UC123"}
        ]"#;
        let sites: Vec<WhitelistSite> = serde_json::from_str(json).unwrap();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].source_name, "Claw Weekly");
        assert_eq!(sites[1].rss_url.as_deref(), Some("N/A"));
        assert_eq!(sites[1].youtube_channel_id.as_deref(), Some("UC123"));
    }

    #[test]
    fn test_strip_html_flattens_markup() {
        assert_eq!(
            strip_html("<p>OpenClaw <b>ships</b> a&nbsp;thing</p>"),
            "OpenClaw ships a thing"
        );
    }

    #[test]
    fn test_strip_html_plain_text_passthrough() {
        assert_eq!(strip_html("no markup here"), "no markup here");
    }

    #[test]
    fn test_clip_summary_short() {
        assert_eq!(clip_summary("short"), "short");
    }

    #[test]
    fn test_clip_summary_long() {
        let long = "x".repeat(300);
        let clipped = clip_summary(&long);
        assert_eq!(clipped.chars().count(), SUMMARY_CHARS + 3);
        assert!(clipped.ends_with("..."));
    }
}
