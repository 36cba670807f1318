//! Utility functions for keyword matching, source classification, and date buckets.
//!
//! This module provides helper functions used throughout the application:
//! - Tracked-keyword matching and density scoring for discovered articles
//! - Source tier classification (priority / standard / delist)
//! - Day-bucket parsing and formatting for temporal grouping
//! - String truncation for logging

use crate::models::SourceType;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Keywords that define the beat. An article qualifies for the feed when its
/// title or summary mentions at least one of them.
pub const KEYWORDS: &[&str] = &[
    "openclaw foundation",
    "openclaw",
    "moltbot",
    "clawdbot",
    "moltbook",
    "claudbot",
    "steinberger",
];

/// Outlets whose articles get an LLM intel brief.
const PRIORITY_SITES: &[&str] = &[
    "substack.com",
    "beehiiv.com",
    "techcrunch.com",
    "wired.com",
    "theverge.com",
    "venturebeat.com",
];

/// Press-release mills, matched against the URL host.
const DELIST_SITES: &[&str] = &["prnewswire.com", "businesswire.com", "globenewswire.com"];

/// Press-release mills, matched against the source name.
const BANNED_SOURCES: &[&str] = &[
    "access newswire",
    "globenewswire",
    "prnewswire",
    "business wire",
];

/// Day-bucket format used everywhere an `Article::date` is parsed or built.
pub const BUCKET_FORMAT: &str = "%m/%d/%Y";

/// Case-insensitive matcher for any tracked keyword. Longest keywords come
/// first in [`KEYWORDS`] so "openclaw foundation" wins over plain "openclaw".
static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    let alternation = KEYWORDS
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i){}", alternation)).unwrap()
});

/// Whether the text mentions any tracked keyword.
pub fn mentions_keyword(text: &str) -> bool {
    KEYWORD_RE.is_match(text)
}

/// Keyword-match strength of an article: total tracked-keyword occurrences
/// across title and summary. Used only to pick the anchor among clustered
/// near-duplicates, never to exclude anything.
pub fn keyword_density(title: &str, summary: &str) -> u32 {
    let count = |s: &str| KEYWORD_RE.find_iter(s).count() as u32;
    count(title) + count(summary)
}

/// Classify a source into priority / standard / delist.
///
/// Host matching uses the parsed URL host when the URL parses, falling back
/// to a substring check over the whole URL for the malformed remainder.
pub fn source_type(url: &str, source_name: &str) -> SourceType {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| url.to_lowercase());
    let source_lower = source_name.to_lowercase();

    if DELIST_SITES.iter().any(|site| host.contains(site))
        || BANNED_SOURCES.iter().any(|name| source_lower.contains(name))
    {
        return SourceType::Delist;
    }
    if PRIORITY_SITES.iter().any(|site| host.contains(site)) {
        return SourceType::Priority;
    }
    SourceType::Standard
}

/// Parse a day bucket (`MM/DD/YYYY`). `None` for anything unparseable;
/// callers decide how unparseable buckets order.
pub fn parse_bucket(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, BUCKET_FORMAT).ok()
}

/// Format a date as a day bucket (`MM/DD/YYYY`).
pub fn format_bucket(date: NaiveDate) -> String {
    date.format(BUCKET_FORMAT).to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes with an ellipsis and byte count
/// indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_keyword_case_insensitive() {
        assert!(mentions_keyword("OpenClaw ships a new runtime"));
        assert!(mentions_keyword("the MOLTBOT incident"));
        assert!(!mentions_keyword("generic ai news roundup"));
    }

    #[test]
    fn test_keyword_density_counts_occurrences() {
        assert_eq!(
            keyword_density("OpenClaw raises $50M", "OpenClaw's round values openclaw at..."),
            3
        );
        assert_eq!(keyword_density("No match here", "nothing"), 0);
    }

    #[test]
    fn test_keyword_density_prefers_longest_match() {
        // "openclaw foundation" counts once, not once for the phrase and
        // once for the bare word.
        assert_eq!(keyword_density("OpenClaw Foundation launches", ""), 1);
    }

    #[test]
    fn test_source_type_priority() {
        assert_eq!(
            source_type("https://techcrunch.com/2026/01/10/openclaw", "TechCrunch"),
            SourceType::Priority
        );
        assert_eq!(
            source_type("https://foo.substack.com/p/openclaw", "Foo Letter"),
            SourceType::Priority
        );
    }

    #[test]
    fn test_source_type_delist_by_host() {
        assert_eq!(
            source_type("https://www.prnewswire.com/release/1", "Some Wire"),
            SourceType::Delist
        );
    }

    #[test]
    fn test_source_type_delist_by_source_name() {
        assert_eq!(
            source_type("https://example.com/story", "GlobeNewswire"),
            SourceType::Delist
        );
    }

    #[test]
    fn test_source_type_standard() {
        assert_eq!(
            source_type("https://example.com/story", "Example Times"),
            SourceType::Standard
        );
    }

    #[test]
    fn test_source_type_unparseable_url_falls_back() {
        assert_eq!(
            source_type("not a url businesswire.com", ""),
            SourceType::Delist
        );
    }

    #[test]
    fn test_bucket_roundtrip() {
        let d = parse_bucket("01/10/2026").unwrap();
        assert_eq!(format_bucket(d), "01/10/2026");
    }

    #[test]
    fn test_parse_bucket_rejects_garbage() {
        assert!(parse_bucket("2026-01-10").is_none());
        assert!(parse_bucket("").is_none());
        assert!(parse_bucket("13/45/2026").is_none());
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }
}
