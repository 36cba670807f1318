//! Data models for discovered articles and the persisted intel feed.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: A normalized news item, possibly promoted to a cluster anchor
//! - [`Coverage`]: A source/url pair recorded on an anchor for each merged member
//! - [`ResearchPaper`]: An arXiv paper in the research section of the feed
//! - [`VideoItem`]: A YouTube upload in the videos section of the feed
//! - [`IntelFeed`]: The whole persisted feed blob, written once per run
//!
//! Some models use camelCase field names to match the JSON schema consumed by
//! the ClawBeat front end, hence the `#[allow(non_snake_case)]` attributes.

use serde::{Deserialize, Serialize};

/// Classification of an article's source, derived from its URL and source name.
///
/// - `Priority`: outlets worth an LLM intel brief (substack, techcrunch, ...)
/// - `Standard`: everything else
/// - `Delist`: press-release wires; dropped at normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Priority,
    #[default]
    Standard,
    Delist,
}

/// A source/url pair listed on a cluster anchor for every member merged into it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Coverage {
    /// Human-readable source name of the merged article.
    pub source: String,
    /// The merged article's URL.
    pub url: String,
}

/// A normalized news article discovered from one of the source adapters.
///
/// The `url` is the article's identity: the persisted feed never holds two
/// entries with the same URL, and deduplication across runs and across sources
/// keys on it.
///
/// # Lifecycle
///
/// An `Article` is created by the normalizer with `vec = None`. The clustering
/// engine assigns `vec` at most once, may promote the article to a cluster
/// anchor (filling `moreCoverage`), and after the merge into the persisted
/// feed the entry is never mutated again. It leaves the feed only by falling
/// off the bounded window on a later run.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Article {
    /// The article title/headline.
    pub title: String,
    /// The article URL; globally unique within the persisted feed.
    pub url: String,
    /// Human-readable provenance (site name, or "Web Search").
    pub source: String,
    /// Day-granularity date bucket in `MM/DD/YYYY` format. This is the
    /// discovery date when the feed entry carried no parseable publish date,
    /// not necessarily the true publication timestamp.
    pub date: String,
    /// Short summary used (with the title) to build the embedding input.
    pub summary: String,
    /// Keyword-match strength; 0 for articles found by generic search.
    #[serde(default)]
    pub density: u32,
    /// Source classification; persisted so old entries keep their tier.
    #[serde(default)]
    pub source_type: SourceType,
    /// Embedding vector, present once computed. Assigned at most once per
    /// run and never recomputed for the same article instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vec: Option<Vec<f32>>,
    /// Other coverage of the same topic; populated only on cluster anchors,
    /// in cluster-membership order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub moreCoverage: Vec<Coverage>,
}

impl Article {
    /// Build the text sent to the embedding service for this article.
    ///
    /// The title anchors the vector; the summary contributes at most its
    /// first 200 characters so that verbose feeds don't drown the headline.
    pub fn embedding_text(&self) -> String {
        let head: String = self.summary.chars().take(200).collect();
        format!("{}: {}", self.title, head)
    }

    /// Coverage entry for this article when it is merged into an anchor.
    pub fn as_coverage(&self) -> Coverage {
        Coverage {
            source: self.source.clone(),
            url: self.url.clone(),
        }
    }
}

/// An arXiv paper tracked in the research section of the feed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResearchPaper {
    /// Paper title, newline-collapsed.
    pub title: String,
    /// Author names in listing order.
    pub authors: Vec<String>,
    /// Submission date as reported by arXiv.
    pub date: String,
    /// Abstract page URL; identity key within the research section.
    pub url: String,
    /// Semantic Scholar tldr, leading abstract sentences, or a placeholder.
    pub summary: String,
}

/// A YouTube upload from one of the whitelisted channels.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoItem {
    /// Video title.
    pub title: String,
    /// Watch URL.
    pub url: String,
    /// High-resolution thumbnail URL.
    pub thumbnail: String,
    /// Channel title.
    pub channel: String,
    /// Description, truncated for feed display.
    pub description: String,
    /// Upload timestamp as reported by the API.
    pub publishedAt: String,
}

/// The whole persisted feed, read once at the start of a run and written
/// once, atomically, at the end.
///
/// All sections default to empty so that feed files written by older
/// versions (or a missing file) deserialize cleanly.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IntelFeed {
    /// Clustered news anchors, newest date bucket first, bounded.
    #[serde(default)]
    pub items: Vec<Article>,
    /// Latest uploads from whitelisted YouTube channels.
    #[serde(default)]
    pub videos: Vec<VideoItem>,
    /// Research papers, additive across runs, deduped by URL.
    #[serde(default)]
    pub research: Vec<ResearchPaper>,
    /// `YYYY-MM-DD HH:MM UTC` stamp of the last successful run.
    #[serde(default)]
    pub last_updated: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(url: &str) -> Article {
        Article {
            title: "OpenClaw raises $50M".to_string(),
            url: url.to_string(),
            source: "TechCrunch".to_string(),
            date: "01/10/2026".to_string(),
            summary: "Funding round led by...".to_string(),
            density: 2,
            source_type: SourceType::Priority,
            vec: None,
            moreCoverage: vec![],
        }
    }

    #[test]
    fn test_embedding_text_combines_title_and_summary() {
        let a = article("https://a.com/x");
        assert_eq!(a.embedding_text(), "OpenClaw raises $50M: Funding round led by...");
    }

    #[test]
    fn test_embedding_text_truncates_summary() {
        let mut a = article("https://a.com/x");
        a.summary = "z".repeat(500);
        let text = a.embedding_text();
        assert_eq!(text.len(), "OpenClaw raises $50M: ".len() + 200);
    }

    #[test]
    fn test_article_omits_empty_vec_and_coverage() {
        let a = article("https://a.com/x");
        let json = serde_json::to_string(&a).unwrap();
        assert!(!json.contains("\"vec\""));
        assert!(!json.contains("moreCoverage"));
    }

    #[test]
    fn test_article_roundtrip_with_vector() {
        let mut a = article("https://a.com/x");
        a.vec = Some(vec![0.1, 0.2, 0.3]);
        a.moreCoverage = vec![Coverage {
            source: "Wired".to_string(),
            url: "https://wired.com/y".to_string(),
        }];
        let json = serde_json::to_string(&a).unwrap();
        let back: Article = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn test_article_defaults_for_old_feed_entries() {
        // Entries written before density/source_type existed still load.
        let json = r#"{
            "title": "Old entry",
            "url": "https://old.example/1",
            "source": "Example",
            "date": "12/01/2025",
            "summary": "..."
        }"#;
        let a: Article = serde_json::from_str(json).unwrap();
        assert_eq!(a.density, 0);
        assert_eq!(a.source_type, SourceType::Standard);
        assert!(a.vec.is_none());
        assert!(a.moreCoverage.is_empty());
    }

    #[test]
    fn test_source_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SourceType::Priority).unwrap(),
            "\"priority\""
        );
        assert_eq!(
            serde_json::to_string(&SourceType::Delist).unwrap(),
            "\"delist\""
        );
    }

    #[test]
    fn test_intel_feed_sections_default_empty() {
        let feed: IntelFeed = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(feed.items.is_empty());
        assert!(feed.videos.is_empty());
        assert!(feed.research.is_empty());
        assert_eq!(feed.last_updated, "");
    }
}
