//! arXiv research adapter.
//!
//! Queries the arXiv Atom API for the newest papers mentioning the beat,
//! then enriches each one from the Semantic Scholar graph API: the tldr when
//! one exists, the first two abstract sentences otherwise, a fixed
//! placeholder when the lookup fails entirely. A failed enrichment never
//! drops the paper.

use super::{ScanError, feed};
use crate::models::ResearchPaper;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Search query covering the beat's names.
const QUERY: &str = "(OpenClaw OR MoltBot OR Clawdbot)";

/// Papers taken per scan.
const MAX_RESULTS: usize = 10;

/// Summary used when Semantic Scholar has nothing for a paper.
const PLACEHOLDER_SUMMARY: &str = "Research analysis in progress.";

#[derive(Debug, Deserialize)]
struct ScholarPaper {
    #[serde(default)]
    tldr: Option<ScholarTldr>,
    #[serde(default, rename = "abstract")]
    abstract_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScholarTldr {
    #[serde(default)]
    text: String,
}

/// Scan arXiv for new papers about the beat.
#[instrument(level = "info", skip_all)]
pub async fn scan(http: &reqwest::Client) -> Result<Vec<ResearchPaper>, ScanError> {
    let url = format!(
        "http://export.arxiv.org/api/query?search_query={}&sortBy=submittedDate&sortOrder=descending&max_results={}",
        urlencoding::encode(QUERY),
        MAX_RESULTS
    );
    let body = http
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let entries = feed::parse_feed(&body).map_err(|e| ScanError::Feed(e.to_string()))?;

    let papers: Vec<ResearchPaper> = stream::iter(entries)
        .then(|entry| async move {
            let summary = match arxiv_id(&entry.link) {
                Some(id) => scholar_summary(http, id).await,
                None => PLACEHOLDER_SUMMARY.to_string(),
            };
            ResearchPaper {
                title: entry.title.split_whitespace().collect::<Vec<_>>().join(" "),
                authors: entry.authors,
                date: entry.published.unwrap_or_default(),
                url: entry.link,
                summary,
            }
        })
        .collect()
        .await;

    info!(count = papers.len(), "arXiv scan complete");
    Ok(papers)
}

/// Fetch a one-paragraph summary for an arXiv paper from Semantic Scholar.
async fn scholar_summary(http: &reqwest::Client, id: &str) -> String {
    let url = format!(
        "https://api.semanticscholar.org/graph/v1/paper/ARXIV:{}?fields=tldr,abstract",
        id
    );
    let paper: ScholarPaper = match fetch_json(http, &url).await {
        Ok(paper) => paper,
        Err(e) => {
            warn!(arxiv_id = id, error = %e, "Semantic Scholar lookup failed");
            return PLACEHOLDER_SUMMARY.to_string();
        }
    };

    if let Some(tldr) = paper.tldr.filter(|t| !t.text.is_empty()) {
        return tldr.text;
    }
    if let Some(abstract_text) = paper.abstract_text.filter(|a| !a.is_empty()) {
        debug!(arxiv_id = id, "No tldr; using leading abstract sentences");
        return leading_sentences(&abstract_text, 2);
    }
    PLACEHOLDER_SUMMARY.to_string()
}

async fn fetch_json(http: &reqwest::Client, url: &str) -> Result<ScholarPaper, reqwest::Error> {
    http.get(url)
        .send()
        .await?
        .error_for_status()?
        .json::<ScholarPaper>()
        .await
}

/// First `count` sentences of a newline-flattened abstract.
fn leading_sentences(text: &str, count: usize) -> String {
    let flat = text.replace('\n', " ");
    let joined = flat
        .split(". ")
        .take(count)
        .collect::<Vec<_>>()
        .join(". ");
    let trimmed = joined.trim_end_matches('.').to_string();
    format!("{}.", trimmed)
}

/// The arXiv identifier at the tail of an `/abs/` URL.
fn arxiv_id(link: &str) -> Option<&str> {
    link.split("/abs/").nth(1).filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arxiv_id_from_abs_url() {
        assert_eq!(
            arxiv_id("http://arxiv.org/abs/2601.00001v1"),
            Some("2601.00001v1")
        );
    }

    #[test]
    fn test_arxiv_id_missing() {
        assert_eq!(arxiv_id("https://example.com/paper"), None);
        assert_eq!(arxiv_id("http://arxiv.org/abs/"), None);
    }

    #[test]
    fn test_leading_sentences_truncates() {
        let text = "First finding. Second finding. Third finding. Fourth.";
        assert_eq!(
            leading_sentences(text, 2),
            "First finding. Second finding."
        );
    }

    #[test]
    fn test_leading_sentences_short_abstract() {
        assert_eq!(leading_sentences("Only one sentence", 2), "Only one sentence.");
    }

    #[test]
    fn test_scholar_response_with_tldr() {
        let json = r#"{"tldr": {"text": "The tldr."}, "abstract": "Long abstract."}"#;
        let paper: ScholarPaper = serde_json::from_str(json).unwrap();
        assert_eq!(paper.tldr.unwrap().text, "The tldr.");
    }

    #[test]
    fn test_scholar_response_null_tldr() {
        let json = r#"{"tldr": null, "abstract": "An abstract. With details."}"#;
        let paper: ScholarPaper = serde_json::from_str(json).unwrap();
        assert!(paper.tldr.is_none());
        assert_eq!(paper.abstract_text.as_deref(), Some("An abstract. With details."));
    }
}
