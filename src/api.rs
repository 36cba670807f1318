//! Gemini API interaction with exponential backoff retry logic.
//!
//! This module provides a robust interface for the two model calls the forge
//! makes: batch embedding (for clustering) and one-sentence intel briefs
//! (for priority-source articles). It includes automatic retry logic with
//! exponential backoff and jitter to handle transient failures gracefully.
//!
//! # Architecture
//!
//! The module uses a trait-based design for flexibility:
//! - [`EmbedAsync`]: Core trait defining async batch embedding
//! - [`GeminiEmbed`]: reqwest implementation of `batchEmbedContents`
//! - [`RetryEmbed`]: Decorator that adds retry logic to any `EmbedAsync` implementation
//!
//! # Retry Strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Embedding model used for clustering vectors.
pub const EMBED_MODEL: &str = "gemini-embedding-001";

/// Text model used for intel briefs.
pub const BRIEF_MODEL: &str = "gemini-1.5-flash";

/// Fallback brief when the model call fails; the article still ships.
pub const PENDING_BRIEF: &str = "Summary pending.";

/// Trait for async batch embedding.
///
/// Implementors of this trait can send a batch of texts to an embedding
/// service and receive one vector per text, in input order. This abstraction
/// allows for different backends or decorators (like retry logic), and lets
/// the clustering engine be tested against a fake embedder.
pub trait EmbedAsync {
    /// Embed a batch of texts.
    ///
    /// # Returns
    ///
    /// One vector per input text, in the same order, or an error if the
    /// request failed.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`EmbedAsync`]
/// implementation.
///
/// This decorator transparently adds retry logic with exponential backoff
/// and jitter to handle transient API failures. It's designed to be resilient
/// against rate limiting, network issues, and temporary server errors.
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryEmbed<T> {
    /// The underlying embedding client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryEmbed<T>
where
    T: EmbedAsync,
{
    /// Create a new retry wrapper around an existing [`EmbedAsync`] implementation.
    ///
    /// # Arguments
    ///
    /// * `inner` - The underlying embedding client to wrap
    /// * `max_retries` - Maximum number of retry attempts (5 recommended)
    /// * `base_delay` - Initial delay between retries (1 second recommended)
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryEmbed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryEmbed")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> EmbedAsync for RetryEmbed<T>
where
    T: EmbedAsync + fmt::Debug,
{
    #[instrument(level = "info", skip_all)]
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.embed(texts).await {
                Ok(vectors) => {
                    return Ok(vectors);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "embed() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "embed() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct EmbedContent<'a> {
    parts: Vec<EmbedPart<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: String,
    content: EmbedContent<'a>,
    task_type: &'a str,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbedValues>,
}

#[derive(Deserialize)]
struct EmbedValues {
    values: Vec<f32>,
}

/// Gemini `batchEmbedContents` client implementing [`EmbedAsync`].
///
/// Vectors are requested with the `CLUSTERING` task type so they are tuned
/// for grouping rather than retrieval.
#[derive(Debug)]
pub struct GeminiEmbed<'a> {
    /// Shared HTTP client.
    pub http: &'a reqwest::Client,
    /// Gemini API key.
    pub api_key: &'a str,
    /// Embedding model name, without the `models/` prefix.
    pub model: &'a str,
}

impl<'a> EmbedAsync for GeminiEmbed<'a> {
    #[instrument(level = "info", skip_all, fields(batch = texts.len()))]
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Box<dyn Error>> {
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest {
                    model: format!("models/{}", self.model),
                    content: EmbedContent {
                        parts: vec![EmbedPart { text }],
                    },
                    task_type: "CLUSTERING",
                })
                .collect(),
        };

        let endpoint = format!("{}/models/{}:batchEmbedContents", API_BASE, self.model);
        let t0 = Instant::now();
        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        let parsed: BatchEmbedResponse = response.json().await?;
        let dt = t0.elapsed();

        if parsed.embeddings.len() != texts.len() {
            warn!(
                requested = texts.len(),
                returned = parsed.embeddings.len(),
                "Embedding count mismatch"
            );
            return Err(format!(
                "embedding service returned {} vectors for {} texts",
                parsed.embeddings.len(),
                texts.len()
            )
            .into());
        }

        info!(
            batch = texts.len(),
            elapsed_ms = dt.as_millis() as u128,
            "Embedded batch"
        );
        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }
}

/// Build the production embedder: Gemini `batchEmbedContents` wrapped in
/// exponential-backoff retries.
///
/// A batch that still fails after all retries is reported as an error; the
/// caller leaves the affected articles vector-less for the rest of the run
/// rather than re-requesting them.
///
/// # Retry Behavior
///
/// - Up to 5 retry attempts
/// - Exponential backoff: 1s, 2s, 4s, 8s, 16s (capped at 30s)
/// - Random jitter added to prevent thundering herd
pub fn embedder_with_backoff<'a>(
    http: &'a reqwest::Client,
    api_key: &'a str,
) -> RetryEmbed<GeminiEmbed<'a>> {
    let client = GeminiEmbed {
        http,
        api_key,
        model: EMBED_MODEL,
    };
    RetryEmbed::new(client, 5, StdDuration::from_secs(1))
}

#[derive(Serialize)]
struct GeneratePart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerateContent<'a> {
    parts: Vec<GeneratePart<'a>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<GenerateContent<'a>>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Rewrite a title + summary into a one-sentence intel brief.
///
/// Failures degrade to [`PENDING_BRIEF`] rather than erroring: a missing
/// brief never costs the feed an article. Used only for priority-source
/// articles, with the caller enforcing the per-run cap and pacing.
#[instrument(level = "info", skip_all)]
pub async fn intel_brief(
    http: &reqwest::Client,
    api_key: &str,
    title: &str,
    summary: &str,
) -> String {
    let prompt = format!(
        "Rewrite this as a professional 1-sentence tech intel brief. Impact focus. \
         Title: {}. Context: {}. Output ONLY the sentence.",
        title, summary
    );

    match generate_text(http, api_key, &prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, %title, "Intel brief failed; using placeholder");
            PENDING_BRIEF.to_string()
        }
    }
}

async fn generate_text(
    http: &reqwest::Client,
    api_key: &str,
    prompt: &str,
) -> Result<String, Box<dyn Error>> {
    let request = GenerateRequest {
        contents: vec![GenerateContent {
            parts: vec![GeneratePart { text: prompt }],
        }],
    };

    let endpoint = format!("{}/models/{}:generateContent", API_BASE, BRIEF_MODEL);
    let response = send_generate(http, api_key, &endpoint, &request).await?;

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text.trim().to_string())
        .unwrap_or_default();

    if text.is_empty() {
        return Err("model returned no text".into());
    }
    Ok(text)
}

async fn send_generate(
    http: &reqwest::Client,
    api_key: &str,
    endpoint: &str,
    request: &GenerateRequest<'_>,
) -> Result<GenerateResponse, Box<dyn Error>> {
    let t0 = Instant::now();
    let res = http
        .post(endpoint)
        .header("x-goog-api-key", api_key)
        .json(request)
        .send()
        .await?
        .error_for_status()?
        .json::<GenerateResponse>()
        .await;
    let dt = t0.elapsed();

    match &res {
        Ok(_) => {}
        Err(e) => warn!(elapsed_ms = dt.as_millis() as u128, error = %e, "API call failed"),
    }
    Ok(res?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_request_shape() {
        let texts = vec!["first".to_string(), "second".to_string()];
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest {
                    model: format!("models/{}", EMBED_MODEL),
                    content: EmbedContent {
                        parts: vec![EmbedPart { text }],
                    },
                    task_type: "CLUSTERING",
                })
                .collect(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["requests"].as_array().unwrap().len(), 2);
        assert_eq!(json["requests"][0]["taskType"], "CLUSTERING");
        assert_eq!(
            json["requests"][0]["content"]["parts"][0]["text"],
            "first"
        );
        assert_eq!(
            json["requests"][1]["model"],
            format!("models/{}", EMBED_MODEL)
        );
    }

    #[test]
    fn test_batch_response_parses_values() {
        let body = r#"{"embeddings": [{"values": [0.1, 0.2]}, {"values": [0.3, 0.4]}]}"#;
        let parsed: BatchEmbedResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
        assert_eq!(parsed.embeddings[1].values, vec![0.3, 0.4]);
    }

    #[test]
    fn test_generate_response_extracts_first_candidate() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "  A one sentence brief.  "}]}}
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text.trim().to_string())
            .unwrap();
        assert_eq!(text, "A one sentence brief.");
    }

    #[test]
    fn test_generate_response_tolerates_empty_candidates() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
