//! Semantic clustering engine: group near-duplicate coverage into topic anchors.
//!
//! This is the core of the forge. A run's freshly discovered articles are
//! embedded in paced batches, grouped into topic clusters by cosine
//! similarity, and each cluster's highest-density article is promoted to an
//! anchor carrying the other members as `moreCoverage`. The anchors are then
//! merged into the persisted feed under a URL-uniqueness invariant and a
//! bounded, newest-first window.
//!
//! # Algorithm
//!
//! Clustering is greedy single-link with anchor-only comparison: each
//! article is compared against the *first* member of every existing cluster,
//! in cluster-creation order, and joins the first one whose similarity
//! exceeds the threshold. This is O(n·k) per bucket rather than O(n²) and is
//! a deliberate simplicity/determinism trade-off: comparing against all
//! members would change output topology, so don't.
//!
//! Articles are partitioned into independent day buckets before clustering;
//! two articles with different date buckets never share a cluster, so a new
//! story can never be absorbed into an older day's topic.

use crate::api::EmbedAsync;
use crate::models::Article;
use crate::utils::parse_bucket;
use chrono::NaiveDate;
use itertools::Itertools;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Cosine similarity between two vectors.
///
/// Returns `None` when either vector has zero magnitude or the dimensions
/// disagree; a degenerate vector is treated as matching nothing, never as a
/// divide-by-zero.
pub fn cosine_similarity(v1: &[f32], v2: &[f32]) -> Option<f32> {
    if v1.len() != v2.len() {
        return None;
    }
    let dot: f32 = v1.iter().zip(v2).map(|(a, b)| a * b).sum();
    let norm1 = v1.iter().map(|a| a * a).sum::<f32>().sqrt();
    let norm2 = v2.iter().map(|b| b * b).sum::<f32>().sqrt();
    if norm1 == 0.0 || norm2 == 0.0 {
        return None;
    }
    Some(dot / (norm1 * norm2))
}

/// Assign embedding vectors to every article that lacks one.
///
/// Texts are requested in batches of `batch_size` with a cooperative `pause`
/// between batches to respect the provider's rate limits. Vectors are
/// assigned back by position. A batch that fails (after the embedder's own
/// retries) leaves all of its articles vector-less for the rest of the run:
/// they are excluded from clustering and from this run's persistence, and
/// get rediscovered and re-embedded on the next run since their URL never
/// enters the feed.
///
/// Articles that already carry a vector are never re-embedded.
///
/// # Returns
///
/// `(embedded, failed)` article counts.
#[instrument(level = "info", skip_all, fields(total = articles.len()))]
pub async fn embed_missing<E: EmbedAsync>(
    articles: &mut [Article],
    embedder: &E,
    batch_size: usize,
    pause: Duration,
) -> (usize, usize) {
    let batch_size = batch_size.max(1);
    let missing: Vec<usize> = articles
        .iter()
        .enumerate()
        .filter(|(_, a)| a.vec.is_none())
        .map(|(i, _)| i)
        .collect();

    if missing.is_empty() {
        debug!("No articles need embeddings");
        return (0, 0);
    }

    let chunk_count = missing.len().div_ceil(batch_size);
    let mut embedded = 0usize;
    let mut failed = 0usize;

    for (chunk_index, chunk) in missing.chunks(batch_size).enumerate() {
        let texts: Vec<String> = chunk.iter().map(|&i| articles[i].embedding_text()).collect();
        match embedder.embed(&texts).await {
            Ok(vectors) => {
                for (&i, vector) in chunk.iter().zip(vectors) {
                    articles[i].vec = Some(vector);
                }
                embedded += chunk.len();
            }
            Err(e) => {
                warn!(
                    batch = chunk_index + 1,
                    of = chunk_count,
                    size = chunk.len(),
                    error = %e,
                    "Embedding batch failed; articles stay vector-less this run"
                );
                failed += chunk.len();
            }
        }
        if chunk_index + 1 < chunk_count {
            sleep(pause).await;
        }
    }

    info!(embedded, failed, "Embedding pass complete");
    (embedded, failed)
}

/// Order buckets newest-first; unparseable buckets sort last.
fn bucket_date(key: &str) -> Option<NaiveDate> {
    parse_bucket(key)
}

/// Group articles into topic clusters and return one anchor per cluster.
///
/// Articles without a vector are dropped here (they were reported when their
/// embedding batch failed). Within each day bucket, articles are
/// stable-sorted by `density` descending (discovery order breaks ties) so
/// the densest article opens, and therefore anchors, its cluster. Each
/// anchor's `moreCoverage` lists the merged members' source/url pairs in
/// membership order.
///
/// Output order: buckets newest-first, clusters in creation order within a
/// bucket.
#[instrument(level = "info", skip_all, fields(total = articles.len(), threshold))]
pub fn cluster(articles: Vec<Article>, threshold: f32) -> Vec<Article> {
    let (valid, skipped): (Vec<Article>, Vec<Article>) =
        articles.into_iter().partition(|a| a.vec.is_some());
    if !skipped.is_empty() {
        debug!(count = skipped.len(), "Skipping vector-less articles");
    }

    // Partition into day buckets, preserving discovery order within each.
    let mut buckets: Vec<(String, Vec<Article>)> = Vec::new();
    for article in valid {
        match buckets.iter().position(|(key, _)| *key == article.date) {
            Some(i) => buckets[i].1.push(article),
            None => buckets.push((article.date.clone(), vec![article])),
        }
    }
    buckets.sort_by(|(a, _), (b, _)| bucket_date(b).cmp(&bucket_date(a)));

    let mut anchors = Vec::new();
    for (key, mut members) in buckets {
        members.sort_by(|a, b| b.density.cmp(&a.density));

        let mut clusters: Vec<Vec<Article>> = Vec::new();
        for article in members {
            let vector = article.vec.as_deref().unwrap_or_default();
            let joined = clusters.iter().position(|cluster| {
                let anchor_vec = cluster[0].vec.as_deref().unwrap_or_default();
                cosine_similarity(vector, anchor_vec)
                    .map(|sim| sim > threshold)
                    .unwrap_or(false)
            });
            match joined {
                Some(i) => clusters[i].push(article),
                None => clusters.push(vec![article]),
            }
        }

        debug!(bucket = %key, clusters = clusters.len(), "Bucket clustered");
        for mut cluster in clusters {
            let rest = cluster.split_off(1);
            let mut anchor = cluster.into_iter().next().unwrap();
            anchor.moreCoverage = rest.iter().map(Article::as_coverage).collect();
            anchors.push(anchor);
        }
    }

    info!(anchors = anchors.len(), "Clustering complete");
    anchors
}

/// Merge newly clustered anchors into the persisted feed.
///
/// - Any new anchor whose URL already exists in `existing` is discarded;
///   the persisted entry wins across runs.
/// - Surviving anchors are placed before the existing entries, the combined
///   list is stable-sorted by date bucket descending (new-before-old on
///   equal buckets, unparseable buckets oldest), and truncated to
///   `max_items` by dropping the tail. Truncation never reorders.
#[instrument(level = "info", skip_all, fields(new = new_anchors.len(), existing = existing.len(), max_items))]
pub fn merge(new_anchors: Vec<Article>, existing: Vec<Article>, max_items: usize) -> Vec<Article> {
    let existing_urls: HashSet<String> = existing.iter().map(|a| a.url.clone()).collect();
    let fresh: Vec<Article> = new_anchors
        .into_iter()
        .filter(|a| !existing_urls.contains(&a.url))
        .unique_by(|a| a.url.clone())
        .collect();

    let added = fresh.len();
    let mut merged: Vec<Article> = fresh.into_iter().chain(existing).collect();
    merged.sort_by(|a, b| bucket_date(&b.date).cmp(&bucket_date(&a.date)));
    let dropped = merged.len().saturating_sub(max_items);
    merged.truncate(max_items);

    info!(added, dropped, total = merged.len(), "Merged into feed");
    merged
}
