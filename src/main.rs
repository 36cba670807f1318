//! # ClawBeat Forge
//!
//! A content-aggregation pipeline that scans news sources for coverage of the
//! ClawBeat beat, groups near-duplicate articles into topic anchors with
//! embedding-vector clustering, and publishes a bounded JSON intel feed.
//!
//! ## Features
//!
//! - Scans whitelisted site feeds and Google News search (RSS/Atom)
//! - Rewrites priority-source summaries into one-sentence intel briefs
//! - Clusters same-day coverage by cosine similarity over Gemini embeddings
//! - Merges anchors into the persisted feed with URL dedup and a rolling
//!   newest-first window
//! - Optionally refreshes the research (arXiv + Semantic Scholar) and
//!   videos (YouTube uploads) sections
//!
//! ## Usage
//!
//! ```sh
//! clawbeat_forge -o ./public/data.json -w ./whitelist.json
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Scanning**: Discover candidate records from each source (isolated failures)
//! 2. **Normalizing**: Uniform articles, keyword density, delist filtering
//! 3. **Clustering**: Embed in paced batches, greedy single-link per day bucket
//! 4. **Merging**: Dedup by URL against the persisted feed, bounded window
//! 5. **Output**: Write the whole feed JSON once, atomically, at the end

use chrono::{Local, Utc};
use clap::Parser;
use itertools::Itertools;
use std::collections::HashSet;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod cluster;
mod models;
mod normalize;
mod scrapers;
mod store;
mod utils;

use cli::Cli;
use models::SourceType;
use normalize::NormalizeError;
use store::{FeedStore, JsonFeedStore};

const USER_AGENT: &str = "ClawBeatForgeBot/0.2 (intel feed)";

/// Pause between LLM brief calls (provider pacing).
const BRIEF_PAUSE: Duration = Duration::from_millis(6_500);

/// Pause between embedding batches (provider pacing).
const EMBED_PAUSE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("forge starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.output_path, ?args.whitelist_path, "Parsed CLI arguments");

    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()?;

    // ---- Load persisted feed (read once; absent or corrupt means empty) ----
    let feed_store = JsonFeedStore::new(&args.output_path);
    let mut feed = feed_store.load().await;

    // ---- Scan sources; one adapter's failure never aborts the others ----
    let whitelist = match scrapers::rss::load_whitelist(&args.whitelist_path).await {
        Ok(sites) => sites,
        Err(e) => {
            warn!(error = %e, "Whitelist unavailable; scanning search feeds only");
            Vec::new()
        }
    };

    let rss_records = scrapers::rss::scan(&http, &whitelist).await;
    let search_records = match scrapers::google_news::scan(&http).await {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "Google News scan failed; continuing without it");
            Vec::new()
        }
    };
    info!(
        rss = rss_records.len(),
        search = search_records.len(),
        "Source scans complete"
    );

    // ---- Normalize; skip URLs the feed already carries ----
    let run_date = Local::now().date_naive();
    let existing_urls: HashSet<String> = feed.items.iter().map(|a| a.url.clone()).collect();
    let mut fresh = Vec::new();
    let (mut known, mut malformed, mut delisted) = (0usize, 0usize, 0usize);
    for raw in rss_records.into_iter().chain(search_records) {
        match normalize::normalize(raw, run_date) {
            Ok(article) if existing_urls.contains(&article.url) => known += 1,
            Ok(article) => fresh.push(article),
            Err(e @ NormalizeError::Malformed { .. }) => {
                warn!(error = %e, "Dropped malformed record");
                malformed += 1;
            }
            Err(e @ NormalizeError::Delisted { .. }) => {
                debug!(error = %e, "Dropped delisted record");
                delisted += 1;
            }
        }
    }
    // The same story can surface from both a site feed and the search scan.
    let mut fresh: Vec<_> = fresh.into_iter().unique_by(|a| a.url.clone()).collect();
    info!(
        fresh = fresh.len(),
        known, malformed, delisted, "Normalization complete"
    );

    // ---- Intel briefs for priority-source articles, capped per run ----
    let mut briefs = 0usize;
    for article in fresh.iter_mut() {
        if article.source_type != SourceType::Priority || briefs >= args.max_briefs {
            continue;
        }
        article.summary =
            api::intel_brief(&http, &args.gemini_api_key, &article.title, &article.summary).await;
        debug!(
            url = %article.url,
            brief = %utils::truncate_for_log(&article.summary, 120),
            "Intel brief ready"
        );
        briefs += 1;
        tokio::time::sleep(BRIEF_PAUSE).await;
    }
    if briefs > 0 {
        info!(briefs, "Generated intel briefs");
    }

    // ---- Embed, cluster, merge ----
    let embedder = api::embedder_with_backoff(&http, &args.gemini_api_key);
    let (embedded, failed) =
        cluster::embed_missing(&mut fresh, &embedder, args.embed_batch_size, EMBED_PAUSE).await;
    if failed > 0 {
        warn!(
            failed,
            embedded, "Some articles have no vector this run; they will be retried next run"
        );
    }

    let anchors = cluster::cluster(fresh, args.similarity_threshold);
    let existing_items = std::mem::take(&mut feed.items);
    feed.items = cluster::merge(anchors, existing_items, args.max_items);

    // ---- Research section: additive, keep history when the scan is empty ----
    if args.run_research {
        match scrapers::arxiv::scan(&http).await {
            Ok(papers) if papers.is_empty() => {
                info!("arXiv returned 0 results; keeping existing research");
            }
            Ok(papers) => {
                let known_urls: HashSet<String> =
                    feed.research.iter().map(|p| p.url.clone()).collect();
                let new_papers: Vec<_> = papers
                    .into_iter()
                    .filter(|p| !known_urls.contains(&p.url))
                    .collect();
                info!(added = new_papers.len(), "Research section updated");
                feed.research.extend(new_papers);
            }
            Err(e) => warn!(error = %e, "arXiv scan failed; keeping existing research"),
        }
    }

    // ---- Videos section: replaced when at least one channel fetch succeeds ----
    let mut channel_videos = Vec::new();
    let mut any_channel_ok = false;
    for site in &whitelist {
        let Some(channel_id) = site.youtube_channel_id.as_deref().filter(|id| !id.is_empty())
        else {
            continue;
        };
        match scrapers::youtube::fetch_channel_uploads(&http, &args.gemini_api_key, channel_id)
            .await
        {
            Ok(videos) => {
                any_channel_ok = true;
                channel_videos.extend(videos);
            }
            Err(e) => warn!(channel = channel_id, error = %e, "YouTube fetch failed"),
        }
    }
    if any_channel_ok {
        feed.videos = channel_videos;
    }

    feed.last_updated = Utc::now().format("%Y-%m-%d %H:%M UTC").to_string();

    // ---- Save: the run's single side effect and its only fatal error ----
    if let Err(e) = feed_store.save(&feed).await {
        error!(error = %e, "Failed to write feed; previous feed left untouched");
        return Err(e.into());
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        items = feed.items.len(),
        research = feed.research.len(),
        videos = feed.videos.len(),
        "Forge run complete"
    );

    Ok(())
}
