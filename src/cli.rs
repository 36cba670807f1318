//! Command-line interface definitions for the ClawBeat forge.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Knobs with a provider-facing meaning (batch size, pauses) default to the
//! values the feed has always run with; all arguments can be provided via
//! command-line flags, and the secrets via environment variables.

use clap::Parser;

/// Command-line arguments for one forge run.
///
/// # Examples
///
/// ```sh
/// # Basic usage
/// clawbeat_forge --output-path ./public/data.json --whitelist-path ./whitelist.json
///
/// # Include the research section
/// RUN_RESEARCH=true clawbeat_forge -o ./public/data.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path of the persisted feed JSON file
    #[arg(short, long, default_value = "./public/data.json")]
    pub output_path: String,

    /// Path of the source whitelist JSON file
    #[arg(short, long, default_value = "./whitelist.json")]
    pub whitelist_path: String,

    /// Google API key used for Gemini and YouTube calls
    #[arg(long, env = "GEMINI_API_KEY")]
    pub gemini_api_key: String,

    /// Cosine similarity threshold for topic clustering, in (0, 1]
    #[arg(long, default_value_t = 0.85)]
    pub similarity_threshold: f32,

    /// Embedding batch size (provider limit)
    #[arg(long, default_value_t = 5)]
    pub embed_batch_size: usize,

    /// Maximum news items kept in the persisted feed
    #[arg(long, default_value_t = 1000)]
    pub max_items: usize,

    /// Maximum LLM intel briefs generated per run
    #[arg(long, default_value_t = 50)]
    pub max_briefs: usize,

    /// Also scan arXiv and refresh the research section
    #[arg(long, env = "RUN_RESEARCH", default_value_t = false)]
    pub run_research: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["clawbeat_forge", "--gemini-api-key", "k"]);
        assert_eq!(cli.output_path, "./public/data.json");
        assert_eq!(cli.whitelist_path, "./whitelist.json");
        assert_eq!(cli.similarity_threshold, 0.85);
        assert_eq!(cli.embed_batch_size, 5);
        assert_eq!(cli.max_items, 1000);
        assert_eq!(cli.max_briefs, 50);
        assert!(!cli.run_research);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "clawbeat_forge",
            "--gemini-api-key",
            "k",
            "-o",
            "/tmp/data.json",
            "-w",
            "/tmp/whitelist.json",
        ]);
        assert_eq!(cli.output_path, "/tmp/data.json");
        assert_eq!(cli.whitelist_path, "/tmp/whitelist.json");
    }

    #[test]
    fn test_cli_tuning_flags() {
        let cli = Cli::parse_from([
            "clawbeat_forge",
            "--gemini-api-key",
            "k",
            "--similarity-threshold",
            "0.75",
            "--max-items",
            "100",
            "--run-research",
        ]);
        assert_eq!(cli.similarity_threshold, 0.75);
        assert_eq!(cli.max_items, 100);
        assert!(cli.run_research);
    }
}
