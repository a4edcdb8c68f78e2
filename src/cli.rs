// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Subcommands:
// - crawl: follow links from one or more seed URLs and report every page
// - download: fetch a single URL straight into a file
//
// Flags given on the command line override values from --config.
// =============================================================================

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "spider",
    version,
    about = "A bounded-concurrency web crawler",
    long_about = "spider fetches pages with a fixed pool of concurrent workers, follows links \
                  it finds, and stops by itself once there is nothing left to fetch."
)]
pub struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl one or more websites
    ///
    /// Example: spider crawl https://example.com --max-depth 2 --concurrency 4
    Crawl {
        /// Seed URLs to start from
        #[arg(required = true)]
        urls: Vec<String>,

        #[command(flatten)]
        spider: SpiderArgs,

        /// How many link hops to follow (1 = only the seed pages)
        #[arg(long, default_value_t = 1)]
        max_depth: usize,

        /// Follow links to any host, not just the seed hosts
        #[arg(long)]
        any_domain: bool,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Download a single URL to a file
    ///
    /// Example: spider download https://example.com/logo.png logo.png
    Download {
        /// URL to fetch
        src: String,

        /// Destination file
        dst: PathBuf,

        #[command(flatten)]
        spider: SpiderArgs,
    },
}

/// Options shared by every subcommand that builds a Spider
#[derive(Args, Debug, Default)]
pub struct SpiderArgs {
    /// JSON config file (every field optional)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of concurrent workers [default: 10]
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Delay each worker waits after a request, in milliseconds [default: 0]
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Fetch URLs again even if they were already crawled
    #[arg(long)]
    pub allow_duplicates: bool,

    /// Per-request timeout in milliseconds [default: 30000]
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_crawl() {
        let cli = Cli::parse_from([
            "spider",
            "-v",
            "crawl",
            "https://example.com",
            "https://example.org",
            "--concurrency",
            "4",
            "--max-depth",
            "3",
            "--json",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Crawl { urls, spider, max_depth, any_domain, json } => {
                assert_eq!(urls.len(), 2);
                assert_eq!(spider.concurrency, Some(4));
                assert_eq!(max_depth, 3);
                assert!(!any_domain);
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_crawl_requires_url() {
        assert!(Cli::try_parse_from(["spider", "crawl"]).is_err());
    }

    #[test]
    fn test_parse_download() {
        let cli = Cli::parse_from(["spider", "download", "https://example.com/a.png", "a.png"]);
        match cli.command {
            Commands::Download { src, dst, .. } => {
                assert_eq!(src, "https://example.com/a.png");
                assert_eq!(dst, PathBuf::from("a.png"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
