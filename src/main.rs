// src/main.rs
// =============================================================================
// This is the entry point of the spider CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (to stderr)
// 3. Build a SpiderConfig from --config plus flags
// 4. Dispatch to the subcommand (crawl or download)
// 5. Exit with proper code (0 = success, 1 = failed pages, 2 = error)
// =============================================================================

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use cli::{Cli, Commands, SpiderArgs};
use spider::crawl::LinkFollower;
use spider::report::{print_report, CrawlReport};
use spider::{logging, HandlerRef, Spider, SpiderConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(logging::level_for(cli.verbose, cli.quiet));

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = every page fetched with a success/redirect status
//   Ok(1) = some page failed
//   Err   = bad config, bad arguments, download failure, ...
async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Crawl { urls, spider, max_depth, any_domain, json } => {
            let config = build_config(&spider)?;
            handle_crawl(urls, config, max_depth, !any_domain, json).await
        }
        Commands::Download { src, dst, spider } => {
            let config = build_config(&spider)?;
            let spider = Spider::new(config)?;
            let bytes = spider
                .download(&src, &dst)
                .await
                .with_context(|| format!("downloading {}", src))?;
            println!("⬇️  {} -> {} ({} bytes)", src, dst.display(), bytes);
            Ok(0)
        }
    }
}

// Handles the 'crawl' subcommand
async fn handle_crawl(
    urls: Vec<String>,
    config: SpiderConfig,
    max_depth: usize,
    same_host: bool,
    json: bool,
) -> Result<i32> {
    let follower = LinkFollower::new(&urls, max_depth, same_host);
    let handler: HandlerRef = Arc::new(follower.clone());

    let spider = Spider::new(config)?;
    let stats = spider.start(urls, &[handler]).await?;

    let pages = follower.pages();
    let report = CrawlReport {
        pages: &pages,
        stats: &stats,
    };
    print_report(&report, json)?;

    Ok(if report.has_failures() { 1 } else { 0 })
}

// Config file first, then any flags given on the command line
fn build_config(args: &SpiderArgs) -> Result<SpiderConfig> {
    let mut config = match &args.config {
        Some(path) => SpiderConfig::from_file(path)?,
        None => SpiderConfig::default(),
    };

    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.delay_ms = delay_ms;
    }
    if args.allow_duplicates {
        config.allow_duplicates = true;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = Some(timeout_ms);
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = SpiderArgs {
            concurrency: Some(3),
            delay_ms: Some(50),
            allow_duplicates: true,
            ..SpiderArgs::default()
        };
        let config = build_config(&args).unwrap();
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.delay_ms, 50);
        assert!(config.allow_duplicates);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spider.json");
        std::fs::write(&path, r#"{ "concurrency": 2, "delay_ms": 500 }"#).unwrap();

        let args = SpiderArgs {
            config: Some(path),
            delay_ms: Some(0),
            ..SpiderArgs::default()
        };
        let config = build_config(&args).unwrap();
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.delay_ms, 0);
    }

    #[test]
    fn test_timeout_flag_in_milliseconds() {
        let args = SpiderArgs {
            timeout_ms: Some(250),
            ..SpiderArgs::default()
        };
        let config = build_config(&args).unwrap();
        assert_eq!(config.timeout(), Some(std::time::Duration::from_millis(250)));

        let zero = SpiderArgs {
            timeout_ms: Some(0),
            ..SpiderArgs::default()
        };
        assert!(build_config(&zero).is_err());
    }

    #[test]
    fn test_zero_concurrency_flag_rejected() {
        let args = SpiderArgs {
            concurrency: Some(0),
            ..SpiderArgs::default()
        };
        assert!(build_config(&args).is_err());
    }
}
