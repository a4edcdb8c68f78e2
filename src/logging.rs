// src/logging.rs
// =============================================================================
// Log setup for the CLI.
//
// The library only emits `tracing` events (ADD / Loading / DOWNLOADING, worker
// failures, crawl summary). Whoever embeds it decides where they go; the CLI
// sends them to stderr so `--json` output on stdout stays machine readable.
//
// RUST_LOG always wins over the verbosity flags, e.g.
//   RUST_LOG=spider=trace spider crawl https://example.com
// =============================================================================

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Maps -q / -v flags to a default level
pub fn level_for(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::WARN;
    }
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs the global subscriber. Call once, at the start of main.
pub fn init(level: Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
