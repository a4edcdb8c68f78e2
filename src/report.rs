// src/report.rs
// =============================================================================
// Printing crawl results.
//
// Two formats:
// - a human-readable table of pages plus a summary
// - JSON ({ "pages": [...], "stats": {...} }) for scripts and CI
//
// The table is built as a String first so it can be tested without capturing
// stdout.
// =============================================================================

use std::fmt::Write;

use serde::Serialize;

use crate::crawl::PageRecord;
use crate::spider::CrawlStats;

#[derive(Debug, Serialize)]
pub struct CrawlReport<'a> {
    pub pages: &'a [PageRecord],
    pub stats: &'a CrawlStats,
}

impl CrawlReport<'_> {
    /// True if any page answered with an error status or could not be fetched
    pub fn has_failures(&self) -> bool {
        self.stats.transport_failures > 0 || self.pages.iter().any(|p| !p.is_ok())
    }
}

pub fn print_report(report: &CrawlReport<'_>, json: bool) -> serde_json::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render_table(report));
    }
    Ok(())
}

pub fn render_table(report: &CrawlReport<'_>) -> String {
    let mut out = String::new();

    // write! into a String can't fail
    let _ = writeln!(out, "{:<60} {:<8} {:<6} {:<6}", "URL", "STATUS", "DEPTH", "LINKS");
    let _ = writeln!(out, "{}", "=".repeat(83));

    for page in report.pages {
        // Truncate URL if too long for display
        let url_display = if page.url.chars().count() > 57 {
            format!("{}...", page.url.chars().take(57).collect::<String>())
        } else {
            page.url.clone()
        };
        let _ = writeln!(
            out,
            "{:<60} {:<8} {:<6} {:<6}",
            url_display,
            format_status(page.status),
            page.depth,
            page.links
        );
    }

    let ok_count = report.pages.iter().filter(|p| p.is_ok()).count();
    let stats = report.stats;
    let _ = writeln!(out);
    let _ = writeln!(out, "📊 Summary:");
    let _ = writeln!(out, "   ✅ OK: {}", ok_count);
    let _ = writeln!(out, "   ❌ Error status: {}", report.pages.len() - ok_count);
    let _ = writeln!(out, "   🌐 Unreachable: {}", stats.transport_failures);
    let _ = writeln!(out, "   ⚠️  Handler failures: {}", stats.handler_failures);
    let _ = writeln!(out, "   🔁 Duplicates skipped: {}", stats.duplicates);
    let _ = writeln!(out, "   📋 Fetched: {}", stats.fetched);
    out
}

fn format_status(status: u16) -> String {
    match status {
        200..=299 => format!("✅ {}", status),
        300..=399 => format!("🔀 {}", status),
        _ => format!("❌ {}", status),
    }
}
