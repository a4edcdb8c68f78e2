// src/crawl/mod.rs
// =============================================================================
// Link-following crawl logic built on top of the spider.
//
// The spider itself knows nothing about HTML; it just fetches URLs and hands
// responses to handlers. This module provides the handler the CLI uses:
// - links: extracting and resolving <a href> links from a page
// - follow: LinkFollower, which records each page and queues its links
// =============================================================================

mod follow;
mod links;

pub use follow::{LinkFollower, PageRecord};
pub use links::{extract_links, host_of};
