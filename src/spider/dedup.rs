// src/spider/dedup.rs
// =============================================================================
// Admission control: decides whether a URL may enter the work queue.
//
// Every URL admitted during a crawl is recorded here and never removed, so a
// page is fetched at most once per crawl (unless duplicates are allowed).
// The check and the insert happen under one lock, so two handlers offering the
// same link at the same moment can't both get it admitted.
// =============================================================================

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use url::Url;

#[derive(Debug, Default)]
pub struct DedupSet {
    allow_duplicates: bool,
    seen: Mutex<HashSet<String>>,
}

impl DedupSet {
    pub fn new(allow_duplicates: bool) -> Self {
        Self {
            allow_duplicates,
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Returns true if the caller may enqueue `url`.
    ///
    /// With duplicates disallowed the URL is recorded as part of the same
    /// step, so only the first of several concurrent offers wins.
    pub fn admit(&self, url: &str) -> bool {
        if self.allow_duplicates {
            return true;
        }
        let key = normalize(url);
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key)
    }

    /// Number of distinct URLs recorded so far
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Fragments never reach the server, so "page#a" and "page#b" are one page.
// Strings that don't parse as URLs are compared as-is.
fn normalize(url: &str) -> String {
    let trimmed = url.trim();
    match Url::parse(trimmed) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    #[test]
    fn test_admit_once() {
        let set = DedupSet::new(false);
        assert!(set.admit("https://example.com/a"));
        assert!(!set.admit("https://example.com/a"));
        assert!(set.admit("https://example.com/b"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_allow_duplicates_admits_everything() {
        let set = DedupSet::new(true);
        assert!(set.admit("https://example.com/a"));
        assert!(set.admit("https://example.com/a"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_fragment_ignored() {
        let set = DedupSet::new(false);
        assert!(set.admit("https://example.com/docs#intro"));
        assert!(!set.admit("https://example.com/docs#usage"));
        assert!(!set.admit("https://example.com/docs"));
    }

    #[test]
    fn test_host_case_normalized() {
        let set = DedupSet::new(false);
        assert!(set.admit("https://EXAMPLE.com/a"));
        assert!(!set.admit("https://example.com/a"));
    }

    #[test]
    fn test_unparseable_compared_verbatim() {
        let set = DedupSet::new(false);
        assert!(set.admit("not a url"));
        assert!(!set.admit("  not a url "));
    }

    #[test]
    fn test_concurrent_admits_single_winner() {
        let set = Arc::new(DedupSet::new(false));
        let barrier = Arc::new(Barrier::new(8));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let set = Arc::clone(&set);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    set.admit("https://example.com/contested")
                })
            })
            .collect();

        let winners = threads
            .into_iter()
            .map(|t| t.join().unwrap())
            .filter(|admitted| *admitted)
            .count();
        assert_eq!(winners, 1);
    }
}
