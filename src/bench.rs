//! Timing harness that drives any [`EventStore`] through the contract only.

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::warn;

use crate::{event::Event, filter::Filter, store::EventStore};

/// Limit applied by every filter of the default suite.
pub const SUITE_LIMIT: usize = 500;

const MISSING_AUTHOR: &str = "00e6cc3224c036b4c090d8e76262d2e9db82cd748213a78c79fc62561f175a00";
const MISSING_ID: &str = "0000000000063995fa1a3a99584cb32fb77c10e4e929bfbd94bb40053549f100";

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub events: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct FilterReport {
    pub filter: Filter,
    pub iterations: u32,
    /// Events yielded by one execution.
    pub matched: usize,
    pub total: Duration,
}

impl FilterReport {
    pub fn average(&self) -> Duration {
        if self.iterations == 0 {
            return Duration::ZERO;
        }
        self.total / self.iterations
    }
}

/// The standard filter suite, with authors and ids drawn from `events`.
///
/// Covers an empty filter, kind filters, existing and missing authors, a
/// five-author set, existing and missing ids and a five-id set.
pub fn default_filters(events: &[Event]) -> Vec<Filter> {
    let mut authors: Vec<String> = Vec::new();
    for ev in events {
        if !authors.contains(&ev.pubkey) {
            authors.push(ev.pubkey.clone());
        }
        if authors.len() == 4 {
            break;
        }
    }
    let ids: Vec<String> = events.iter().take(5).map(|e| e.id.clone()).collect();
    let first_author = authors.first().cloned().unwrap_or_else(|| MISSING_AUTHOR.into());
    let first_id = ids.first().cloned().unwrap_or_else(|| MISSING_ID.into());

    let mut author_set = authors.clone();
    author_set.insert(author_set.len().min(1), MISSING_AUTHOR.to_string());

    vec![
        Filter::new(),
        Filter::new().kinds([1]),
        Filter::new().kinds([1, 5, 7]),
        Filter::new().authors([first_author]),
        Filter::new().authors([MISSING_AUTHOR]),
        Filter::new().authors(author_set),
        Filter::new().ids([first_id]),
        Filter::new().ids([MISSING_ID]),
        Filter::new().ids(ids),
    ]
    .into_iter()
    .map(|f| f.limit(SUITE_LIMIT))
    .collect()
}

/// Save every event, timing the whole load. Failed saves are counted and
/// logged, not fatal.
pub fn load_events(store: &dyn EventStore, events: &[Event]) -> LoadReport {
    let start = Instant::now();
    let mut failed = 0;
    for ev in events {
        if let Err(e) = store.save_event(ev) {
            warn!(id = %ev.id, "save failed: {e}");
            failed += 1;
        }
    }
    LoadReport {
        events: events.len(),
        failed,
        elapsed: start.elapsed(),
    }
}

/// Execute `filter` `iterations` times, draining the stream each time.
pub fn run_filter(store: &dyn EventStore, filter: &Filter, iterations: u32) -> Result<FilterReport> {
    let filters = std::slice::from_ref(filter);
    let mut matched = 0;
    let start = Instant::now();
    for _ in 0..iterations {
        matched = store.query_events(filters)?.count();
    }
    Ok(FilterReport {
        filter: filter.clone(),
        iterations,
        matched,
        total: start.elapsed(),
    })
}
