//! Streaming query execution over an ordered snapshot.

use std::{
    collections::HashSet,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::{event::Event, filter::Filter, matcher};

/// Cancellation token shared between a stream and whoever may stop it.
///
/// Clones observe the same flag, so a handle can be moved to another thread
/// and fired while the stream is being consumed.
#[derive(Debug, Clone, Default)]
pub struct Cancel(Arc<AtomicBool>);

impl Cancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Result limit for a set of OR-ed filters.
///
/// Filters asking for zero results do not take part. Among the rest the
/// largest limit wins, an absent limit counting as `default_limit`, and the
/// outcome is capped at `max_limit`. `None` means nothing can match.
pub fn effective_limit(filters: &[Filter], default_limit: usize, max_limit: usize) -> Option<usize> {
    filters
        .iter()
        .filter(|f| f.limit != Some(0))
        .map(|f| f.limit.unwrap_or(default_limit))
        .max()
        .map(|limit| limit.min(max_limit))
}

/// Lazy walk of a newest-first snapshot yielding matches of any filter.
///
/// Yields each event at most once and stops at the query-wide limit. The
/// cancellation flag is checked before every candidate, and the snapshot is
/// dropped as soon as the walk ends for any reason.
pub struct QueryExecutor {
    snapshot: std::vec::IntoIter<Arc<Event>>,
    filters: Vec<Filter>,
    remaining: usize,
    seen: HashSet<String>,
    cancel: Cancel,
}

impl QueryExecutor {
    pub fn new(
        snapshot: Vec<Arc<Event>>,
        filters: &[Filter],
        default_limit: usize,
        max_limit: usize,
        cancel: Cancel,
    ) -> Self {
        let remaining = effective_limit(filters, default_limit, max_limit).unwrap_or(0);
        let filters: Vec<Filter> = filters
            .iter()
            .filter(|f| f.limit != Some(0))
            .cloned()
            .collect();
        let mut exec = Self {
            snapshot: snapshot.into_iter(),
            filters,
            remaining,
            seen: HashSet::new(),
            cancel,
        };
        if exec.remaining == 0 {
            exec.finish();
        }
        exec
    }

    /// Candidates not yet examined.
    pub fn pending(&self) -> usize {
        self.snapshot.len()
    }

    fn finish(&mut self) {
        self.remaining = 0;
        self.snapshot = Vec::new().into_iter();
        self.seen = HashSet::new();
    }
}

impl Iterator for QueryExecutor {
    type Item = Arc<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            if self.cancel.is_cancelled() {
                break;
            }
            let Some(ev) = self.snapshot.next() else {
                break;
            };
            if !matcher::matches_any(&ev, &self.filters) {
                continue;
            }
            if !self.seen.insert(ev.id.clone()) {
                continue;
            }
            self.remaining -= 1;
            if self.remaining == 0 {
                self.finish();
            }
            return Some(ev);
        }
        self.finish();
        None
    }
}

/// Result of [`crate::store::EventStore::query_events`].
///
/// Wraps a backend's lazy iterator together with its [`Cancel`] token.
/// Stopping early is always allowed: drop the stream, or fire a handle from
/// [`EventStream::cancel_handle`] and the next call to `next` returns `None`.
pub struct EventStream {
    inner: Box<dyn Iterator<Item = Arc<Event>> + Send>,
    cancel: Cancel,
}

impl EventStream {
    pub fn new(inner: impl Iterator<Item = Arc<Event>> + Send + 'static, cancel: Cancel) -> Self {
        Self {
            inner: Box::new(inner),
            cancel,
        }
    }

    /// A stream that yields nothing.
    pub fn empty() -> Self {
        Self::new(std::iter::empty(), Cancel::new())
    }

    pub fn cancel_handle(&self) -> Cancel {
        self.cancel.clone()
    }

    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.inner = Box::new(std::iter::empty());
    }
}

impl Iterator for EventStream {
    type Item = Arc<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cancel.is_cancelled() {
            self.inner = Box::new(std::iter::empty());
            return None;
        }
        self.inner.next()
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
