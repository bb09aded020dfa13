//! Reference in-memory backend.
//!
//! A single [`parking_lot::RwLock`] guards the [`BoundedStore`]. Writers hold
//! the write lock for the whole mutation, so a replace is atomic per key.
//! Readers hold the read lock only while copying the ordered snapshot and
//! then match lock-free over the copy. An in-flight query therefore never
//! observes writes made after it started.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::{
    bounded::BoundedStore,
    config::Settings,
    error::{InitError, QueryError, StoreError},
    event::Event,
    filter::Filter,
    query::{effective_limit, Cancel, EventStream, QueryExecutor},
    store::EventStore,
};

/// Bounded in-memory [`EventStore`].
///
/// Nothing is allocated until [`EventStore::init`]; [`EventStore::close`]
/// drops every stored event.
pub struct MemoryStore {
    settings: Settings,
    state: RwLock<Option<BoundedStore>>,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            state: RwLock::new(None),
        }
    }

    /// Build and open a store in one step.
    pub fn open(settings: Settings) -> Result<Self, InitError> {
        let store = Self::new(settings);
        store.init()?;
        Ok(store)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_open(&self) -> bool {
        self.state.read().is_some()
    }

    /// Number of stored events, zero when closed.
    pub fn len(&self) -> usize {
        self.state.read().as_ref().map_or(0, BoundedStore::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<Arc<Event>> {
        self.state.read().as_ref().and_then(|s| s.get(id))
    }

    /// Insert and report whether a new record was added.
    pub fn insert(&self, event: Event) -> Result<bool, StoreError> {
        let mut guard = self.state.write();
        let store = guard.as_mut().ok_or(StoreError::Closed)?;
        Ok(store.insert(event))
    }

    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut guard = self.state.write();
        let store = guard.as_mut().ok_or(StoreError::Closed)?;
        Ok(store.delete(id))
    }

    pub fn replace(&self, event: Event) -> Result<bool, StoreError> {
        let mut guard = self.state.write();
        let store = guard.as_mut().ok_or(StoreError::Closed)?;
        Ok(store.replace(event))
    }

    /// Newest-first copy of the current contents.
    ///
    /// Each call takes a fresh point-in-time view; later writes never show up
    /// in an already returned snapshot.
    pub fn snapshot_iterate(&self) -> Result<std::vec::IntoIter<Arc<Event>>, QueryError> {
        let guard = self.state.read();
        let store = guard.as_ref().ok_or(QueryError::Closed)?;
        Ok(store.snapshot().into_iter())
    }

    fn check_filters(&self, filters: &[Filter]) -> Result<(), QueryError> {
        if !self.settings.search && filters.iter().any(|f| f.search.is_some()) {
            return Err(QueryError::Unsupported(
                "search is disabled for this backend".into(),
            ));
        }
        Ok(())
    }
}

impl EventStore for MemoryStore {
    fn name(&self) -> &str {
        "mem"
    }

    fn init(&self) -> Result<(), InitError> {
        if self.settings.max_size == 0 {
            return Err(InitError::InvalidConfig("max_size must be positive".into()));
        }
        if self.settings.max_limit == 0 {
            return Err(InitError::InvalidConfig("max_limit must be positive".into()));
        }
        if self.settings.default_limit == 0 {
            return Err(InitError::InvalidConfig(
                "default_limit must be positive".into(),
            ));
        }
        let mut guard = self.state.write();
        if guard.is_some() {
            return Err(InitError::AlreadyOpen);
        }
        *guard = Some(BoundedStore::new(self.settings.max_size));
        info!(
            max_size = self.settings.max_size,
            max_limit = self.settings.max_limit,
            "memory store initialized"
        );
        Ok(())
    }

    fn close(&self) {
        if let Some(store) = self.state.write().take() {
            info!(events = store.len(), "memory store closed");
        }
    }

    fn save_event(&self, event: &Event) -> Result<(), StoreError> {
        self.insert(event.clone()).map(|_| ())
    }

    fn query_events(&self, filters: &[Filter]) -> Result<EventStream, QueryError> {
        let guard = self.state.read();
        let store = guard.as_ref().ok_or(QueryError::Closed)?;
        self.check_filters(filters)?;
        if effective_limit(filters, self.settings.default_limit, self.settings.max_limit).is_none() {
            return Ok(EventStream::empty());
        }
        let snapshot = store.snapshot();
        drop(guard);
        debug!(
            filters = filters.len(),
            candidates = snapshot.len(),
            "query snapshot taken"
        );
        let cancel = Cancel::new();
        let exec = QueryExecutor::new(
            snapshot,
            filters,
            self.settings.default_limit,
            self.settings.max_limit,
            cancel.clone(),
        );
        Ok(EventStream::new(exec, cancel))
    }

    fn delete_event(&self, id: &str) -> Result<(), StoreError> {
        self.delete(id).map(|_| ())
    }

    fn replace_event(&self, event: &Event) -> Result<(), StoreError> {
        self.replace(event.clone()).map(|_| ())
    }
}

/// Construct and initialize the backend named in `settings`.
///
/// Only `mem` is built in; persistent engines implement [`EventStore`]
/// outside this crate.
pub fn open_backend(settings: &Settings) -> Result<Box<dyn EventStore>, InitError> {
    match settings.backend.as_str() {
        "mem" | "memory" => Ok(Box::new(MemoryStore::open(settings.clone())?)),
        other => Err(InitError::UnknownBackend(other.to_string())),
    }
}
