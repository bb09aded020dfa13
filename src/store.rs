//! Backend contract.
//!
//! Every backend, in-memory or persistent, implements [`EventStore`] with the
//! same observable behavior: filters are evaluated as in [`crate::matcher`],
//! results come newest `created_at` first, truncated at the query-wide limit
//! and free of duplicates. Swapping backends changes performance only.

use crate::{
    error::{InitError, QueryError, StoreError},
    event::Event,
    filter::Filter,
    query::EventStream,
};

pub trait EventStore: Send + Sync {
    /// Short backend name, e.g. `mem`.
    fn name(&self) -> &str;

    /// Prepare the backend from the settings it was built with.
    fn init(&self) -> Result<(), InitError>;

    /// Release every resource. Calling it again does nothing.
    fn close(&self);

    /// Store `event`. An already stored id is accepted as a no-op.
    fn save_event(&self, event: &Event) -> Result<(), StoreError>;

    /// Lazily stream events matching any of `filters`.
    fn query_events(&self, filters: &[Filter]) -> Result<EventStream, QueryError>;

    /// Remove the event with `id` if present.
    fn delete_event(&self, id: &str) -> Result<(), StoreError>;

    /// Keep only the newest event per replace key, see
    /// [`crate::bounded::BoundedStore::replace`].
    fn replace_event(&self, event: &Event) -> Result<(), StoreError>;

    /// Number of events a query would yield.
    fn count(&self, filters: &[Filter]) -> Result<usize, QueryError> {
        Ok(self.query_events(filters)?.count())
    }
}
