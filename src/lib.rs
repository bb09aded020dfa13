//! Bounded in-memory Nostr event store.
//!
//! [`EventStore`] is the contract every backend implements; [`MemoryStore`]
//! is the reference backend built on [`BoundedStore`]. Queries are lazy,
//! cancellable [`EventStream`]s yielding newest events first.
//!
//! ```
//! use slicestore::{Event, EventStore, Filter, MemoryStore, Settings};
//!
//! let store = MemoryStore::open(Settings::default()).unwrap();
//! store
//!     .save_event(&Event {
//!         id: "aa11".into(),
//!         pubkey: "p1".into(),
//!         kind: 1,
//!         created_at: 100,
//!         tags: vec![],
//!         content: "gm".into(),
//!         sig: String::new(),
//!     })
//!     .unwrap();
//! let hits: Vec<_> = store.query_events(&[Filter::new().kinds([1])]).unwrap().collect();
//! assert_eq!(hits[0].id, "aa11");
//! ```

pub mod bench;
pub mod bounded;
pub mod config;
pub mod corpus;
pub mod error;
pub mod event;
pub mod filter;
pub mod matcher;
pub mod memory;
pub mod query;
pub mod store;

pub use bounded::BoundedStore;
pub use config::Settings;
pub use error::{InitError, QueryError, StoreError};
pub use event::{Event, KindClass, ReplaceKey, Tag};
pub use filter::Filter;
pub use memory::{open_backend, MemoryStore};
pub use query::{Cancel, EventStream, QueryExecutor};
pub use store::EventStore;
