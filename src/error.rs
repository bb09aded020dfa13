//! Error taxonomy shared by every backend.
//!
//! Duplicate inserts and deletes of unknown ids are defined no-ops and never
//! surface here. Eviction cannot fail.

use thiserror::Error;

/// The backend could not be prepared.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    /// Settings rejected before any state was created.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// `init` was called on a backend that is already open.
    #[error("backend is already open")]
    AlreadyOpen,

    /// No backend is registered under this name.
    #[error("unknown backend: {0}")]
    UnknownBackend(String),
}

/// A write, delete or replace could not be applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend was never opened or has been closed.
    #[error("store is closed")]
    Closed,

    /// The underlying resource rejected the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A query could not be executed by this backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The backend was never opened or has been closed.
    #[error("store is closed")]
    Closed,

    /// The filter uses a dimension this backend cannot evaluate.
    #[error("unsupported filter: {0}")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_kind() {
        let err = InitError::InvalidConfig("max_size must be positive".into());
        assert!(err.to_string().contains("invalid config"));
        assert!(err.to_string().contains("max_size"));

        assert_eq!(StoreError::Closed.to_string(), "store is closed");
        let err = QueryError::Unsupported("search".into());
        assert!(err.to_string().contains("unsupported filter"));
    }

    #[test]
    fn errors_convert_into_anyhow() {
        let err: anyhow::Error = StoreError::Unavailable("disk gone".into()).into();
        assert!(err.to_string().contains("disk gone"));
        assert!(err.downcast_ref::<StoreError>().is_some());
    }
}
