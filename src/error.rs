//! Unified error hierarchy.
//!
//! [`DbError`] is the single error type the query engine returns to callers,
//! tagged with one of the §7 error kinds ([`ErrorKind`]) and aggregating the
//! HNSW [`GraphError`], the storage adapter's [`StorageError`], and the
//! filter module's `FilterError`. Conditions the engine recovers from locally
//! (storage-transient retries, L1/L2 cache misses, prefetch/statistics
//! failures) never reach this type — they're logged via `log::warn!` at the
//! point of recovery instead.
//!
//! All errors convert to JavaScript objects when used from WASM, with `code`
//! and `message` properties for structured error handling on that side.

use crate::hnsw::GraphError;
use crate::storage::{StorageError, StorageErrorKind};
use std::fmt;
use thiserror::Error;

/// The stable kind code surfaced alongside every [`DbError`], per the
/// propagation policy in the error handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Dimension or range validation failed.
    InvalidInput,
    /// The requested noun/verb/key does not exist.
    NotFound,
    /// The operation would mutate a read-only instance.
    Readonly,
    /// A storage call failed after exhausting its retry budget.
    StorageTransient,
    /// A storage call failed in a way retries cannot fix.
    StoragePermanent,
    /// The backend reports its quota exhausted.
    QuotaExceeded,
    /// The operation was cancelled (e.g. shutdown in progress).
    Cancelled,
    /// An internal invariant was violated; the index refuses further
    /// mutation but unaffected reads remain serviceable.
    InternalConsistency,
}

impl ErrorKind {
    /// The stable string code surfaced to callers (and to WASM).
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid-input",
            Self::NotFound => "not-found",
            Self::Readonly => "readonly",
            Self::StorageTransient => "storage-transient",
            Self::StoragePermanent => "storage-permanent",
            Self::QuotaExceeded => "quota-exceeded",
            Self::Cancelled => "cancelled",
            Self::InternalConsistency => "internal-consistency",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The top-level error type returned by every public `Db` operation.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct DbError {
    /// The stable kind code.
    pub kind: ErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl DbError {
    /// Builds an error of `kind` with `message`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Shorthand for [`ErrorKind::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// Shorthand for [`ErrorKind::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Shorthand for [`ErrorKind::Readonly`].
    pub fn readonly(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Readonly, message)
    }

    /// Shorthand for [`ErrorKind::Cancelled`].
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }
}

impl From<GraphError> for DbError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::DimensionMismatch { .. } => Self::new(ErrorKind::InvalidInput, e.to_string()),
            GraphError::UnknownId(_) => Self::new(ErrorKind::NotFound, e.to_string()),
            GraphError::DuplicateId(_) => Self::new(ErrorKind::InvalidInput, e.to_string()),
            GraphError::InvalidConfig(_) => Self::new(ErrorKind::InvalidInput, e.to_string()),
            GraphError::InternalConsistency(_) => Self::new(ErrorKind::InternalConsistency, e.to_string()),
        }
    }
}

impl From<StorageError> for DbError {
    fn from(e: StorageError) -> Self {
        let kind = match e.kind {
            StorageErrorKind::NotFound => ErrorKind::NotFound,
            StorageErrorKind::Auth | StorageErrorKind::Malformed | StorageErrorKind::BackendSpecific => {
                ErrorKind::StoragePermanent
            }
            StorageErrorKind::QuotaExceeded => ErrorKind::QuotaExceeded,
            StorageErrorKind::Transient => ErrorKind::StorageTransient,
        };
        Self::new(kind, e.message)
    }
}

impl From<crate::filter::FilterError> for DbError {
    fn from(e: crate::filter::FilterError) -> Self {
        Self::new(ErrorKind::InvalidInput, e.to_string())
    }
}

impl From<crate::filter::FilteredSearchError> for DbError {
    fn from(e: crate::filter::FilteredSearchError) -> Self {
        match e {
            crate::filter::FilteredSearchError::Filter(fe) => fe.into(),
            crate::filter::FilteredSearchError::Graph(ge) => ge.into(),
            crate::filter::FilteredSearchError::Storage(se) => se.into(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl From<DbError> for wasm_bindgen::JsValue {
    fn from(e: DbError) -> Self {
        let obj = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&obj, &"code".into(), &e.kind.code().into());
        let _ = js_sys::Reflect::set(&obj, &"message".into(), &e.message.clone().into());
        obj.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_duplicate_id_maps_to_invalid_input() {
        let e: DbError = GraphError::DuplicateId(crate::model::Id("x".to_string())).into();
        assert_eq!(e.kind.code(), "invalid-input");
    }

    #[test]
    fn graph_unknown_id_maps_to_not_found() {
        let e: DbError = GraphError::UnknownId(crate::model::Id("x".to_string())).into();
        assert_eq!(e.kind.code(), "not-found");
    }

    #[test]
    fn storage_transient_maps_through() {
        let e: DbError = StorageError::new(StorageErrorKind::Transient, "timeout").into();
        assert_eq!(e.kind.code(), "storage-transient");
    }

    #[test]
    fn storage_not_found_maps_through() {
        let e: DbError = StorageError::not_found("nouns/x").into();
        assert_eq!(e.kind.code(), "not-found");
    }

    #[test]
    fn quota_exceeded_maps_through() {
        let e: DbError = StorageError::new(StorageErrorKind::QuotaExceeded, "full").into();
        assert_eq!(e.kind.code(), "quota-exceeded");
    }
}
