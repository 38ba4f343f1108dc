//! Error types for the synchronization core.
//!
//! Three failure classes exist and they are deliberately kept apart:
//! - [`SyncError::InvalidArgument`] for null or wrong-kind arguments
//! - [`SyncError::InvalidRange`] for strict indexed access
//! - silent clamping in the selection setters, which never produces an error

use thiserror::Error;

use crate::types::NodeId;

/// Boxed error returned by a data-request callback.
pub type PopulateError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Index {index} out of range (len {len})")]
    InvalidRange { index: i64, len: usize },

    #[error("Node {0} is disposed or unknown")]
    Disposed(NodeId),

    #[error("Data request for index {index} failed: {source}")]
    Populate {
        index: usize,
        #[source]
        source: PopulateError,
    },

    #[error("Change sink rejected operation: {0}")]
    Sink(String),
}

impl SyncError {
    pub(crate) fn range(index: impl TryInto<i64>, len: usize) -> Self {
        Self::InvalidRange {
            index: index.try_into().unwrap_or(i64::MAX),
            len,
        }
    }

    pub(crate) fn null(what: &str) -> Self {
        Self::InvalidArgument(format!("{} must not be null", what))
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
