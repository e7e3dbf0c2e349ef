//! Storage error types.

use cordstore_shared::ErrorKind;
use thiserror::Error;

use crate::channel::ChannelError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias using `StorageError`.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Malformed or empty input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Object or message absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport failure, unexpected fault, or assembly failure.
    #[error("internal error: {message}")]
    Internal {
        /// What failed.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
    },

    /// Several independent operations failed; every cause is kept.
    #[error("internal error: {message} ({} failures)", .errors.len())]
    Aggregate {
        /// What failed as a whole.
        message: String,
        /// Every underlying failure.
        errors: Vec<StorageError>,
    },

    /// Deleting an object's messages stopped on a hard failure.
    #[error("deletion failed (partially deleted: {partially_deleted}): {source}")]
    Deletion {
        /// The failure that stopped the deletion.
        source: Box<StorageError>,
        /// Whether some messages of the object were already gone when it stopped.
        partially_deleted: bool,
    },

    /// Operation exists in the task model but has no handler yet.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// The task was dropped before the worker processed it.
    #[error("cancelled: {0}")]
    Cancelled(String),
}

impl StorageError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an internal error without a cause.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            source: None,
        }
    }

    /// Create an internal error caused by `err`.
    #[must_use]
    pub fn internal_caused_by(msg: impl Into<String>, err: impl Into<BoxError>) -> Self {
        Self::Internal {
            message: msg.into(),
            source: Some(err.into()),
        }
    }

    /// Combine several failures into one.
    #[must_use]
    pub fn aggregate(msg: impl Into<String>, errors: Vec<StorageError>) -> Self {
        Self::Aggregate {
            message: msg.into(),
            errors,
        }
    }

    /// Wrap a failure that stopped a deletion.
    #[must_use]
    pub fn deletion(source: StorageError, partially_deleted: bool) -> Self {
        Self::Deletion {
            source: Box::new(source),
            partially_deleted,
        }
    }

    /// Wrap a channel failure, keeping the not-found class.
    #[must_use]
    pub fn from_channel(msg: impl Into<String>, err: ChannelError) -> Self {
        let msg = msg.into();
        if err.is_not_found() {
            Self::NotFound(format!("{msg}: {err}"))
        } else {
            Self::internal_caused_by(msg, err)
        }
    }

    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Internal { .. } | Self::Aggregate { .. } => ErrorKind::Internal,
            Self::Deletion { source, .. } => source.kind(),
            Self::NotImplemented(_) => ErrorKind::NotImplemented,
            Self::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    /// Whether a failed deletion left some of the object's messages deleted.
    #[must_use]
    pub fn partially_deleted(&self) -> bool {
        matches!(
            self,
            Self::Deletion {
                partially_deleted: true,
                ..
            }
        )
    }

    /// Underlying failures of an aggregate, empty for any other error.
    #[must_use]
    pub fn causes(&self) -> &[StorageError] {
        match self {
            Self::Aggregate { errors, .. } => errors,
            _ => &[],
        }
    }

    /// Every leaf failure, flattening nested aggregates.
    #[must_use]
    pub fn leaves(&self) -> Vec<&StorageError> {
        match self {
            Self::Aggregate { errors, .. } => errors.iter().flat_map(Self::leaves).collect(),
            other => vec![other],
        }
    }
}
