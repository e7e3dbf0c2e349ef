//! Error taxonomy shared by every storage operation.
//!
//! Each layer defines its own `thiserror` enum; they all classify into one of
//! these kinds so callers can decide how to surface a failure.

use serde::Serialize;

/// Classification of a failed storage operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or empty input.
    Validation,
    /// Object or message absent.
    NotFound,
    /// Transport failure, unexpected fault, or assembly failure.
    Internal,
    /// Operation exists in the task model but has no handler yet.
    NotImplemented,
    /// The task was dropped before the worker picked it up.
    Cancelled,
}

impl ErrorKind {
    /// Returns the process exit status for this kind (BSD `sysexits` values).
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Validation => 65,
            Self::NotFound => 66,
            Self::NotImplemented => 69,
            Self::Internal => 70,
            Self::Cancelled => 75,
        }
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn error_code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Internal => "INTERNAL_ERROR",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.error_code())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
