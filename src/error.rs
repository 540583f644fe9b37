//! # Error Taxonomy
//!
//! Every actor defines its own error enum (`TableError`, `SessionError`, ...), but callers
//! at the edge of the system (an HTTP layer, a CLI) need a single, lossless classification
//! to decide what to do with a failure. [`ErrorKind`] is that classification and
//! [`Classify`] is implemented by every domain error.
//!
//! | Kind | Meaning | Typical caller reaction |
//! |------|---------|-------------------------|
//! | `Conflict` | resource already claimed, overlapping window | refresh and retry, or show "unavailable" |
//! | `InvalidTransition` | state change not allowed from current state | client bug, never retried |
//! | `Overpayment` / `Underpayment` | financial integrity violation | reject, never clamp |
//! | `NotFound` | unknown entity | 404 |
//! | `ExpiredResource` | entity is terminal (expired, abandoned, closed) | start a new one |
//! | `Validation` | malformed input that slipped past the API layer | 422 |
//! | `Unavailable` | an actor is gone (shutdown in progress) | retry later |

use serde::Serialize;
use std::fmt;

/// Coarse classification of a domain error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Conflict,
    InvalidTransition,
    Overpayment,
    Underpayment,
    NotFound,
    ExpiredResource,
    Validation,
    Unavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::InvalidTransition => "INVALID_TRANSITION",
            ErrorKind::Overpayment => "OVERPAYMENT",
            ErrorKind::Underpayment => "UNDERPAYMENT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::ExpiredResource => "EXPIRED_RESOURCE",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Unavailable => "UNAVAILABLE",
        }
    }

    /// Whether the caller may retry the same command against fresh state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Conflict | ErrorKind::Unavailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by every domain error so the edge can map failures without string matching.
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}
