//! Error types for the QR Session actor.

use crate::error::{Classify, ErrorKind};
use crate::framework::FrameworkError;
use crate::model::{SessionId, SessionStatus, TableId};
use crate::table_actor::TableError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    /// The table could not be claimed for a new session.
    #[error("Table {table} is unavailable: {reason}")]
    TableUnavailable { table: TableId, reason: TableError },

    /// Terminal sessions accept no further commands.
    #[error("Session {session} is {status}")]
    NotActive { session: SessionId, status: SessionStatus },

    #[error("Cart of {0} is empty")]
    EmptyCart(SessionId),

    #[error("A checkout is already in progress for {0}")]
    CheckoutInFlight(SessionId),

    #[error("No checkout is in progress for {0}")]
    NoCheckoutInFlight(SessionId),

    #[error("Cart line {line} not found in {session}")]
    LineNotFound { session: SessionId, line: u32 },

    /// Ending a session that never ordered needs an empty cart to count as ABANDONED.
    #[error("{session} never ordered but still has {lines} cart line(s)")]
    CartNotEmpty { session: SessionId, lines: usize },

    #[error("{session} still has {open} open order(s)")]
    OpenOrders { session: SessionId, open: usize },

    #[error("Session validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl Classify for SessionError {
    fn kind(&self) -> ErrorKind {
        match self {
            SessionError::NotFound(_) | SessionError::LineNotFound { .. } => ErrorKind::NotFound,
            SessionError::TableUnavailable { .. } | SessionError::CheckoutInFlight(_) => ErrorKind::Conflict,
            SessionError::NotActive { .. } => ErrorKind::ExpiredResource,
            SessionError::NoCheckoutInFlight(_)
            | SessionError::OpenOrders { .. }
            | SessionError::CartNotEmpty { .. } => ErrorKind::InvalidTransition,
            SessionError::EmptyCart(_) | SessionError::ValidationError(_) => ErrorKind::Validation,
            SessionError::Table(inner) => inner.kind(),
            SessionError::ActorCommunicationError(_) => ErrorKind::Unavailable,
        }
    }
}

impl From<FrameworkError<SessionError>> for SessionError {
    fn from(e: FrameworkError<SessionError>) -> Self {
        match e {
            FrameworkError::Entity(inner) => inner,
            FrameworkError::NotFound(id) => SessionError::NotFound(id),
            other => SessionError::ActorCommunicationError(other.to_string()),
        }
    }
}
