//! Error types for the Table actor.

use crate::error::{Classify, ErrorKind};
use crate::framework::FrameworkError;
use crate::model::{Claimant, OrderId, TableId, TableStatus};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("Table not found: {0}")]
    NotFound(String),

    /// Someone else holds the table, or it is not in a claimable state.
    #[error("Table {table} is {status}{}", held_by(.holder))]
    Conflict {
        table: TableId,
        status: TableStatus,
        holder: Option<Claimant>,
    },

    /// The holder tried to leave while orders placed under its claim are still open.
    #[error("Table {table} still serves {} open order(s) under {holder}", .riders.len())]
    RidersOpen {
        table: TableId,
        holder: Claimant,
        riders: Vec<OrderId>,
    },

    #[error("QR ordering is disabled for {0}")]
    QrDisabled(TableId),

    #[error("Table {0} is retired")]
    Retired(TableId),

    #[error("Cannot {action} table {table} while {from}")]
    InvalidTransition {
        table: TableId,
        from: TableStatus,
        action: &'static str,
    },

    #[error("Table validation error: {0}")]
    ValidationError(String),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

fn held_by(holder: &Option<Claimant>) -> String {
    match holder {
        Some(h) => format!(" (held by {h})"),
        None => String::new(),
    }
}

impl Classify for TableError {
    fn kind(&self) -> ErrorKind {
        match self {
            TableError::NotFound(_) => ErrorKind::NotFound,
            TableError::Conflict { .. } | TableError::RidersOpen { .. } | TableError::QrDisabled(_) => {
                ErrorKind::Conflict
            }
            TableError::Retired(_) => ErrorKind::ExpiredResource,
            TableError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            TableError::ValidationError(_) => ErrorKind::Validation,
            TableError::ActorCommunicationError(_) => ErrorKind::Unavailable,
        }
    }
}

impl From<FrameworkError<TableError>> for TableError {
    fn from(e: FrameworkError<TableError>) -> Self {
        match e {
            FrameworkError::Entity(inner) => inner,
            FrameworkError::NotFound(id) => TableError::NotFound(id),
            other => TableError::ActorCommunicationError(other.to_string()),
        }
    }
}
