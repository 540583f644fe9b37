//! Error types for the Reservation actor.

use crate::error::{Classify, ErrorKind};
use crate::framework::FrameworkError;
use crate::model::{BranchId, ReservationId, ReservationStatus, TableId};
use crate::table_actor::TableError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReservationError {
    #[error("Reservation not found: {0}")]
    NotFound(String),

    #[error("Table {0} does not exist")]
    TableNotFound(TableId),

    #[error("Table {table} seats {capacity}, party of {guests} requested")]
    TableTooSmall { table: TableId, capacity: u32, guests: u32 },

    #[error("No table in {branch} can seat {guests} at the requested time")]
    NoSuitableTable { branch: BranchId, guests: u32 },

    /// The window overlaps a confirmed or seated reservation on the same table.
    #[error("Table {table} is already booked by {with} in an overlapping window")]
    Overlap { table: TableId, with: ReservationId },

    #[error("Cannot {action} reservation {reservation} while {from}")]
    InvalidTransition {
        reservation: ReservationId,
        from: ReservationStatus,
        action: &'static str,
    },

    /// The table actor refused the claim (occupied by a walk-in, blocked, ...).
    #[error("Table {table} is unavailable: {reason}")]
    TableUnavailable { table: TableId, reason: TableError },

    #[error("Reservation validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl Classify for ReservationError {
    fn kind(&self) -> ErrorKind {
        match self {
            ReservationError::NotFound(_) | ReservationError::TableNotFound(_) => ErrorKind::NotFound,
            ReservationError::NoSuitableTable { .. }
            | ReservationError::Overlap { .. }
            | ReservationError::TableUnavailable { .. } => ErrorKind::Conflict,
            ReservationError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            ReservationError::TableTooSmall { .. } | ReservationError::ValidationError(_) => ErrorKind::Validation,
            ReservationError::Table(inner) => inner.kind(),
            ReservationError::ActorCommunicationError(_) => ErrorKind::Unavailable,
        }
    }
}

impl From<FrameworkError<ReservationError>> for ReservationError {
    fn from(e: FrameworkError<ReservationError>) -> Self {
        match e {
            FrameworkError::Entity(inner) => inner,
            FrameworkError::NotFound(id) => ReservationError::NotFound(id),
            other => ReservationError::ActorCommunicationError(other.to_string()),
        }
    }
}
