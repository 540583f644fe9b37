//! Custom actions for the Reservation actor.

use crate::model::{ReservationStatus, TableId};
use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug, Clone)]
pub enum ReservationAction {
    /// PENDING -> CONFIRMED. Unassigned reservations get a table here.
    Confirm,
    Cancel,
    MarkNoShow,
    /// The party arrived: claim the table and go SEATED.
    Seat,
    /// The party left: SEATED -> COMPLETED, table to CLEANING.
    Complete,
    /// Put the table on hold if `now` is within `lead_time` of the reservation start.
    Activate { now: DateTime<Utc>, lead_time: TimeDelta },
}

/// Results from ReservationActions - variants match 1:1 with ReservationAction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationActionResult {
    Confirm(ReservationStatus),
    Cancel(ReservationStatus),
    MarkNoShow(ReservationStatus),
    Seat(TableId),
    Complete(ReservationStatus),
    /// `true` if the table was put on hold by this call.
    Activate(bool),
}
