use super::{BranchId, TableId};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub u32);

impl From<u32> for ReservationId {
    fn from(id: u32) -> Self {
        ReservationId(id)
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reservation_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Seated,
    Completed,
    Cancelled,
    NoShow,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Seated => "SEATED",
            ReservationStatus::Completed => "COMPLETED",
            ReservationStatus::Cancelled => "CANCELLED",
            ReservationStatus::NoShow => "NO_SHOW",
        }
    }

    /// Confirmed and seated reservations own their table for their whole window.
    pub fn blocks_table(&self) -> bool {
        matches!(self, ReservationStatus::Confirmed | ReservationStatus::Seated)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Completed | ReservationStatus::Cancelled | ReservationStatus::NoShow
        )
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub branch_id: BranchId,
    /// Assigned table. Unassigned reservations get one from `candidates` on confirmation.
    pub table_id: Option<TableId>,
    /// Tables that fit the party, tightest first. Only used while unassigned.
    pub candidates: Vec<TableId>,
    pub customer_name: String,
    pub customer_phone: String,
    pub guest_count: u32,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub status: ReservationStatus,
    pub notes: Option<String>,
    /// The table is in RESERVED state on behalf of this reservation.
    pub held: bool,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at + TimeDelta::minutes(i64::from(self.duration_minutes))
    }

    /// Half-open windows `[start, end)` overlap.
    pub fn overlaps(&self, other: &Reservation) -> bool {
        self.starts_at < other.ends_at() && other.starts_at < self.ends_at()
    }

    /// Whether `other` makes `table` unusable for this reservation.
    pub fn collides_on(&self, table: TableId, other: &Reservation) -> bool {
        other.status.blocks_table() && other.table_id == Some(table) && self.overlaps(other)
    }
}

#[derive(Debug, Clone)]
pub struct ReservationCreate {
    pub branch_id: BranchId,
    pub table_id: Option<TableId>,
    pub customer_name: String,
    pub customer_phone: String,
    pub guest_count: u32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: u32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReservationUpdate {
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}
