use super::{OrderId, ReservationId, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableId(pub u32);

impl From<u32> for TableId {
    fn from(id: u32) -> Self {
        TableId(id)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BranchId(pub u32);

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "branch_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
    Cleaning,
    Blocked,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Available => "AVAILABLE",
            TableStatus::Occupied => "OCCUPIED",
            TableStatus::Reserved => "RESERVED",
            TableStatus::Cleaning => "CLEANING",
            TableStatus::Blocked => "BLOCKED",
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whoever currently holds a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Claimant {
    Session(SessionId),
    Order(OrderId),
    Reservation(ReservationId),
}

impl fmt::Display for Claimant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Claimant::Session(id) => id.fmt(f),
            Claimant::Order(id) => id.fmt(f),
            Claimant::Reservation(id) => id.fmt(f),
        }
    }
}

/// The ways a table can be claimed. Each maps to exactly one legal source state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimRequest {
    /// A guest scanned the table QR. AVAILABLE -> OCCUPIED.
    Session(SessionId),
    /// A confirmed reservation entered its lead time. AVAILABLE -> RESERVED.
    Hold(ReservationId),
    /// A reservation party arrived. AVAILABLE, or RESERVED by the same reservation -> OCCUPIED.
    Seat(ReservationId),
    /// An order for the table. With `under`, it rides on the existing holder's claim and the
    /// table must already be OCCUPIED by that holder. Without, AVAILABLE -> OCCUPIED.
    Order {
        order: OrderId,
        under: Option<Claimant>,
    },
}

impl ClaimRequest {
    pub fn claimant(&self) -> Claimant {
        match self {
            ClaimRequest::Session(id) => Claimant::Session(*id),
            ClaimRequest::Hold(id) | ClaimRequest::Seat(id) => Claimant::Reservation(*id),
            ClaimRequest::Order { order, .. } => Claimant::Order(*order),
        }
    }
}

/// Status and holder remembered while a table is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedState {
    pub status: TableStatus,
    pub holder: Option<Claimant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub number: String,
    pub branch_id: BranchId,
    pub capacity: u32,
    pub location: Option<String>,
    pub status: TableStatus,
    pub holder: Option<Claimant>,
    /// Orders riding on the holder's claim. The holder cannot release while any remain.
    pub riders: BTreeSet<OrderId>,
    pub qr_active: bool,
    pub retired: bool,
    pub blocked: Option<BlockedState>,
}

#[derive(Debug, Clone)]
pub struct TableCreate {
    pub number: String,
    pub branch_id: BranchId,
    pub capacity: u32,
    pub location: Option<String>,
    pub qr_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TableUpdate {
    pub number: Option<String>,
    pub capacity: Option<u32>,
    pub location: Option<String>,
}
