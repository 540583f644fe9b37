use super::{BranchId, ItemInput, MenuItemId, OrderId, TableId};
use crate::money::round_money;
use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u32);

impl From<u32> for SessionId {
    fn from(id: u32) -> Self {
        SessionId(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Completed,
    Expired,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "ACTIVE",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Expired => "EXPIRED",
            SessionStatus::Abandoned => "ABANDONED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub line_id: u32,
    pub menu_item: MenuItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub notes: Option<String>,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        round_money(self.unit_price * Decimal::from(self.quantity))
    }

    pub fn to_item_input(&self) -> ItemInput {
        ItemInput {
            menu_item: self.menu_item,
            name: self.name.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
            notes: self.notes.clone(),
        }
    }
}

/// Lines reserved for an order that is being created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCheckout {
    pub line_ids: Vec<u32>,
    pub started_at: DateTime<Utc>,
}

/// What the checkout coordinator needs to build an order from a session cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutTicket {
    pub session_id: SessionId,
    pub table_id: TableId,
    pub branch_id: BranchId,
    pub lines: Vec<CartLine>,
}

/// A guest's dine-in visit started by scanning a table QR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrSession {
    pub id: SessionId,
    pub token: String,
    pub table_id: TableId,
    pub branch_id: BranchId,
    pub status: SessionStatus,
    pub guest_count: u32,
    pub customer_name: Option<String>,
    pub device_info: Option<String>,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub idle_timeout: TimeDelta,
    pub cart: Vec<CartLine>,
    pub next_line_id: u32,
    pub orders: Vec<OrderId>,
    pub open_orders: BTreeSet<OrderId>,
    pub checkout: Option<PendingCheckout>,
}

impl QrSession {
    pub fn cart_total(&self) -> Decimal {
        round_money(self.cart.iter().map(CartLine::line_total).sum())
    }

    /// Idle past its expiry and nothing pending that would make expiry lose data.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == SessionStatus::Active
            && now > self.expires_at
            && self.checkout.is_none()
            && self.open_orders.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SessionCreate {
    pub table_id: TableId,
    pub guest_count: u32,
    pub customer_name: Option<String>,
    pub device_info: Option<String>,
    pub idle_timeout: TimeDelta,
}

#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub customer_name: Option<String>,
    pub guest_count: Option<u32>,
}
