//! Custom actions for the Order actor.
//!
//! Kitchen-side actions (`AddItems`, `AdvanceItem`, `Confirm`, `Complete`, `Cancel`) and
//! ledger actions (`ApplyPayment`, `RecordFailedPayment`, `Refund`) go through the same actor,
//! so payment checks always see the order total they are checked against.

use crate::model::{ItemInput, ItemStatus, OrderItemId, OrderStatus, Payment, PaymentId, PaymentMethod, PaymentStatus, Totals};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Append items. Only while the order is PENDING or CONFIRMED.
    AddItems(Vec<ItemInput>),
    AdvanceItem { item: OrderItemId, status: ItemStatus },
    /// Kitchen acknowledgment: PENDING -> CONFIRMED.
    Confirm,
    /// SERVED and PAID -> COMPLETED.
    Complete,
    Cancel { reason: String },
    ApplyDiscount(Decimal),
    RecomputeTotals,
    ApplyPayment {
        amount: Decimal,
        method: PaymentMethod,
        reference: Option<String>,
    },
    RecordFailedPayment {
        amount: Decimal,
        method: PaymentMethod,
        reason: String,
    },
    Refund {
        amount: Decimal,
        original: PaymentId,
        reason: Option<String>,
    },
}

/// The ledger entry just written and where the order stands afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub total: Decimal,
    pub paid: Decimal,
    pub refunded: Decimal,
}

/// Results from OrderActions - variants match 1:1 with OrderAction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderActionResult {
    AddItems(Vec<OrderItemId>),
    AdvanceItem(OrderStatus),
    Confirm(OrderStatus),
    Complete(OrderStatus),
    Cancel(OrderStatus),
    ApplyDiscount(Totals),
    RecomputeTotals(Totals),
    ApplyPayment(PaymentReceipt),
    RecordFailedPayment(PaymentReceipt),
    Refund(PaymentReceipt),
}
