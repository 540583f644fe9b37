//! Custom actions for the QR Session actor.

use crate::model::{CartLine, CheckoutTicket, ItemInput, OrderId, SessionStatus};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub enum SessionAction {
    AddToCart(ItemInput),
    RemoveFromCart { line_id: u32 },
    /// Setting the quantity to zero removes the line.
    UpdateQuantity { line_id: u32, quantity: u32 },
    /// Guest activity without a cart change (page view, menu browse).
    Touch,
    /// Snapshot the cart for order creation. The lines stay in the cart until commit.
    BeginCheckout,
    /// The order was created: drop the snapshotted lines and track the order.
    CommitCheckout(OrderId),
    /// Order creation failed: keep the cart as it was.
    AbortCheckout,
    /// An order of this session reached a terminal status.
    OrderClosed(OrderId),
    /// The guest or staff ends the session.
    End,
    /// Expire if the session is still idle since `observed_activity` and past its expiry at `now`.
    Expire {
        observed_activity: DateTime<Utc>,
        now: DateTime<Utc>,
    },
}

/// Results from SessionActions - variants match 1:1 with SessionAction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionActionResult {
    AddToCart(CartLine),
    RemoveFromCart(()),
    UpdateQuantity(Option<CartLine>),
    Touch(DateTime<Utc>),
    BeginCheckout(CheckoutTicket),
    CommitCheckout(()),
    AbortCheckout(()),
    OrderClosed(SessionStatus),
    End(SessionStatus),
    /// `true` if the session expired, `false` if it was found active or busy.
    Expire(bool),
}
