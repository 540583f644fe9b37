//! Order status derivation.
//!
//! An order's kitchen status is never set directly; it is derived from its active
//! (non-cancelled) items, so the order can only be as far along as its slowest item.

use crate::model::{ItemStatus, OrderItem, OrderStatus};

/// Whether an item may move from `from` to `to`.
///
/// Forward moves along the kitchen path are allowed, skipping steps included. Any
/// non-terminal item may be cancelled. Everything else is a regression.
pub fn item_transition_allowed(from: ItemStatus, to: ItemStatus) -> bool {
    if from.is_terminal() {
        return false;
    }
    match (from.rank(), to.rank()) {
        (_, None) => true,
        (Some(from), Some(to)) => to > from,
        (None, Some(_)) => false,
    }
}

/// Derives the non-terminal order status from its items.
pub fn derive_order_status(items: &[OrderItem], confirmed: bool) -> OrderStatus {
    let slowest = items
        .iter()
        .filter(|item| item.is_active())
        .filter_map(|item| item.status.rank())
        .min();

    match slowest {
        Some(1) => OrderStatus::Preparing,
        Some(2) => OrderStatus::Ready,
        Some(3) => OrderStatus::Served,
        _ if confirmed => OrderStatus::Confirmed,
        _ => OrderStatus::Pending,
    }
}
