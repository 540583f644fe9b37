//! Error types for the Order actor.

use crate::error::{Classify, ErrorKind};
use crate::framework::FrameworkError;
use crate::model::{ItemStatus, OrderId, OrderItemId, OrderStatus, PaymentId, PaymentStatus, TableId};
use crate::table_actor::TableError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during order and payment operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    /// The requested order was not found.
    #[error("Order not found: {0}")]
    NotFound(String),

    /// The order data provided is invalid.
    #[error("Order validation error: {0}")]
    ValidationError(String),

    /// COMPLETED, CANCELLED and REFUNDED orders are immutable.
    #[error("Order {order} is {status} and can no longer change")]
    Closed { order: OrderId, status: OrderStatus },

    #[error("Cannot {action} order {order} while {from}")]
    InvalidTransition {
        order: OrderId,
        from: OrderStatus,
        action: &'static str,
    },

    #[error("Item {item} not found in {order}")]
    ItemNotFound { order: OrderId, item: OrderItemId },

    /// Items only move forward along PENDING -> PREPARING -> READY -> SERVED.
    #[error("Item {item} cannot move from {from} to {to}")]
    ItemRegression { item: OrderItemId, from: ItemStatus, to: ItemStatus },

    #[error("Table {table} is unavailable: {reason}")]
    TableUnavailable { table: TableId, reason: TableError },

    #[error("Payment of {attempted} exceeds outstanding {outstanding} on {order}")]
    Overpayment {
        order: OrderId,
        attempted: Decimal,
        outstanding: Decimal,
    },

    #[error("Order {order} has {outstanding} outstanding")]
    Underpayment { order: OrderId, outstanding: Decimal },

    /// A change would leave more money collected than the order is worth.
    #[error("Order {order} would total {total} with {paid} already paid")]
    PaidExceedsTotal { order: OrderId, paid: Decimal, total: Decimal },

    #[error("Order {order} has {paid} paid; refund before cancelling")]
    HasPayments { order: OrderId, paid: Decimal },

    #[error("Order {order} is {payment_status}; only PAID orders can be refunded")]
    NotRefundable { order: OrderId, payment_status: PaymentStatus },

    #[error("Payment {payment} not found in {order}")]
    PaymentNotFound { order: OrderId, payment: PaymentId },

    #[error("Refund of {requested} exceeds refundable {refundable} on {payment}")]
    RefundExceedsPayment {
        payment: PaymentId,
        requested: Decimal,
        refundable: Decimal,
    },

    #[error("Discount {discount} exceeds order value {limit}")]
    InvalidDiscount { discount: Decimal, limit: Decimal },

    #[error(transparent)]
    Table(#[from] TableError),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl Classify for OrderError {
    fn kind(&self) -> ErrorKind {
        match self {
            OrderError::NotFound(_) | OrderError::ItemNotFound { .. } | OrderError::PaymentNotFound { .. } => {
                ErrorKind::NotFound
            }
            OrderError::ValidationError(_) | OrderError::InvalidDiscount { .. } => ErrorKind::Validation,
            OrderError::Closed { .. } => ErrorKind::ExpiredResource,
            OrderError::InvalidTransition { .. }
            | OrderError::ItemRegression { .. }
            | OrderError::HasPayments { .. }
            | OrderError::NotRefundable { .. } => ErrorKind::InvalidTransition,
            OrderError::TableUnavailable { .. } => ErrorKind::Conflict,
            OrderError::Overpayment { .. }
            | OrderError::PaidExceedsTotal { .. }
            | OrderError::RefundExceedsPayment { .. } => ErrorKind::Overpayment,
            OrderError::Underpayment { .. } => ErrorKind::Underpayment,
            OrderError::Table(inner) => inner.kind(),
            OrderError::ActorCommunicationError(_) => ErrorKind::Unavailable,
        }
    }
}

impl From<FrameworkError<OrderError>> for OrderError {
    fn from(e: FrameworkError<OrderError>) -> Self {
        match e {
            FrameworkError::Entity(inner) => inner,
            FrameworkError::NotFound(id) => OrderError::NotFound(id),
            other => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}
