//! Workflows that span more than one actor.
//!
//! Each step below is atomic inside its own actor. The coordinator runs them in sequence
//! and compensates when a later step fails, so a QR checkout either produces an order that
//! the session knows about, or leaves the cart exactly as it was.

use crate::clients::{ActorClient, LedgerClient, OrderClient, SessionClient};
use crate::error::{Classify, ErrorKind};
use crate::model::{
    ItemStatus, Order, OrderCreate, OrderId, OrderItemId, OrderOrigin, OrderStatus, OrderType, PaymentId, SessionId,
};
use crate::order_actor::{OrderError, PaymentReceipt};
use crate::session_actor::SessionError;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Order(#[from] OrderError),
}

impl Classify for CoordinatorError {
    fn kind(&self) -> ErrorKind {
        match self {
            CoordinatorError::Session(e) => e.kind(),
            CoordinatorError::Order(e) => e.kind(),
        }
    }
}

#[derive(Clone)]
pub struct Coordinator {
    sessions: SessionClient,
    orders: OrderClient,
    ledger: LedgerClient,
}

impl Coordinator {
    pub fn new(sessions: SessionClient, orders: OrderClient, ledger: LedgerClient) -> Self {
        Self {
            sessions,
            orders,
            ledger,
        }
    }

    /// Turns the session's cart into a dine-in order on the session's table.
    ///
    /// Lines added while the checkout is in flight stay in the cart for the next round.
    #[instrument(skip(self, notes))]
    pub async fn checkout(&self, session: SessionId, notes: Option<String>) -> Result<Order, CoordinatorError> {
        let ticket = self.sessions.begin_checkout(session).await?;
        let params = OrderCreate {
            branch_id: ticket.branch_id,
            table_id: Some(ticket.table_id),
            order_type: OrderType::DineIn,
            origin: OrderOrigin::QrSession(session),
            seated_under: None,
            items: ticket.lines.iter().map(|line| line.to_item_input()).collect(),
            notes,
        };

        let order = match self.orders.create_order(params).await {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, "Order creation failed, releasing checkout");
                if let Err(abort) = self.sessions.abort_checkout(session).await {
                    error!(error = %abort, "Could not abort checkout");
                }
                return Err(e.into());
            }
        };

        if let Err(e) = self.sessions.commit_checkout(session, order).await {
            warn!(error = %e, %order, "Checkout commit failed, cancelling order");
            if let Err(cancel) = self.orders.cancel_order(order, "checkout could not be committed").await {
                error!(error = %cancel, %order, "Could not cancel orphaned order");
            }
            return Err(e.into());
        }

        info!(%order, lines = ticket.lines.len(), "Checkout committed");
        Ok(self.orders.fetch(order).await?)
    }

    /// Advances an item. If cancelling it voided the whole order, the session is told.
    #[instrument(skip(self))]
    pub async fn advance_item(
        &self,
        order: OrderId,
        item: OrderItemId,
        status: ItemStatus,
    ) -> Result<OrderStatus, CoordinatorError> {
        let order_status = self.orders.advance_item_status(order, item, status).await?;
        if order_status.is_terminal() {
            self.settle(order).await?;
        }
        Ok(order_status)
    }

    /// SERVED and PAID to COMPLETED, releasing the table and closing the order on its session.
    #[instrument(skip(self))]
    pub async fn complete_order(&self, order: OrderId) -> Result<OrderStatus, CoordinatorError> {
        let status = self.orders.complete_order(order).await?;
        self.settle(order).await?;
        Ok(status)
    }

    #[instrument(skip(self, reason))]
    pub async fn cancel_order(
        &self,
        order: OrderId,
        reason: impl Into<String> + Send,
    ) -> Result<OrderStatus, CoordinatorError> {
        let status = self.orders.cancel_order(order, reason).await?;
        self.settle(order).await?;
        Ok(status)
    }

    /// Refunds against a payment. A full refund of an open order closes it.
    #[instrument(skip(self, reason))]
    pub async fn refund(
        &self,
        order: OrderId,
        amount: Decimal,
        original: PaymentId,
        reason: Option<String>,
    ) -> Result<PaymentReceipt, CoordinatorError> {
        let receipt = self.ledger.refund(order, amount, original, reason).await?;
        if receipt.order_status == OrderStatus::Refunded {
            self.settle(order).await?;
        }
        Ok(receipt)
    }

    /// Tells the originating session, if any, that `order` is closed.
    async fn settle(&self, order: OrderId) -> Result<(), CoordinatorError> {
        let placed = self.orders.fetch(order).await?;
        if let Some(session) = placed.origin.session() {
            let status = self.sessions.order_closed(session, order).await?;
            info!(%session, %order, session_status = %status, "Session notified of closed order");
        }
        Ok(())
    }
}
