use crate::clients::actor_client::ActorClient;
use crate::clients::order_client::{order_action, unexpected};
use crate::framework::{FrameworkError, ResourceClient};
use crate::model::{Order, OrderId, Payment, PaymentId, PaymentMethod};
use crate::order_actor::{OrderAction, OrderActionResult, OrderError, PaymentReceipt};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

/// Client for the Payment Ledger.
///
/// The ledger lives inside the Order actor so every payment is checked against the
/// order total it belongs to; this client only exposes the money operations.
#[derive(Clone)]
pub struct LedgerClient {
    inner: ResourceClient<Order>,
}

impl LedgerClient {
    pub fn new(inner: ResourceClient<Order>) -> Self {
        Self { inner }
    }

    /// Records a successful payment. An amount that would overpay is rejected whole.
    #[instrument(skip(self, reference))]
    pub async fn apply_payment(
        &self,
        order: OrderId,
        amount: Decimal,
        method: PaymentMethod,
        reference: Option<String>,
    ) -> Result<PaymentReceipt, OrderError> {
        info!("Sending apply_payment to actor");
        order_action!(self, order, OrderAction::ApplyPayment { amount, method, reference }, ApplyPayment)
    }

    #[instrument(skip(self, reason))]
    pub async fn record_failed_payment(
        &self,
        order: OrderId,
        amount: Decimal,
        method: PaymentMethod,
        reason: impl Into<String> + Send,
    ) -> Result<PaymentReceipt, OrderError> {
        let reason = reason.into();
        warn!(%reason, "Recording failed payment attempt");
        order_action!(
            self,
            order,
            OrderAction::RecordFailedPayment { amount, method, reason },
            RecordFailedPayment
        )
    }

    #[instrument(skip(self, reason))]
    pub async fn refund(
        &self,
        order: OrderId,
        amount: Decimal,
        original: PaymentId,
        reason: Option<String>,
    ) -> Result<PaymentReceipt, OrderError> {
        order_action!(self, order, OrderAction::Refund { amount, original, reason }, Refund)
    }

    /// The full ledger of an order, in the order entries were written.
    #[instrument(skip(self))]
    pub async fn payments(&self, order: OrderId) -> Result<Vec<Payment>, OrderError> {
        Ok(self.fetch(order).await?.payments)
    }
}

#[async_trait]
impl ActorClient<Order> for LedgerClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError<OrderError>) -> Self::Error {
        OrderError::from(e)
    }
}
