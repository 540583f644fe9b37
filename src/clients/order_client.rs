use crate::clients::actor_client::ActorClient;
use crate::framework::{Filter, FrameworkError, ResourceClient};
use crate::model::{
    ItemInput, ItemStatus, Order, OrderCreate, OrderId, OrderItemId, OrderStatus, OrderUpdate, TableId, Totals,
};
use crate::order_actor::{OrderAction, OrderActionResult, OrderError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

/// Client for the kitchen side of the Order actor.
///
/// Table claims happen in the Order actor's `on_create` hook, so `create_order` either
/// returns an order that holds (or rides on) its table, or fails without side effects.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

pub(crate) fn unexpected(result: OrderActionResult) -> OrderError {
    OrderError::ActorCommunicationError(format!("unexpected action result: {result:?}"))
}

macro_rules! order_action {
    ($client:expr, $id:expr, $action:expr, $variant:ident) => {
        match $client.inner.perform_action($id, $action).await {
            Ok(OrderActionResult::$variant(value)) => Ok(value),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    };
}
pub(crate) use order_action;

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self, order), fields(items = order.items.len(), table = ?order.table_id))]
    pub async fn create_order(&self, order: OrderCreate) -> Result<OrderId, OrderError> {
        info!("Sending create_order to actor");
        self.inner.create(order).await.map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn update_order(&self, id: OrderId, update: OrderUpdate) -> Result<Order, OrderError> {
        self.inner.update(id, update).await.map_err(Self::map_error)
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn add_items(&self, id: OrderId, items: Vec<ItemInput>) -> Result<Vec<OrderItemId>, OrderError> {
        order_action!(self, id, OrderAction::AddItems(items), AddItems)
    }

    /// Moves one item forward (or cancels it) and returns the order's derived status.
    #[instrument(skip(self))]
    pub async fn advance_item_status(
        &self,
        id: OrderId,
        item: OrderItemId,
        status: ItemStatus,
    ) -> Result<OrderStatus, OrderError> {
        debug!("Sending advance_item_status to actor");
        order_action!(self, id, OrderAction::AdvanceItem { item, status }, AdvanceItem)
    }

    #[instrument(skip(self))]
    pub async fn confirm_order(&self, id: OrderId) -> Result<OrderStatus, OrderError> {
        order_action!(self, id, OrderAction::Confirm, Confirm)
    }

    #[instrument(skip(self))]
    pub async fn complete_order(&self, id: OrderId) -> Result<OrderStatus, OrderError> {
        order_action!(self, id, OrderAction::Complete, Complete)
    }

    #[instrument(skip(self, reason))]
    pub async fn cancel_order(&self, id: OrderId, reason: impl Into<String> + Send) -> Result<OrderStatus, OrderError> {
        order_action!(self, id, OrderAction::Cancel { reason: reason.into() }, Cancel)
    }

    #[instrument(skip(self))]
    pub async fn apply_discount(&self, id: OrderId, discount: Decimal) -> Result<Totals, OrderError> {
        order_action!(self, id, OrderAction::ApplyDiscount(discount), ApplyDiscount)
    }

    #[instrument(skip(self))]
    pub async fn recompute_totals(&self, id: OrderId) -> Result<Totals, OrderError> {
        order_action!(self, id, OrderAction::RecomputeTotals, RecomputeTotals)
    }

    /// Orders placed on a table, oldest first.
    #[instrument(skip(self))]
    pub async fn list_for_table(&self, table: TableId) -> Result<Vec<Order>, OrderError> {
        self.inner
            .list(Filter::new(move |o: &Order| o.table_id == Some(table)))
            .await
            .map_err(Self::map_error)
    }

    /// Orders that are not yet completed, cancelled or refunded.
    #[instrument(skip(self))]
    pub async fn list_open(&self) -> Result<Vec<Order>, OrderError> {
        self.inner
            .list(Filter::new(|o: &Order| !o.status.is_terminal()))
            .await
            .map_err(Self::map_error)
    }
}

#[async_trait]
impl ActorClient<Order> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError<OrderError>) -> Self::Error {
        OrderError::from(e)
    }
}
