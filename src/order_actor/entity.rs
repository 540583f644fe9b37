use super::actions::{OrderAction, OrderActionResult, PaymentReceipt};
use super::error::OrderError;
use super::ledger;
use super::status::{derive_order_status, item_transition_allowed};
use super::OrderContext;
use crate::clients::TableClient;
use crate::framework::{ActorEntity, EntityKind, StateChange};
use crate::model::{
    ClaimRequest, Claimant, ItemInput, ItemStatus, Order, OrderCreate, OrderId, OrderItem, OrderItemId, OrderOrigin,
    OrderStatus, OrderType, OrderUpdate, Payment, PaymentStatus, Totals,
};
use crate::money::{is_valid_amount, money_exceeds, round_money};
use crate::pricing::{ChargePolicy, Charges};
use crate::table_actor::TableError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// `ORD-YYYYMMDD-NNNNN`, unique because the sequence is the order id.
pub fn order_number(id: OrderId, at: DateTime<Utc>) -> String {
    format!("ORD-{}-{:05}", at.format("%Y%m%d"), id.0)
}

fn validate_items(items: &[ItemInput]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::ValidationError("an order needs at least one item".into()));
    }
    for item in items {
        if item.quantity == 0 {
            return Err(OrderError::ValidationError(format!("quantity of {} must be at least 1", item.name)));
        }
        if !is_valid_amount(item.unit_price) {
            return Err(OrderError::ValidationError(format!(
                "invalid unit price {} for {}",
                item.unit_price, item.name
            )));
        }
    }
    Ok(())
}

impl Order {
    fn ensure_open(&self) -> Result<(), OrderError> {
        if self.status.is_terminal() {
            return Err(OrderError::Closed {
                order: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> OrderError {
        OrderError::InvalidTransition {
            order: self.id,
            from: self.status,
            action,
        }
    }

    fn push_items(&mut self, items: Vec<ItemInput>) -> Vec<OrderItemId> {
        items
            .into_iter()
            .map(|input| {
                let id = OrderItemId(self.next_item_id);
                self.next_item_id += 1;
                self.items.push(OrderItem::from_input(id, input));
                id
            })
            .collect()
    }

    /// Recomputes every total from the items. Running it twice gives the same result.
    pub fn recompute_totals(&mut self, pricing: &dyn ChargePolicy) -> Result<Totals, OrderError> {
        let subtotal = round_money(
            self.items
                .iter()
                .filter(|item| item.is_active())
                .map(|item| item.total_price)
                .sum(),
        );
        let Charges { tax, service_charge } = pricing.compute_charges(subtotal, self.branch_id);
        let (tax, service_charge) = (round_money(tax), round_money(service_charge));
        let before_discount = round_money(subtotal + tax + service_charge);
        let discount = self.totals.discount;
        if money_exceeds(discount, before_discount) {
            return Err(OrderError::InvalidDiscount {
                discount,
                limit: before_discount,
            });
        }

        self.totals = Totals {
            subtotal,
            tax,
            service_charge,
            discount,
            total: round_money(before_discount - discount),
        };
        self.payment_status = ledger::derive_payment_status(&self.payments, self.totals.total);
        Ok(self.totals)
    }

    fn refresh_status(&mut self) {
        if !self.status.is_terminal() {
            self.status = derive_order_status(&self.items, self.confirmed);
        }
    }

    fn cancel_open_items(&mut self) {
        for item in self.items.iter_mut().filter(|item| !item.status.is_terminal()) {
            item.status = ItemStatus::Cancelled;
        }
    }

    fn any_served(&self) -> bool {
        self.items.iter().any(|item| item.status == ItemStatus::Served)
    }

    /// Gives the table back. The table actor tells an own claim from a ride on another
    /// holder's claim, so the order does not need to.
    async fn release_table(&self, tables: &TableClient) -> Result<(), OrderError> {
        if let Some(table) = self.table_id {
            let cleaning = self.any_served() || self.status == OrderStatus::Completed;
            tables.release(table, Claimant::Order(self.id), cleaning).await?;
        }
        Ok(())
    }

    /// Refuses while money collected on the order has not been refunded.
    fn ensure_unpaid(&self) -> Result<(), OrderError> {
        let net = ledger::paid_total(&self.payments) - ledger::refunded_total(&self.payments);
        if money_exceeds(net, Decimal::ZERO) {
            return Err(OrderError::HasPayments { order: self.id, paid: net });
        }
        Ok(())
    }

    /// Moves the order to a terminal status. The table is released by `handle_action`
    /// once the whole action has validated.
    fn close(&mut self, status: OrderStatus) {
        self.status = status;
        info!(order = %self.id, number = %self.number, %status, "Order closed");
    }

    fn receipt(&self, payment: Payment) -> PaymentReceipt {
        PaymentReceipt {
            payment,
            payment_status: self.payment_status,
            order_status: self.status,
            total: self.totals.total,
            paid: ledger::paid_total(&self.payments),
            refunded: ledger::refunded_total(&self.payments),
        }
    }

    fn advance_item(
        &mut self,
        item_id: OrderItemId,
        to: ItemStatus,
        pricing: &dyn ChargePolicy,
    ) -> Result<OrderStatus, OrderError> {
        let order = self.id;
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(OrderError::ItemNotFound { order, item: item_id })?;
        if !item_transition_allowed(item.status, to) {
            return Err(OrderError::ItemRegression {
                item: item_id,
                from: item.status,
                to,
            });
        }
        item.status = to;
        debug!(order = %order, item = %item_id, status = %to, "Item advanced");

        if to != ItemStatus::Cancelled {
            self.confirmed = true;
            self.refresh_status();
            return Ok(self.status);
        }

        if self.items.iter().all(|item| !item.is_active()) {
            // Nothing left to cook: the order is void, which needs the same clean ledger as a cancel.
            self.ensure_unpaid()?;
            self.totals.discount = Decimal::ZERO;
            self.recompute_totals(pricing)?;
            self.cancel_reason = Some("all items cancelled".into());
            self.close(OrderStatus::Cancelled);
        } else {
            self.recompute_totals(pricing)?;
            self.refresh_status();
        }
        Ok(self.status)
    }

    /// Applies an action to the working copy. Purely local: nothing here talks to another actor.
    fn apply(&mut self, action: OrderAction, pricing: &dyn ChargePolicy) -> Result<OrderActionResult, OrderError> {
        let now = Utc::now();
        match action {
            OrderAction::AddItems(items) => {
                self.ensure_open()?;
                if !matches!(self.status, OrderStatus::Pending | OrderStatus::Confirmed) {
                    return Err(self.invalid("add items to"));
                }
                validate_items(&items)?;
                let ids = self.push_items(items);
                self.recompute_totals(pricing)?;
                self.refresh_status();
                Ok(OrderActionResult::AddItems(ids))
            }
            OrderAction::AdvanceItem { item, status } => {
                self.ensure_open()?;
                let status = self.advance_item(item, status, pricing)?;
                Ok(OrderActionResult::AdvanceItem(status))
            }
            OrderAction::Confirm => {
                self.ensure_open()?;
                if self.status != OrderStatus::Pending {
                    return Err(self.invalid("confirm"));
                }
                self.confirmed = true;
                self.refresh_status();
                Ok(OrderActionResult::Confirm(self.status))
            }
            OrderAction::Complete => {
                self.ensure_open()?;
                if self.status != OrderStatus::Served {
                    return Err(self.invalid("complete"));
                }
                if self.payment_status != PaymentStatus::Paid {
                    return Err(OrderError::Underpayment {
                        order: self.id,
                        outstanding: ledger::outstanding(self),
                    });
                }
                self.close(OrderStatus::Completed);
                Ok(OrderActionResult::Complete(self.status))
            }
            OrderAction::Cancel { reason } => {
                self.ensure_open()?;
                self.ensure_unpaid()?;
                self.cancel_open_items();
                self.cancel_reason = Some(reason);
                self.close(OrderStatus::Cancelled);
                Ok(OrderActionResult::Cancel(self.status))
            }
            OrderAction::ApplyDiscount(discount) => {
                self.ensure_open()?;
                if !is_valid_amount(discount) {
                    return Err(OrderError::ValidationError(format!("invalid discount {discount}")));
                }
                self.totals.discount = discount;
                Ok(OrderActionResult::ApplyDiscount(self.recompute_totals(pricing)?))
            }
            OrderAction::RecomputeTotals => {
                // Closed orders keep the totals they were settled with.
                if self.status.is_terminal() {
                    return Ok(OrderActionResult::RecomputeTotals(self.totals));
                }
                Ok(OrderActionResult::RecomputeTotals(self.recompute_totals(pricing)?))
            }
            OrderAction::ApplyPayment { amount, method, reference } => {
                self.ensure_open()?;
                let payment = ledger::apply_payment(self, amount, method, reference, now)?;
                info!(order = %self.id, %amount, payment_status = %self.payment_status, "Payment applied");
                Ok(OrderActionResult::ApplyPayment(self.receipt(payment)))
            }
            OrderAction::RecordFailedPayment { amount, method, reason } => {
                self.ensure_open()?;
                let payment = ledger::record_failed_payment(self, amount, method, reason, now)?;
                Ok(OrderActionResult::RecordFailedPayment(self.receipt(payment)))
            }
            OrderAction::Refund { amount, original, reason } => {
                let payment = ledger::refund(self, amount, original, reason, now)?;
                info!(order = %self.id, %amount, payment_status = %self.payment_status, "Refund recorded");
                if self.payment_status == PaymentStatus::Refunded && !self.status.is_terminal() {
                    self.cancel_open_items();
                    self.close(OrderStatus::Refunded);
                }
                Ok(OrderActionResult::Refund(self.receipt(payment)))
            }
        }
    }
}

#[async_trait]
impl ActorEntity for Order {
    type Id = OrderId;
    type Create = OrderCreate;
    type Update = OrderUpdate;
    type Action = OrderAction;
    type ActionResult = OrderActionResult;
    type Context = OrderContext;
    type Error = OrderError;

    fn from_create_params(id: OrderId, params: OrderCreate) -> Result<Self, OrderError> {
        validate_items(&params.items)?;
        match (params.order_type, params.table_id) {
            (OrderType::DineIn, None) => {
                return Err(OrderError::ValidationError("dine-in orders need a table".into()));
            }
            (OrderType::Takeaway | OrderType::Delivery, Some(_)) => {
                return Err(OrderError::ValidationError("only dine-in orders take a table".into()));
            }
            _ => {}
        }
        let seated_under = params
            .seated_under
            .or_else(|| params.origin.session().map(Claimant::Session));
        if matches!(params.origin, OrderOrigin::QrSession(_)) && params.order_type != OrderType::DineIn {
            return Err(OrderError::ValidationError("QR orders are dine-in".into()));
        }

        let now = Utc::now();
        let mut order = Self {
            id,
            number: order_number(id, now),
            branch_id: params.branch_id,
            table_id: params.table_id,
            order_type: params.order_type,
            origin: params.origin,
            seated_under,
            status: OrderStatus::Pending,
            confirmed: false,
            payment_status: PaymentStatus::Pending,
            items: Vec::new(),
            payments: Vec::new(),
            totals: Totals::default(),
            notes: params.notes,
            cancel_reason: None,
            created_at: now,
            updated_at: now,
            next_item_id: 1,
            next_payment_id: 1,
        };
        order.push_items(params.items);
        Ok(order)
    }

    /// Claims (or rides on) the table, then prices the order.
    async fn on_create(&mut self, ctx: &OrderContext) -> Result<(), OrderError> {
        if let Some(table) = self.table_id {
            let request = ClaimRequest::Order {
                order: self.id,
                under: self.seated_under,
            };
            ctx.tables.claim(table, request).await.map_err(|e| match e {
                TableError::ActorCommunicationError(_) => OrderError::Table(e),
                reason => OrderError::TableUnavailable { table, reason },
            })?;
        }
        self.recompute_totals(ctx.pricing.as_ref())?;
        info!(order = %self.id, number = %self.number, total = %self.totals.total, "Order placed");
        Ok(())
    }

    async fn on_update(&mut self, update: OrderUpdate, _ctx: &OrderContext) -> Result<(), OrderError> {
        self.ensure_open()?;
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// The table is released last, after every local check on the working copy has passed.
    async fn handle_action(&mut self, action: OrderAction, ctx: &OrderContext) -> Result<OrderActionResult, OrderError> {
        let was_open = !self.status.is_terminal();
        let result = self.apply(action, ctx.pricing.as_ref())?;
        ledger::ensure_within_total(self)?;
        if was_open && self.status.is_terminal() {
            self.release_table(&ctx.tables).await?;
        }
        self.updated_at = Utc::now();
        Ok(result)
    }

    fn state_changes(&self, before: Option<&Self>) -> Vec<StateChange> {
        let mut changes: Vec<StateChange> = Vec::new();
        changes.extend(StateChange::between(
            EntityKind::Order,
            self.id,
            before.map(|o| o.status.as_str()),
            self.status.as_str(),
        ));
        changes.extend(StateChange::between(
            EntityKind::OrderPayment,
            self.id,
            before.map(|o| o.payment_status.as_str()),
            self.payment_status.as_str(),
        ));
        for item in &self.items {
            let old = before.and_then(|o| o.item(item.id)).map(|i| i.status.as_str());
            changes.extend(StateChange::between(
                EntityKind::OrderItem,
                format!("{}/{}", self.id, item.id),
                old,
                item.status.as_str(),
            ));
        }
        changes
    }
}
