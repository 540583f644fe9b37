use super::actions::{SessionAction, SessionActionResult};
use super::error::SessionError;
use crate::clients::TableClient;
use crate::framework::{ActorEntity, EntityKind, StateChange};
use crate::model::{
    BranchId, CartLine, CheckoutTicket, ClaimRequest, Claimant, ItemInput, OrderId, PendingCheckout, QrSession,
    SessionCreate, SessionId, SessionStatus, SessionUpdate,
};
use crate::money::is_valid_amount;
use crate::table_actor::TableError;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, info, warn};

/// Length of the opaque token printed into the guest's session URL.
pub const TOKEN_LEN: usize = 32;

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn validate_item(item: &ItemInput) -> Result<(), SessionError> {
    if item.quantity == 0 {
        return Err(SessionError::ValidationError(format!("quantity of {} must be at least 1", item.name)));
    }
    if !is_valid_amount(item.unit_price) {
        return Err(SessionError::ValidationError(format!("invalid unit price {} for {}", item.unit_price, item.name)));
    }
    Ok(())
}

impl QrSession {
    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.status != SessionStatus::Active {
            return Err(SessionError::NotActive {
                session: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    /// Sliding expiry: every guest interaction pushes `expires_at` forward.
    fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
        self.expires_at = now + self.idle_timeout;
    }

    fn line_locked(&self, line_id: u32) -> bool {
        self.checkout
            .as_ref()
            .is_some_and(|pending| pending.line_ids.contains(&line_id))
    }

    fn line_index(&self, line_id: u32) -> Result<usize, SessionError> {
        self.cart
            .iter()
            .position(|line| line.line_id == line_id)
            .ok_or(SessionError::LineNotFound { session: self.id, line: line_id })
    }

    fn finish(&mut self, status: SessionStatus, now: DateTime<Utc>) {
        self.status = status;
        self.ended_at = Some(now);
    }

    async fn release_table(&self, tables: &TableClient, cleaning: bool) -> Result<(), SessionError> {
        tables
            .release(self.table_id, Claimant::Session(self.id), cleaning)
            .await?;
        Ok(())
    }

    fn add_to_cart(&mut self, item: ItemInput) -> Result<CartLine, SessionError> {
        validate_item(&item)?;
        let line = CartLine {
            line_id: self.next_line_id,
            menu_item: item.menu_item,
            name: item.name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            notes: item.notes,
        };
        self.next_line_id += 1;
        self.cart.push(line.clone());
        Ok(line)
    }

    fn update_quantity(&mut self, line_id: u32, quantity: u32) -> Result<Option<CartLine>, SessionError> {
        if self.line_locked(line_id) {
            return Err(SessionError::CheckoutInFlight(self.id));
        }
        let index = self.line_index(line_id)?;
        if quantity == 0 {
            self.cart.remove(index);
            return Ok(None);
        }
        self.cart[index].quantity = quantity;
        Ok(Some(self.cart[index].clone()))
    }

    fn begin_checkout(&mut self, now: DateTime<Utc>) -> Result<CheckoutTicket, SessionError> {
        if self.checkout.is_some() {
            return Err(SessionError::CheckoutInFlight(self.id));
        }
        if self.cart.is_empty() {
            return Err(SessionError::EmptyCart(self.id));
        }
        self.checkout = Some(PendingCheckout {
            line_ids: self.cart.iter().map(|line| line.line_id).collect(),
            started_at: now,
        });
        Ok(CheckoutTicket {
            session_id: self.id,
            table_id: self.table_id,
            branch_id: self.branch_id,
            lines: self.cart.clone(),
        })
    }

    fn commit_checkout(&mut self, order: OrderId) -> Result<(), SessionError> {
        let pending = self.checkout.take().ok_or(SessionError::NoCheckoutInFlight(self.id))?;
        self.cart.retain(|line| !pending.line_ids.contains(&line.line_id));
        self.orders.push(order);
        self.open_orders.insert(order);
        Ok(())
    }

    /// All orders closed and nothing left to order: the visit is over.
    fn can_auto_complete(&self) -> bool {
        !self.orders.is_empty() && self.open_orders.is_empty() && self.cart.is_empty() && self.checkout.is_none()
    }
}

#[async_trait]
impl ActorEntity for QrSession {
    type Id = SessionId;
    type Create = SessionCreate;
    type Update = SessionUpdate;
    type Action = SessionAction;
    type ActionResult = SessionActionResult;
    type Context = TableClient;
    type Error = SessionError;

    fn from_create_params(id: SessionId, params: SessionCreate) -> Result<Self, SessionError> {
        if params.guest_count == 0 {
            return Err(SessionError::ValidationError("guest count must be at least 1".into()));
        }
        if params.idle_timeout <= TimeDelta::zero() {
            return Err(SessionError::ValidationError("idle timeout must be positive".into()));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            token: generate_token(),
            table_id: params.table_id,
            // Filled in from the table when the claim succeeds.
            branch_id: BranchId(0),
            status: SessionStatus::Active,
            guest_count: params.guest_count,
            customer_name: params.customer_name,
            device_info: params.device_info,
            started_at: now,
            last_activity_at: now,
            expires_at: now + params.idle_timeout,
            ended_at: None,
            idle_timeout: params.idle_timeout,
            cart: Vec::new(),
            next_line_id: 1,
            orders: Vec::new(),
            open_orders: Default::default(),
            checkout: None,
        })
    }

    /// Claims the table. A session exists only if it holds its table.
    async fn on_create(&mut self, tables: &TableClient) -> Result<(), SessionError> {
        let grant = tables
            .claim(self.table_id, ClaimRequest::Session(self.id))
            .await
            .map_err(|e| match e {
                TableError::ActorCommunicationError(_) => SessionError::Table(e),
                reason => SessionError::TableUnavailable { table: self.table_id, reason },
            })?;
        self.branch_id = grant.branch_id;
        if self.guest_count > grant.capacity {
            warn!(session = %self.id, table = %self.table_id, guests = self.guest_count, capacity = grant.capacity, "Party larger than table");
        }
        info!(session = %self.id, table = %self.table_id, "Session started");
        Ok(())
    }

    async fn on_update(&mut self, update: SessionUpdate, _ctx: &TableClient) -> Result<(), SessionError> {
        self.ensure_active()?;
        if let Some(name) = update.customer_name {
            self.customer_name = Some(name);
        }
        if let Some(guests) = update.guest_count {
            if guests == 0 {
                return Err(SessionError::ValidationError("guest count must be at least 1".into()));
            }
            self.guest_count = guests;
        }
        self.touch(Utc::now());
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: SessionAction,
        tables: &TableClient,
    ) -> Result<SessionActionResult, SessionError> {
        let now = Utc::now();

        // Closing notices and expiry checks must not fail on a session that already ended.
        match &action {
            SessionAction::OrderClosed(order) if self.status != SessionStatus::Active => {
                self.open_orders.remove(order);
                return Ok(SessionActionResult::OrderClosed(self.status));
            }
            SessionAction::Expire { .. } if self.status != SessionStatus::Active => {
                return Ok(SessionActionResult::Expire(false));
            }
            _ => self.ensure_active()?,
        }

        match action {
            SessionAction::AddToCart(item) => {
                let line = self.add_to_cart(item)?;
                self.touch(now);
                Ok(SessionActionResult::AddToCart(line))
            }
            SessionAction::RemoveFromCart { line_id } => {
                self.update_quantity(line_id, 0)?;
                self.touch(now);
                Ok(SessionActionResult::RemoveFromCart(()))
            }
            SessionAction::UpdateQuantity { line_id, quantity } => {
                let line = self.update_quantity(line_id, quantity)?;
                self.touch(now);
                Ok(SessionActionResult::UpdateQuantity(line))
            }
            SessionAction::Touch => {
                self.touch(now);
                Ok(SessionActionResult::Touch(self.expires_at))
            }
            SessionAction::BeginCheckout => {
                let ticket = self.begin_checkout(now)?;
                self.touch(now);
                Ok(SessionActionResult::BeginCheckout(ticket))
            }
            SessionAction::CommitCheckout(order) => {
                self.commit_checkout(order)?;
                self.touch(now);
                Ok(SessionActionResult::CommitCheckout(()))
            }
            SessionAction::AbortCheckout => {
                self.checkout.take().ok_or(SessionError::NoCheckoutInFlight(self.id))?;
                Ok(SessionActionResult::AbortCheckout(()))
            }
            SessionAction::OrderClosed(order) => {
                self.open_orders.remove(&order);
                if self.can_auto_complete() {
                    self.release_table(tables, true).await?;
                    self.finish(SessionStatus::Completed, now);
                    info!(session = %self.id, "Session completed");
                }
                Ok(SessionActionResult::OrderClosed(self.status))
            }
            SessionAction::End => {
                if self.checkout.is_some() {
                    return Err(SessionError::CheckoutInFlight(self.id));
                }
                if !self.open_orders.is_empty() {
                    return Err(SessionError::OpenOrders {
                        session: self.id,
                        open: self.open_orders.len(),
                    });
                }
                let (status, cleaning) = if self.orders.is_empty() {
                    // Walk-outs with a filled cart are left to the reaper, which expires them.
                    if !self.cart.is_empty() {
                        return Err(SessionError::CartNotEmpty {
                            session: self.id,
                            lines: self.cart.len(),
                        });
                    }
                    (SessionStatus::Abandoned, false)
                } else {
                    (SessionStatus::Completed, true)
                };
                self.release_table(tables, cleaning).await?;
                self.finish(status, now);
                info!(session = %self.id, %status, "Session ended");
                Ok(SessionActionResult::End(status))
            }
            SessionAction::Expire { observed_activity, now } => {
                // Re-checked here: activity may have arrived after the reaper looked.
                if self.last_activity_at != observed_activity || !self.is_due(now) {
                    debug!(session = %self.id, "Expiry skipped, session is busy or active");
                    return Ok(SessionActionResult::Expire(false));
                }
                self.release_table(tables, !self.orders.is_empty()).await?;
                self.finish(SessionStatus::Expired, now);
                info!(session = %self.id, table = %self.table_id, "Session expired");
                Ok(SessionActionResult::Expire(true))
            }
        }
    }

    fn state_changes(&self, before: Option<&Self>) -> Vec<StateChange> {
        StateChange::between(
            EntityKind::QrSession,
            self.id,
            before.map(|s| s.status.as_str()),
            self.status.as_str(),
        )
        .into_iter()
        .collect()
    }
}
