use crate::clients::actor_client::ActorClient;
use crate::framework::{Filter, FrameworkError, ResourceClient};
use crate::model::{
    CartLine, CheckoutTicket, ItemInput, OrderId, QrSession, SessionCreate, SessionId, SessionStatus, SessionUpdate,
    TableId,
};
use crate::session_actor::{SessionAction, SessionActionResult, SessionError};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, instrument};

/// Client for interacting with the QR Session actor.
#[derive(Clone)]
pub struct SessionClient {
    inner: ResourceClient<QrSession>,
    idle_timeout: TimeDelta,
}

fn unexpected(result: SessionActionResult) -> SessionError {
    SessionError::ActorCommunicationError(format!("unexpected action result: {result:?}"))
}

/// Sends one session action and unwraps the matching result variant.
macro_rules! session_action {
    ($client:expr, $id:expr, $action:expr, $variant:ident) => {
        match $client.inner.perform_action($id, $action).await {
            Ok(SessionActionResult::$variant(value)) => Ok(value),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    };
}

impl SessionClient {
    pub fn new(inner: ResourceClient<QrSession>, idle_timeout: TimeDelta) -> Self {
        Self { inner, idle_timeout }
    }

    /// Opens a session on `table`, claiming it atomically. Returns the created session,
    /// including the token to embed in the guest's URL.
    #[instrument(skip(self, device_info))]
    pub async fn start_session(
        &self,
        table: TableId,
        guest_count: u32,
        customer_name: Option<String>,
        device_info: Option<String>,
    ) -> Result<QrSession, SessionError> {
        debug!("Sending start_session to actor");
        let params = SessionCreate {
            table_id: table,
            guest_count,
            customer_name,
            device_info,
            idle_timeout: self.idle_timeout,
        };
        let id = self.inner.create(params).await.map_err(Self::map_error)?;
        self.fetch(id).await
    }

    #[instrument(skip(self))]
    pub async fn update_session(&self, id: SessionId, update: SessionUpdate) -> Result<QrSession, SessionError> {
        self.inner.update(id, update).await.map_err(Self::map_error)
    }

    /// Resolves a guest token to its session, whatever its status.
    #[instrument(skip(self, token))]
    pub async fn find_by_token(&self, token: &str) -> Result<QrSession, SessionError> {
        let wanted = token.to_string();
        let mut found = self
            .inner
            .list(Filter::new(move |s: &QrSession| s.token == wanted))
            .await
            .map_err(Self::map_error)?;
        found.pop().ok_or_else(|| SessionError::NotFound("token".into()))
    }

    /// The active session on a table, if any.
    #[instrument(skip(self))]
    pub async fn active_on_table(&self, table: TableId) -> Result<Option<QrSession>, SessionError> {
        let mut found = self
            .inner
            .list(Filter::new(move |s: &QrSession| {
                s.table_id == table && s.status == SessionStatus::Active
            }))
            .await
            .map_err(Self::map_error)?;
        Ok(found.pop())
    }

    /// Sessions that look expirable at `now`. The actor re-checks before expiring.
    #[instrument(skip(self))]
    pub async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<QrSession>, SessionError> {
        self.inner
            .list(Filter::new(move |s: &QrSession| s.is_due(now)))
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, id: SessionId, item: ItemInput) -> Result<CartLine, SessionError> {
        session_action!(self, id, SessionAction::AddToCart(item), AddToCart)
    }

    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, id: SessionId, line_id: u32) -> Result<(), SessionError> {
        session_action!(self, id, SessionAction::RemoveFromCart { line_id }, RemoveFromCart)
    }

    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        id: SessionId,
        line_id: u32,
        quantity: u32,
    ) -> Result<Option<CartLine>, SessionError> {
        session_action!(self, id, SessionAction::UpdateQuantity { line_id, quantity }, UpdateQuantity)
    }

    #[instrument(skip(self))]
    pub async fn touch(&self, id: SessionId) -> Result<DateTime<Utc>, SessionError> {
        session_action!(self, id, SessionAction::Touch, Touch)
    }

    #[instrument(skip(self))]
    pub async fn begin_checkout(&self, id: SessionId) -> Result<CheckoutTicket, SessionError> {
        session_action!(self, id, SessionAction::BeginCheckout, BeginCheckout)
    }

    #[instrument(skip(self))]
    pub async fn commit_checkout(&self, id: SessionId, order: OrderId) -> Result<(), SessionError> {
        session_action!(self, id, SessionAction::CommitCheckout(order), CommitCheckout)
    }

    #[instrument(skip(self))]
    pub async fn abort_checkout(&self, id: SessionId) -> Result<(), SessionError> {
        session_action!(self, id, SessionAction::AbortCheckout, AbortCheckout)
    }

    #[instrument(skip(self))]
    pub async fn order_closed(&self, id: SessionId, order: OrderId) -> Result<SessionStatus, SessionError> {
        session_action!(self, id, SessionAction::OrderClosed(order), OrderClosed)
    }

    #[instrument(skip(self))]
    pub async fn end_session(&self, id: SessionId) -> Result<SessionStatus, SessionError> {
        session_action!(self, id, SessionAction::End, End)
    }

    #[instrument(skip(self))]
    pub async fn expire(
        &self,
        id: SessionId,
        observed_activity: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, SessionError> {
        session_action!(self, id, SessionAction::Expire { observed_activity, now }, Expire)
    }
}

#[async_trait]
impl ActorClient<QrSession> for SessionClient {
    type Error = SessionError;

    fn inner(&self) -> &ResourceClient<QrSession> {
        &self.inner
    }

    fn map_error(e: FrameworkError<SessionError>) -> Self::Error {
        SessionError::from(e)
    }
}
