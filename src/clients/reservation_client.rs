use crate::clients::actor_client::ActorClient;
use crate::framework::{Filter, FrameworkError, ResourceClient};
use crate::model::{
    BranchId, Reservation, ReservationCreate, ReservationId, ReservationStatus, ReservationUpdate, TableId,
};
use crate::reservation_actor::{ReservationAction, ReservationActionResult, ReservationError};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use tracing::{debug, instrument};

/// A booking request as received from the guest or host stand.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub branch_id: BranchId,
    /// `None` lets the scheduler pick a table on confirmation.
    pub table_id: Option<TableId>,
    pub customer_name: String,
    pub customer_phone: String,
    pub guest_count: u32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Defaults to the configured reservation length.
    pub duration_minutes: Option<u32>,
    pub notes: Option<String>,
}

/// Client for interacting with the Reservation actor.
#[derive(Clone)]
pub struct ReservationClient {
    inner: ResourceClient<Reservation>,
    default_minutes: u32,
}

fn unexpected(result: ReservationActionResult) -> ReservationError {
    ReservationError::ActorCommunicationError(format!("unexpected action result: {result:?}"))
}

macro_rules! reservation_action {
    ($client:expr, $id:expr, $action:expr, $variant:ident) => {
        match $client.inner.perform_action($id, $action).await {
            Ok(ReservationActionResult::$variant(value)) => Ok(value),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    };
}

impl ReservationClient {
    pub fn new(inner: ResourceClient<Reservation>, default_minutes: u32) -> Self {
        Self { inner, default_minutes }
    }

    /// Creates a PENDING reservation. Fails with `Overlap` if the window collides with a
    /// confirmed or seated booking on the same table.
    #[instrument(skip(self, request), fields(guests = request.guest_count))]
    pub async fn propose(&self, request: BookingRequest) -> Result<ReservationId, ReservationError> {
        debug!("Sending propose to actor");
        let params = ReservationCreate {
            branch_id: request.branch_id,
            table_id: request.table_id,
            customer_name: request.customer_name,
            customer_phone: request.customer_phone,
            guest_count: request.guest_count,
            date: request.date,
            time: request.time,
            duration_minutes: request.duration_minutes.unwrap_or(self.default_minutes),
            notes: request.notes,
        };
        self.inner.create(params).await.map_err(Self::map_error)
    }

    /// Confirms and returns the reservation, including its (possibly just assigned) table.
    #[instrument(skip(self))]
    pub async fn confirm(&self, id: ReservationId) -> Result<Reservation, ReservationError> {
        let _status: ReservationStatus = reservation_action!(self, id, ReservationAction::Confirm, Confirm)?;
        self.fetch(id).await
    }

    /// `propose` followed by `confirm`.
    #[instrument(skip(self, request))]
    pub async fn book(&self, request: BookingRequest) -> Result<Reservation, ReservationError> {
        let id = self.propose(request).await?;
        self.confirm(id).await
    }

    #[instrument(skip(self))]
    pub async fn update_reservation(
        &self,
        id: ReservationId,
        update: ReservationUpdate,
    ) -> Result<Reservation, ReservationError> {
        self.inner.update(id, update).await.map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, id: ReservationId) -> Result<ReservationStatus, ReservationError> {
        reservation_action!(self, id, ReservationAction::Cancel, Cancel)
    }

    #[instrument(skip(self))]
    pub async fn mark_no_show(&self, id: ReservationId) -> Result<ReservationStatus, ReservationError> {
        reservation_action!(self, id, ReservationAction::MarkNoShow, MarkNoShow)
    }

    #[instrument(skip(self))]
    pub async fn seat(&self, id: ReservationId) -> Result<TableId, ReservationError> {
        reservation_action!(self, id, ReservationAction::Seat, Seat)
    }

    #[instrument(skip(self))]
    pub async fn complete(&self, id: ReservationId) -> Result<ReservationStatus, ReservationError> {
        reservation_action!(self, id, ReservationAction::Complete, Complete)
    }

    #[instrument(skip(self))]
    pub async fn activate(
        &self,
        id: ReservationId,
        now: DateTime<Utc>,
        lead_time: TimeDelta,
    ) -> Result<bool, ReservationError> {
        reservation_action!(self, id, ReservationAction::Activate { now, lead_time }, Activate)
    }

    /// Live reservations on a table, in id order.
    #[instrument(skip(self))]
    pub async fn list_for_table(&self, table: TableId) -> Result<Vec<Reservation>, ReservationError> {
        self.inner
            .list(Filter::new(move |r: &Reservation| r.table_id == Some(table) && !r.status.is_terminal()))
            .await
            .map_err(Self::map_error)
    }

    /// Confirmed, not yet held reservations whose hold window has opened at `now`.
    #[instrument(skip(self))]
    pub async fn list_activation_due(
        &self,
        now: DateTime<Utc>,
        lead_time: TimeDelta,
    ) -> Result<Vec<Reservation>, ReservationError> {
        self.inner
            .list(Filter::new(move |r: &Reservation| {
                r.status == ReservationStatus::Confirmed
                    && !r.held
                    && now >= r.starts_at - lead_time
                    && now < r.ends_at()
            }))
            .await
            .map_err(Self::map_error)
    }
}

#[async_trait]
impl ActorClient<Reservation> for ReservationClient {
    type Error = ReservationError;

    fn inner(&self) -> &ResourceClient<Reservation> {
        &self.inner
    }

    fn map_error(e: FrameworkError<ReservationError>) -> Self::Error {
        ReservationError::from(e)
    }
}
