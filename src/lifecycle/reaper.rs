//! Background sweeps: idle session expiry and reservation hold activation.
//!
//! The reaper has no privileged access. It lists candidates through the ordinary clients and
//! then sends the same actions a request would, so every transition is re-validated inside
//! the owning actor. A session that was touched between the listing and the `Expire`
//! action is left alone.

use crate::clients::{ReservationClient, SessionClient};
use crate::model::{ReservationId, SessionId};
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct Reaper {
    sessions: SessionClient,
    reservations: ReservationClient,
    lead_time: TimeDelta,
}

impl Reaper {
    pub fn new(sessions: SessionClient, reservations: ReservationClient, lead_time: TimeDelta) -> Self {
        Self {
            sessions,
            reservations,
            lead_time,
        }
    }

    /// Expires every idle session. Returns the sessions that were expired.
    pub async fn reap(&self) -> Vec<SessionId> {
        self.reap_at(Utc::now()).await
    }

    pub async fn reap_at(&self, now: DateTime<Utc>) -> Vec<SessionId> {
        let due = match self.sessions.list_due(now).await {
            Ok(due) => due,
            Err(e) => {
                warn!(error = %e, "Could not list idle sessions");
                return Vec::new();
            }
        };

        let mut expired = Vec::new();
        for session in due {
            match self.sessions.expire(session.id, session.last_activity_at, now).await {
                Ok(true) => expired.push(session.id),
                Ok(false) => debug!(session = %session.id, "Session became active again, skipped"),
                Err(e) => warn!(session = %session.id, error = %e, "Expire failed"),
            }
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "Expired idle sessions");
        }
        expired
    }

    /// Places RESERVED holds for confirmed reservations inside the lead window.
    pub async fn activate_reservations(&self) -> Vec<ReservationId> {
        self.activate_reservations_at(Utc::now()).await
    }

    pub async fn activate_reservations_at(&self, now: DateTime<Utc>) -> Vec<ReservationId> {
        let due = match self.reservations.list_activation_due(now, self.lead_time).await {
            Ok(due) => due,
            Err(e) => {
                warn!(error = %e, "Could not list reservations to activate");
                return Vec::new();
            }
        };

        let mut held = Vec::new();
        for reservation in due {
            match self.reservations.activate(reservation.id, now, self.lead_time).await {
                Ok(true) => held.push(reservation.id),
                Ok(false) => debug!(reservation = %reservation.id, "Nothing to hold"),
                // Usually a guest still at the table. Retried on the next tick.
                Err(e) => warn!(reservation = %reservation.id, error = %e, "Could not hold table"),
            }
        }
        held
    }

    /// Sweeps every `period` until `shutdown` is cancelled.
    pub async fn run(self, period: Duration, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(?period, "Reaper started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.reap().await;
                    self.activate_reservations().await;
                }
            }
        }
        info!("Reaper stopped");
    }
}
