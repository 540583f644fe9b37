//! Reservation scheduling.
//!
//! Overlap detection runs in [`ActorEntity::check_peers`], so checking a window against every
//! other reservation and committing the result is one atomic step inside the reservation
//! actor. Two requests for overlapping windows on the same table can never both be confirmed.

use super::actions::{ReservationAction, ReservationActionResult};
use super::error::ReservationError;
use crate::clients::{ActorClient, TableClient};
use crate::framework::{ActorEntity, EntityKind, StateChange};
use crate::model::{
    ClaimRequest, Claimant, Reservation, ReservationCreate, ReservationId, ReservationStatus, ReservationUpdate,
    TableId,
};
use crate::table_actor::TableError;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

impl Reservation {
    fn invalid(&self, action: &'static str) -> ReservationError {
        ReservationError::InvalidTransition {
            reservation: self.id,
            from: self.status,
            action,
        }
    }

    fn assigned_table(&self) -> Result<TableId, ReservationError> {
        self.table_id.ok_or_else(|| self.invalid("use the table of"))
    }

    async fn release_hold(&mut self, tables: &TableClient) -> Result<(), ReservationError> {
        if let (true, Some(table)) = (self.held, self.table_id) {
            tables.release(table, Claimant::Reservation(self.id), false).await?;
            self.held = false;
        }
        Ok(())
    }

    fn table_refused(table: TableId, reason: TableError) -> ReservationError {
        match reason {
            TableError::ActorCommunicationError(_) => ReservationError::Table(reason),
            reason => ReservationError::TableUnavailable { table, reason },
        }
    }
}

#[async_trait]
impl ActorEntity for Reservation {
    type Id = ReservationId;
    type Create = ReservationCreate;
    type Update = ReservationUpdate;
    type Action = ReservationAction;
    type ActionResult = ReservationActionResult;
    type Context = TableClient;
    type Error = ReservationError;

    fn from_create_params(id: ReservationId, params: ReservationCreate) -> Result<Self, ReservationError> {
        if params.guest_count == 0 {
            return Err(ReservationError::ValidationError("guest count must be at least 1".into()));
        }
        if params.duration_minutes == 0 {
            return Err(ReservationError::ValidationError("duration must be positive".into()));
        }
        if params.customer_name.trim().is_empty() {
            return Err(ReservationError::ValidationError("customer name is required".into()));
        }
        Ok(Self {
            id,
            branch_id: params.branch_id,
            table_id: params.table_id,
            candidates: Vec::new(),
            customer_name: params.customer_name,
            customer_phone: params.customer_phone,
            guest_count: params.guest_count,
            starts_at: params.date.and_time(params.time).and_utc(),
            duration_minutes: params.duration_minutes,
            status: ReservationStatus::Pending,
            notes: params.notes,
            held: false,
            created_at: Utc::now(),
        })
    }

    /// Validates the requested table, or collects candidate tables for an unassigned booking.
    async fn on_create(&mut self, tables: &TableClient) -> Result<(), ReservationError> {
        match self.table_id {
            Some(table_id) => {
                let table = tables.fetch(table_id).await.map_err(|e| match e {
                    TableError::NotFound(_) => ReservationError::TableNotFound(table_id),
                    other => ReservationError::Table(other),
                })?;
                if table.retired || table.branch_id != self.branch_id {
                    return Err(ReservationError::TableNotFound(table_id));
                }
                if table.capacity < self.guest_count {
                    return Err(ReservationError::TableTooSmall {
                        table: table_id,
                        capacity: table.capacity,
                        guests: self.guest_count,
                    });
                }
            }
            None => {
                let mut fitting: Vec<_> = tables
                    .list_tables(self.branch_id)
                    .await?
                    .into_iter()
                    .filter(|t| t.capacity >= self.guest_count)
                    .collect();
                fitting.sort_by_key(|t| (t.capacity, t.id));
                self.candidates = fitting.into_iter().map(|t| t.id).collect();
                debug!(reservation = %self.id, candidates = self.candidates.len(), "Candidate tables");
            }
        }
        Ok(())
    }

    async fn on_update(&mut self, update: ReservationUpdate, _ctx: &TableClient) -> Result<(), ReservationError> {
        if self.status.is_terminal() {
            return Err(self.invalid("update"));
        }
        if let Some(phone) = update.customer_phone {
            self.customer_phone = phone;
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: ReservationAction,
        tables: &TableClient,
    ) -> Result<ReservationActionResult, ReservationError> {
        match action {
            ReservationAction::Confirm => {
                if self.status != ReservationStatus::Pending {
                    return Err(self.invalid("confirm"));
                }
                self.status = ReservationStatus::Confirmed;
                Ok(ReservationActionResult::Confirm(self.status))
            }
            ReservationAction::Cancel => {
                if !matches!(self.status, ReservationStatus::Pending | ReservationStatus::Confirmed) {
                    return Err(self.invalid("cancel"));
                }
                self.release_hold(tables).await?;
                self.status = ReservationStatus::Cancelled;
                Ok(ReservationActionResult::Cancel(self.status))
            }
            ReservationAction::MarkNoShow => {
                if self.status != ReservationStatus::Confirmed {
                    return Err(self.invalid("mark no-show"));
                }
                self.release_hold(tables).await?;
                self.status = ReservationStatus::NoShow;
                Ok(ReservationActionResult::MarkNoShow(self.status))
            }
            ReservationAction::Seat => {
                if self.status != ReservationStatus::Confirmed {
                    return Err(self.invalid("seat"));
                }
                let table = self.assigned_table()?;
                tables
                    .claim(table, ClaimRequest::Seat(self.id))
                    .await
                    .map_err(|e| Self::table_refused(table, e))?;
                self.held = false;
                self.status = ReservationStatus::Seated;
                info!(reservation = %self.id, %table, "Party seated");
                Ok(ReservationActionResult::Seat(table))
            }
            ReservationAction::Complete => {
                if self.status != ReservationStatus::Seated {
                    return Err(self.invalid("complete"));
                }
                let table = self.assigned_table()?;
                tables.release(table, Claimant::Reservation(self.id), true).await?;
                self.status = ReservationStatus::Completed;
                Ok(ReservationActionResult::Complete(self.status))
            }
            ReservationAction::Activate { now, lead_time } => {
                let in_window = now >= self.starts_at - lead_time && now < self.ends_at();
                if self.status != ReservationStatus::Confirmed || self.held || !in_window {
                    return Ok(ReservationActionResult::Activate(false));
                }
                let table = self.assigned_table()?;
                tables
                    .claim(table, ClaimRequest::Hold(self.id))
                    .await
                    .map_err(|e| Self::table_refused(table, e))?;
                self.held = true;
                info!(reservation = %self.id, %table, "Table held for arrival");
                Ok(ReservationActionResult::Activate(true))
            }
        }
    }

    fn check_peers(&mut self, peers: &[&Self]) -> Result<(), ReservationError> {
        if self.status.is_terminal() {
            return Ok(());
        }
        match self.table_id {
            Some(table) => match peers.iter().find(|other| self.collides_on(table, other)) {
                Some(other) => Err(ReservationError::Overlap { table, with: other.id }),
                None => Ok(()),
            },
            None => {
                let free = self
                    .candidates
                    .iter()
                    .copied()
                    .find(|table| !peers.iter().any(|other| self.collides_on(*table, other)));
                match free {
                    Some(table) if self.status == ReservationStatus::Confirmed => {
                        info!(reservation = %self.id, %table, "Table assigned");
                        self.table_id = Some(table);
                        Ok(())
                    }
                    Some(_) => Ok(()),
                    None => Err(ReservationError::NoSuitableTable {
                        branch: self.branch_id,
                        guests: self.guest_count,
                    }),
                }
            }
        }
    }

    fn state_changes(&self, before: Option<&Self>) -> Vec<StateChange> {
        StateChange::between(
            EntityKind::Reservation,
            self.id,
            before.map(|r| r.status.as_str()),
            self.status.as_str(),
        )
        .into_iter()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BranchId;
    use chrono::{NaiveDate, NaiveTime};

    fn at(hour: u32, minute: u32, duration_minutes: u32, id: u32) -> Reservation {
        Reservation::from_create_params(
            ReservationId(id),
            ReservationCreate {
                branch_id: BranchId(1),
                table_id: Some(TableId(1)),
                customer_name: "Asha".into(),
                customer_phone: "555-0100".into(),
                guest_count: 2,
                date: NaiveDate::from_ymd_opt(2030, 5, 17).unwrap(),
                time: NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
                duration_minutes,
                notes: None,
            },
        )
        .unwrap()
    }

    fn confirmed(mut r: Reservation) -> Reservation {
        r.status = ReservationStatus::Confirmed;
        r
    }

    #[test]
    fn windows_are_half_open() {
        let dinner = at(19, 0, 120, 1);
        assert!(dinner.overlaps(&at(20, 0, 120, 2)));
        assert!(!dinner.overlaps(&at(21, 0, 90, 3)));
        assert!(!dinner.overlaps(&at(17, 0, 120, 4)));
        assert!(dinner.overlaps(&at(18, 59, 1, 5)));
    }

    #[test]
    fn only_confirmed_or_seated_peers_block() {
        let pending_peer = at(19, 0, 120, 1);
        let mut fresh = at(20, 0, 120, 2);
        assert!(fresh.check_peers(&[&pending_peer]).is_ok());

        let confirmed_peer = confirmed(at(19, 0, 120, 1));
        assert_eq!(
            fresh.check_peers(&[&confirmed_peer]).unwrap_err(),
            ReservationError::Overlap { table: TableId(1), with: ReservationId(1) }
        );

        let mut cancelled = confirmed_peer.clone();
        cancelled.status = ReservationStatus::Cancelled;
        assert!(fresh.check_peers(&[&cancelled]).is_ok());
    }

    #[test]
    fn unassigned_confirmation_takes_first_free_candidate() {
        let busy = confirmed(at(19, 0, 120, 1));
        let mut floating = at(19, 30, 60, 2);
        floating.table_id = None;
        floating.candidates = vec![TableId(1), TableId(2)];

        floating.check_peers(&[&busy]).unwrap();
        assert_eq!(floating.table_id, None);

        floating.status = ReservationStatus::Confirmed;
        floating.check_peers(&[&busy]).unwrap();
        assert_eq!(floating.table_id, Some(TableId(2)));
    }

    #[test]
    fn unassigned_without_free_candidate_is_rejected() {
        let busy = confirmed(at(19, 0, 120, 1));
        let mut floating = at(19, 30, 60, 2);
        floating.table_id = None;
        floating.candidates = vec![TableId(1)];
        assert_eq!(
            floating.check_peers(&[&busy]).unwrap_err(),
            ReservationError::NoSuitableTable { branch: BranchId(1), guests: 2 }
        );
    }
}
