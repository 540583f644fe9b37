//! Table state machine.
//!
//! ```text
//!            Claim(Session/Seat/Order)            Release(cleaning)
//! AVAILABLE ───────────────────────────► OCCUPIED ─────────────────► CLEANING
//!   │  ▲                                   ▲                           │
//!   │  │ Release / Cancel                  │ Seat(same reservation)    │ MarkCleaned
//!   │  └──────────── RESERVED ─────────────┘                           │
//!   └── Claim(Hold) ──►                                                ▼
//!                                                                  AVAILABLE
//! Block / Unblock: any state <-> BLOCKED (prior state and holder are restored)
//! ```

use super::actions::{ClaimGrant, TableAction, TableActionResult};
use super::error::TableError;
use crate::framework::{ActorEntity, EntityKind, StateChange};
use crate::model::{BlockedState, ClaimRequest, Claimant, Table, TableCreate, TableId, TableStatus, TableUpdate};
use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::debug;

impl Table {
    fn conflict(&self) -> TableError {
        TableError::Conflict {
            table: self.id,
            status: self.status,
            holder: self.holder,
        }
    }

    fn grant(&self, already_held: bool) -> ClaimGrant {
        ClaimGrant {
            status: self.status,
            branch_id: self.branch_id,
            capacity: self.capacity,
            already_held,
        }
    }

    /// Decides a claim. The whole check-and-set runs inside the table actor, so two
    /// concurrent claims can never both succeed.
    pub fn claim(&mut self, request: ClaimRequest) -> Result<ClaimGrant, TableError> {
        if self.retired {
            return Err(TableError::Retired(self.id));
        }
        let claimant = request.claimant();
        if self.holder == Some(claimant) && self.status != TableStatus::Reserved {
            return Ok(self.grant(true));
        }

        match (request, self.status) {
            (ClaimRequest::Session(_), TableStatus::Available) if !self.qr_active => {
                Err(TableError::QrDisabled(self.id))
            }
            (ClaimRequest::Session(_), TableStatus::Available)
            | (ClaimRequest::Seat(_), TableStatus::Available)
            | (ClaimRequest::Order { under: None, .. }, TableStatus::Available) => {
                self.status = TableStatus::Occupied;
                self.holder = Some(claimant);
                Ok(self.grant(false))
            }
            (ClaimRequest::Seat(reservation), TableStatus::Reserved)
                if self.holder == Some(Claimant::Reservation(reservation)) =>
            {
                self.status = TableStatus::Occupied;
                Ok(self.grant(false))
            }
            (ClaimRequest::Hold(_), TableStatus::Available) => {
                self.status = TableStatus::Reserved;
                self.holder = Some(claimant);
                Ok(self.grant(false))
            }
            (ClaimRequest::Hold(reservation), TableStatus::Reserved)
                if self.holder == Some(Claimant::Reservation(reservation)) =>
            {
                Ok(self.grant(true))
            }
            (ClaimRequest::Order { order, under: Some(under) }, TableStatus::Occupied)
                if self.holder == Some(under) =>
            {
                self.riders.insert(order);
                Ok(self.grant(true))
            }
            _ => Err(self.conflict()),
        }
    }

    /// Releases the table if `claimant` holds it. A rider order only leaves the rider set,
    /// and the holder is refused while riders remain. Anyone else releasing is a no-op,
    /// which makes release safe to repeat.
    pub fn release(&mut self, claimant: Claimant, cleaning: bool) -> Result<TableStatus, TableError> {
        if let Claimant::Order(order) = claimant {
            if self.riders.remove(&order) {
                debug!(table = %self.id, %order, riders = self.riders.len(), "Rider order left");
                return Ok(self.status);
            }
        }

        let holds = self.holder == Some(claimant) || self.blocked.is_some_and(|stash| stash.holder == Some(claimant));
        if holds && !self.riders.is_empty() {
            return Err(TableError::RidersOpen {
                table: self.id,
                holder: claimant,
                riders: self.riders.iter().copied().collect(),
            });
        }

        let after = |status: TableStatus| match status {
            TableStatus::Reserved => TableStatus::Available,
            _ if cleaning => TableStatus::Cleaning,
            _ => TableStatus::Available,
        };

        if let Some(stash) = self.blocked.as_mut() {
            if stash.holder == Some(claimant) {
                stash.status = after(stash.status);
                stash.holder = None;
            }
            return Ok(self.status);
        }
        if self.holder == Some(claimant) {
            self.status = after(self.status);
            self.holder = None;
        } else {
            debug!(table = %self.id, %claimant, holder = ?self.holder, "Release by non-holder ignored");
        }
        Ok(self.status)
    }

    pub fn mark_cleaned(&mut self) -> Result<TableStatus, TableError> {
        match self.status {
            TableStatus::Cleaning | TableStatus::Available => {
                self.status = TableStatus::Available;
                Ok(self.status)
            }
            from => Err(TableError::InvalidTransition {
                table: self.id,
                from,
                action: "mark cleaned",
            }),
        }
    }

    pub fn block(&mut self) -> TableStatus {
        if self.blocked.is_none() {
            self.blocked = Some(BlockedState {
                status: self.status,
                holder: self.holder.take(),
            });
            self.status = TableStatus::Blocked;
        }
        self.status
    }

    pub fn unblock(&mut self) -> Result<TableStatus, TableError> {
        let stash = self.blocked.take().ok_or(TableError::InvalidTransition {
            table: self.id,
            from: self.status,
            action: "unblock",
        })?;
        self.status = stash.status;
        self.holder = stash.holder;
        Ok(self.status)
    }

    pub fn retire(&mut self) -> Result<(), TableError> {
        let held = self.holder.is_some() || self.blocked.is_some_and(|stash| stash.holder.is_some());
        if held {
            return Err(self.conflict());
        }
        self.retired = true;
        self.qr_active = false;
        Ok(())
    }
}

#[async_trait]
impl ActorEntity for Table {
    type Id = TableId;
    type Create = TableCreate;
    type Update = TableUpdate;
    type Action = TableAction;
    type ActionResult = TableActionResult;
    type Context = ();
    type Error = TableError;

    fn from_create_params(id: TableId, params: TableCreate) -> Result<Self, TableError> {
        if params.number.trim().is_empty() {
            return Err(TableError::ValidationError("table number is required".into()));
        }
        if params.capacity == 0 {
            return Err(TableError::ValidationError("capacity must be at least 1".into()));
        }
        Ok(Self {
            id,
            number: params.number,
            branch_id: params.branch_id,
            capacity: params.capacity,
            location: params.location,
            status: TableStatus::Available,
            holder: None,
            riders: BTreeSet::new(),
            qr_active: params.qr_active,
            retired: false,
            blocked: None,
        })
    }

    async fn on_update(&mut self, update: TableUpdate, _ctx: &()) -> Result<(), TableError> {
        if let Some(number) = update.number {
            self.number = number;
        }
        if let Some(capacity) = update.capacity {
            if capacity == 0 {
                return Err(TableError::ValidationError("capacity must be at least 1".into()));
            }
            self.capacity = capacity;
        }
        if let Some(location) = update.location {
            self.location = Some(location);
        }
        Ok(())
    }

    async fn handle_action(&mut self, action: TableAction, _ctx: &()) -> Result<TableActionResult, TableError> {
        match action {
            TableAction::Claim(request) => self.claim(request).map(TableActionResult::Claim),
            TableAction::Release { claimant, cleaning } => {
                self.release(claimant, cleaning).map(TableActionResult::Release)
            }
            TableAction::MarkCleaned => self.mark_cleaned().map(TableActionResult::MarkCleaned),
            TableAction::Block => Ok(TableActionResult::Block(self.block())),
            TableAction::Unblock => self.unblock().map(TableActionResult::Unblock),
            TableAction::SetQrActive(active) => {
                if active && self.retired {
                    return Err(TableError::Retired(self.id));
                }
                self.qr_active = active;
                Ok(TableActionResult::SetQrActive(active))
            }
            TableAction::Retire => self.retire().map(TableActionResult::Retire),
        }
    }

    fn check_peers(&mut self, peers: &[&Self]) -> Result<(), TableError> {
        let duplicate = peers
            .iter()
            .any(|t| !t.retired && t.branch_id == self.branch_id && t.number == self.number);
        if duplicate && !self.retired {
            return Err(TableError::ValidationError(format!(
                "table number {} already exists in {}",
                self.number, self.branch_id
            )));
        }
        Ok(())
    }

    fn state_changes(&self, before: Option<&Self>) -> Vec<StateChange> {
        StateChange::between(
            EntityKind::Table,
            self.id,
            before.map(|t| t.status.as_str()),
            self.status.as_str(),
        )
        .into_iter()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BranchId, OrderId, ReservationId, SessionId};

    fn table() -> Table {
        Table::from_create_params(
            TableId(1),
            TableCreate {
                number: "T1".into(),
                branch_id: BranchId(1),
                capacity: 4,
                location: Some("Patio".into()),
                qr_active: true,
            },
        )
        .unwrap()
    }

    #[test]
    fn session_claim_is_exclusive_and_idempotent() {
        let mut t = table();
        let grant = t.claim(ClaimRequest::Session(SessionId(1))).unwrap();
        assert_eq!(grant.status, TableStatus::Occupied);
        assert!(!grant.already_held);

        assert!(t.claim(ClaimRequest::Session(SessionId(1))).unwrap().already_held);

        let err = t.claim(ClaimRequest::Session(SessionId(2))).unwrap_err();
        assert_eq!(
            err,
            TableError::Conflict {
                table: TableId(1),
                status: TableStatus::Occupied,
                holder: Some(Claimant::Session(SessionId(1))),
            }
        );
    }

    #[test]
    fn qr_disabled_table_refuses_sessions_but_not_staff() {
        let mut t = table();
        t.qr_active = false;
        assert_eq!(
            t.claim(ClaimRequest::Session(SessionId(1))).unwrap_err(),
            TableError::QrDisabled(TableId(1))
        );
        t.claim(ClaimRequest::Order { order: OrderId(1), under: None }).unwrap();
        assert_eq!(t.status, TableStatus::Occupied);
    }

    #[test]
    fn orders_ride_on_the_existing_holder() {
        let mut t = table();
        t.claim(ClaimRequest::Session(SessionId(7))).unwrap();

        let grant = t
            .claim(ClaimRequest::Order { order: OrderId(1), under: Some(Claimant::Session(SessionId(7))) })
            .unwrap();
        assert!(grant.already_held);
        assert_eq!(t.holder, Some(Claimant::Session(SessionId(7))));
        assert!(t.riders.contains(&OrderId(1)));

        let err = t
            .claim(ClaimRequest::Order { order: OrderId(2), under: Some(Claimant::Session(SessionId(8))) })
            .unwrap_err();
        assert!(matches!(err, TableError::Conflict { .. }));
    }

    #[test]
    fn reservation_hold_then_seat() {
        let mut t = table();
        t.claim(ClaimRequest::Hold(ReservationId(3))).unwrap();
        assert_eq!(t.status, TableStatus::Reserved);

        // Walk-ins and other parties are turned away.
        assert!(t.claim(ClaimRequest::Session(SessionId(1))).is_err());
        assert!(t.claim(ClaimRequest::Seat(ReservationId(4))).is_err());

        t.claim(ClaimRequest::Seat(ReservationId(3))).unwrap();
        assert_eq!(t.status, TableStatus::Occupied);
        assert_eq!(t.holder, Some(Claimant::Reservation(ReservationId(3))));
    }

    #[test]
    fn release_is_holder_only_and_repeatable() {
        let mut t = table();
        t.claim(ClaimRequest::Session(SessionId(1))).unwrap();

        assert_eq!(t.release(Claimant::Session(SessionId(2)), true), Ok(TableStatus::Occupied));
        assert_eq!(t.release(Claimant::Session(SessionId(1)), true), Ok(TableStatus::Cleaning));
        assert_eq!(t.release(Claimant::Session(SessionId(1)), true), Ok(TableStatus::Cleaning));
        assert_eq!(t.mark_cleaned().unwrap(), TableStatus::Available);
    }

    #[test]
    fn releasing_a_hold_skips_cleaning() {
        let mut t = table();
        t.claim(ClaimRequest::Hold(ReservationId(1))).unwrap();
        assert_eq!(t.release(Claimant::Reservation(ReservationId(1)), true), Ok(TableStatus::Available));
    }

    #[test]
    fn block_preserves_holder_and_absorbs_release() {
        let mut t = table();
        t.claim(ClaimRequest::Session(SessionId(1))).unwrap();
        assert_eq!(t.block(), TableStatus::Blocked);
        assert!(t.claim(ClaimRequest::Session(SessionId(2))).is_err());

        assert_eq!(t.unblock().unwrap(), TableStatus::Occupied);
        assert_eq!(t.holder, Some(Claimant::Session(SessionId(1))));

        t.block();
        t.release(Claimant::Session(SessionId(1)), true).unwrap();
        assert_eq!(t.unblock().unwrap(), TableStatus::Cleaning);
        assert_eq!(t.holder, None);
    }

    #[test]
    fn retired_tables_refuse_claims() {
        let mut t = table();
        t.claim(ClaimRequest::Session(SessionId(1))).unwrap();
        assert!(t.retire().is_err());
        t.release(Claimant::Session(SessionId(1)), false).unwrap();
        t.retire().unwrap();
        assert_eq!(
            t.claim(ClaimRequest::Order { order: OrderId(1), under: None }).unwrap_err(),
            TableError::Retired(TableId(1))
        );
    }

    #[test]
    fn duplicate_numbers_in_a_branch_are_rejected() {
        let existing = table();
        let mut fresh = table();
        fresh.id = TableId(2);
        assert!(fresh.check_peers(&[&existing]).is_err());
        fresh.branch_id = BranchId(2);
        assert!(fresh.check_peers(&[&existing]).is_ok());
    }

    #[test]
    fn holder_stays_until_riders_leave() {
        let mut t = table();
        t.claim(ClaimRequest::Order { order: OrderId(1), under: None }).unwrap();
        t.claim(ClaimRequest::Order { order: OrderId(2), under: Some(Claimant::Order(OrderId(1))) })
            .unwrap();

        let err = t.release(Claimant::Order(OrderId(1)), true).unwrap_err();
        assert_eq!(
            err,
            TableError::RidersOpen {
                table: TableId(1),
                holder: Claimant::Order(OrderId(1)),
                riders: vec![OrderId(2)],
            }
        );
        assert_eq!(t.status, TableStatus::Occupied);
        assert_eq!(t.holder, Some(Claimant::Order(OrderId(1))));

        // The rider leaving does not touch the table itself.
        assert_eq!(t.release(Claimant::Order(OrderId(2)), true), Ok(TableStatus::Occupied));
        assert!(t.riders.is_empty());
        assert_eq!(t.release(Claimant::Order(OrderId(1)), true), Ok(TableStatus::Cleaning));
    }

    #[test]
    fn riders_survive_a_block() {
        let mut t = table();
        t.claim(ClaimRequest::Session(SessionId(3))).unwrap();
        t.claim(ClaimRequest::Order { order: OrderId(4), under: Some(Claimant::Session(SessionId(3))) })
            .unwrap();
        t.block();

        assert!(t.release(Claimant::Session(SessionId(3)), true).is_err());
        t.release(Claimant::Order(OrderId(4)), true).unwrap();
        t.release(Claimant::Session(SessionId(3)), true).unwrap();
        assert_eq!(t.unblock().unwrap(), TableStatus::Cleaning);
    }
}
