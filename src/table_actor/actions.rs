//! Custom actions for the Table actor.
//!
//! Every transition of a [`Table`](crate::model::Table) goes through one of these actions, so
//! the table actor is the single point where claim races are decided.

use crate::model::{BranchId, ClaimRequest, Claimant, TableStatus};

#[derive(Debug, Clone)]
pub enum TableAction {
    /// Atomically claim the table. Fails with `Conflict` if the table is not claimable.
    Claim(ClaimRequest),
    /// Give the table back. A rider order leaves the rider set; the holder is refused while
    /// riders remain; anyone else releasing is a no-op.
    Release { claimant: Claimant, cleaning: bool },
    /// CLEANING -> AVAILABLE.
    MarkCleaned,
    /// Take the table out of service, remembering who held it.
    Block,
    /// Restore the state the table had before it was blocked.
    Unblock,
    SetQrActive(bool),
    /// Soft delete. Only an unheld table can be retired.
    Retire,
}

/// What a successful claim hands back to the claimant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimGrant {
    pub status: TableStatus,
    pub branch_id: BranchId,
    pub capacity: u32,
    /// The claimant already held the table; nothing changed.
    pub already_held: bool,
}

/// Results from TableActions - variants match 1:1 with TableAction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableActionResult {
    Claim(ClaimGrant),
    Release(TableStatus),
    MarkCleaned(TableStatus),
    Block(TableStatus),
    Unblock(TableStatus),
    SetQrActive(bool),
    Retire(()),
}
