//! Order Lifecycle Engine and Payment Ledger.
//!
//! One actor owns every order together with its items and payments. Item transitions,
//! totals and payment checks for an order are therefore serialized with each other.

mod actions;
pub mod entity;
pub mod error;
pub mod ledger;
pub mod status;

pub use actions::*;
pub use error::*;

use crate::clients::{LedgerClient, OrderClient, TableClient};
use crate::framework::ResourceActor;
use crate::model::Order;
use crate::pricing::ChargePolicy;
use std::sync::Arc;

/// Dependencies injected into the Order actor.
#[derive(Clone)]
pub struct OrderContext {
    pub tables: TableClient,
    pub pricing: Arc<dyn ChargePolicy>,
}

/// Creates a new Order actor with its order and ledger clients.
pub fn new(buffer_size: usize) -> (ResourceActor<Order>, OrderClient, LedgerClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size);
    let ledger = LedgerClient::new(generic_client.clone());
    let client = OrderClient::new(generic_client);

    (actor, client, ledger)
}
