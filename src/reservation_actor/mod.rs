//! Reservation Scheduler: time-window bookings against tables.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::clients::ReservationClient;
use crate::framework::ResourceActor;
use crate::model::Reservation;

/// Creates a new Reservation actor and its client.
pub fn new(buffer_size: usize, default_minutes: u32) -> (ResourceActor<Reservation>, ReservationClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size);
    let client = ReservationClient::new(generic_client, default_minutes);

    (actor, client)
}
