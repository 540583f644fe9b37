//! QR Session Manager: guest sessions opened by scanning a table QR, their carts, and
//! their idle expiry.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::clients::SessionClient;
use crate::framework::ResourceActor;
use crate::model::QrSession;
use chrono::TimeDelta;

/// Creates a new Session actor and its client.
pub fn new(buffer_size: usize, idle_timeout: TimeDelta) -> (ResourceActor<QrSession>, SessionClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size);
    let client = SessionClient::new(generic_client, idle_timeout);

    (actor, client)
}
