//! Type-safe wrappers around [`ResourceClient`](crate::framework::ResourceClient).

pub mod actor_client;
pub mod ledger_client;
pub mod order_client;
pub mod reservation_client;
pub mod session_client;
pub mod table_client;

pub use actor_client::ActorClient;
pub use ledger_client::LedgerClient;
pub use order_client::OrderClient;
pub use reservation_client::{BookingRequest, ReservationClient};
pub use session_client::SessionClient;
pub use table_client::TableClient;
