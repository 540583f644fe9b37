//! Pure data structures (DTOs) managed by the actors.
//!
//! Each entity implements [`ActorEntity`](crate::framework::ActorEntity) in its actor module.
//! Ids are `u32` newtypes that display with their kind (`table_3`, `order_12`).

pub mod order;
pub mod reservation;
pub mod session;
pub mod table;

pub use order::*;
pub use reservation::*;
pub use session::*;
pub use table::*;
