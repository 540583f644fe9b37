//! Runtime orchestration: configuration, actor wiring, background sweeps and tracing.
//!
//! - [`RestaurantSystem`] starts every actor and wires their dependencies.
//! - [`Reaper`] expires idle sessions and holds tables for upcoming reservations.
//! - [`SystemConfig`] reads settings from the environment.
//! - [`setup_tracing`] initializes logging.

pub mod config;
pub mod reaper;
pub mod restaurant_system;
pub mod tracing;

pub use config::*;
pub use reaper::*;
pub use restaurant_system::*;
pub use self::tracing::setup_tracing;
