//! # Dine-in Core
//!
//! > **Table, QR session, reservation, order and payment state for a restaurant floor.**
//!
//! Guests scan a table's QR code to open a session, build a cart and check it out into an
//! order. Staff take reservations, seat guests, move items through the kitchen and record
//! payments. This crate owns the consistency of all of that state.
//!
//! ## 🏗️ Design
//!
//! Each entity family is held by one generic [`ResourceActor`](framework::ResourceActor) running
//! in its own Tokio task. An actor processes requests strictly one at a time, so every
//! transition of a table, session, reservation or order is an atomic read-validate-write:
//! mutations run against a working copy that is committed only if every check passed.
//!
//! The Table actor is the single arbiter of who holds a table. Sessions, reservations and
//! orders all claim and release tables through it, and a claim is a tagged
//! [`Claimant`](model::Claimant) checked by pattern matching.
//!
//! Derived fields are never set directly. An order's status follows its slowest active item
//! and its payment status is recomputed from the ledger after every change.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! The generic actor, its request types, the [`TransitionBus`](framework::TransitionBus) that
//! carries state-change notifications, and [`MockClient`](framework::mock::MockClient) for tests.
//!
//! ### 2. The Actors ([`table_actor`], [`session_actor`], [`reservation_actor`], [`order_actor`])
//! Each implements [`ActorEntity`](framework::ActorEntity) for one model type and defines its
//! actions and error enum.
//!
//! ### 3. The Interface ([`clients`], [`coordinator`])
//! Typed clients hide message passing. The [`Coordinator`](coordinator::Coordinator) runs the
//! workflows that span actors, with compensation when a later step fails.
//!
//! ### 4. The Orchestrator ([`lifecycle`])
//! [`RestaurantSystem`](lifecycle::RestaurantSystem) wires everything from a
//! [`SystemConfig`](lifecycle::SystemConfig) and runs the background reaper.
//!
//! ## Errors
//!
//! Every error implements [`Classify`](error::Classify), mapping it onto a small set of
//! [`ErrorKind`](error::ErrorKind)s (`Conflict`, `Overpayment`, `NotFound`, ...) that an API
//! layer can translate into status codes.
//!
//! ## 🚀 Running
//!
//! ```bash
//! RUST_LOG=info cargo run
//! cargo test
//! ```

pub mod clients;
pub mod coordinator;
pub mod error;
pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod money;
pub mod order_actor;
pub mod pricing;
pub mod reservation_actor;
pub mod session_actor;
pub mod table_actor;
