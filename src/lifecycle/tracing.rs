//! # Observability & Tracing
//!
//! [`setup_tracing`] installs structured logging with the `tracing` crate. Every actor
//! request runs inside a span, so a QR checkout shows up as one hierarchy across the
//! Session, Order and Table actors.
//!
//! The subscriber uses a compact format that hides the crate/module prefix
//! (`with_target(false)`); the `entity_type` field already says which actor logged.
//!
//! ## Usage
//!
//! ```bash
//! # Outcomes only: created, action ok, transitions
//! RUST_LOG=info cargo run
//!
//! # Full payloads at the start of each request
//! RUST_LOG=debug cargo run
//!
//! # Only the engine
//! RUST_LOG=dinein_core::framework=debug cargo run
//! ```
//!
//! ## A checkout at `info`
//!
//! ```text
//! INFO Action ok entity_type="QrSession" id=session_1
//! INFO Sending create_order to actor
//! INFO Action ok entity_type="Table" id=table_3
//! INFO Order placed order=order_1 number=ORD-20300517-00001 total=240.00
//! INFO Created entity_type="Order" id=order_1 size=1
//! INFO Checkout committed order=order_1 lines=2
//! ```
//!
//! The table claim happens inside `Order::on_create`, so it is logged before the order
//! itself is stored. State changes are additionally published as
//! [`TransitionEvent`](crate::framework::TransitionEvent)s for notification consumers.

/// Initializes the global subscriber, filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
