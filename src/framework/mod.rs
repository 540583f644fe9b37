//! Generic actor framework for resource management.
//!
//! This module provides the core building blocks for creating type-safe actor systems
//! that manage resource entities with create/read/update operations and custom actions.
//!
//! # Main Components
//!
//! - [`ActorEntity`] - Trait that resource types implement to be managed by actors
//! - [`ResourceActor`] - Generic actor that manages entities
//! - [`ResourceClient`] - Type-safe handle for sending requests to an actor
//! - [`FrameworkError`] - Transport errors plus the entity's own typed error
//! - [`TransitionBus`] - Broadcast of committed state transitions
//!
//! # Testing
//!
//! See [`mock`] module for utilities to test clients without spawning full actors.

pub mod core;
pub mod events;
pub mod mock;

// Re-export core types for convenience
pub use self::core::*;
pub use events::{EntityKind, StateChange, TransitionBus, TransitionEvent};
