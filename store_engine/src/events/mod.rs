//! Fire-and-forget notifications about cart, stock and order changes.
//!
//! The engine APIs publish events through [`EventProducers`]. Consumers register async closures on [`EventHooks`],
//! which [`EventHandlers`] turns into channel-backed workers. A slow or failing hook never blocks or fails the operation
//! that triggered it.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
