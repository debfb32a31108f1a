//! In-process event hooks.
//!
//! Events are published after a unit of work has been committed. They are never part of the transaction, so a slow
//! or failing hook cannot affect the outcome of a claim or a payment event.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
