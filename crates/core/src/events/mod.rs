//! Domain events module.
//!
//! Services emit events through an injected [`DomainEventSink`] after
//! successful mutations. Runtime adapters decide what to do with them.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
