//! Domain events bridge for the web server.
//!
//! The server has no background workers, so events are only logged.

mod sink;

pub use sink::LoggingDomainEventSink;
