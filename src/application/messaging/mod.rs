//! Message handling - Inbound registration and outbound delivery

pub mod dispatcher;

pub use dispatcher::{BroadcastReport, Dispatcher, UpdateOutcome};
