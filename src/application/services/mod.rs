//! Application services - Shared state behind the dispatcher

pub mod registry;

pub use registry::UserRegistry;
