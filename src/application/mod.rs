//! Application layer - Use cases
//! 
//! This layer contains:
//! - Services: The user registry
//! - Errors: Domain-specific errors
//! - Messaging: Routing inbound events and outbound sends

pub mod errors;
pub mod services;
pub mod messaging;
