//! Domain layer - Core business objects and ports
//! 
//! This layer contains:
//! - Entities: Core business objects (UserRecord, InboundEvent)
//! - Traits: Abstractions for infrastructure (Bot, UserStore)

pub mod entities;
pub mod traits;
