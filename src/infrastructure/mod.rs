//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Registry persistence
//! - Adapters: Platform integrations (Telegram)
//! - Http: Push endpoints for external senders

pub mod config;
pub mod storage;
pub mod adapters;
pub mod http;
