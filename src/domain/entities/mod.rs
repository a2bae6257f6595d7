//! Domain entities - Core business objects with no external dependencies

pub mod event;
pub mod user;

pub use event::{ChatRef, Contact, InboundEvent, IncomingMessage, Sender};
pub use user::UserRecord;
