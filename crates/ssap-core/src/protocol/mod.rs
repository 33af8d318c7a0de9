//! SSAP wire protocol: message types, the registration manifest, and
//! correlation-id allocation.

pub mod correlation;
pub mod manifest;
pub mod messages;

pub use correlation::{CorrelationCounter, REGISTER_ID};
pub use messages::{SsapMessage, WireError};
