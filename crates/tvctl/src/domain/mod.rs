//! Domain layer: pure types with no I/O.

pub mod config;
pub mod error;

pub use config::ClientConfig;
pub use error::TvError;
