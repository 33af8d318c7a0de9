//! Application layer: the protocol session and the command dispatcher.

pub mod commands;
pub mod session;

pub use commands::TvCommand;
pub use session::TvSession;
