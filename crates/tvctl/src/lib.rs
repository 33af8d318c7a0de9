//! tvctl library crate.
//!
//! Command-line remote control for webOS TVs: pairs with the TV over the
//! SSAP WebSocket protocol, persists the pairing credential, and issues
//! correlated request/response exchanges over one persistent connection.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! tvctl CLI (clap)
//!         ↕
//! [tvctl]
//!   ├── domain/           Pure types: ClientConfig, TvError
//!   ├── application/      TvSession (pairing + request multiplexing),
//!   │                     command dispatcher
//!   └── infrastructure/
//!         ├── transport/  WebSocket connection (tokio-tungstenite)
//!         ├── keystore/   Per-device credential files
//!         └── wol/        Wake-on-LAN UDP broadcast
//!         ↕
//! webOS TV (SSAP JSON over WebSocket, port 3000)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `ssap-core`; its only I/O happens
//!   through the transport handed to it.
//! - `infrastructure` depends on all other layers plus `tokio` and
//!   `tungstenite`.

/// Domain layer: configuration and the error taxonomy.
pub mod domain;

/// Application layer: the protocol session and command dispatch.
pub mod application;

/// Infrastructure layer: WebSocket transport, credential store, wake sender.
pub mod infrastructure;

pub use application::session::TvSession;
pub use domain::config::ClientConfig;
pub use domain::error::TvError;
