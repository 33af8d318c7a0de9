//! # ssap-core
//!
//! Shared library for tvctl containing the SSAP wire protocol types, the
//! fixed registration manifest, correlation-id allocation, and the
//! wake-on-LAN magic-packet builder.
//!
//! This crate is pure data and logic: it has zero dependencies on sockets,
//! the filesystem, or an async runtime.  Everything that touches the network
//! lives in the `tvctl` application crate.
//!
//! # Protocol overview
//!
//! webOS TVs expose a control API called SSAP (Simple Service Access
//! Protocol): tagged JSON messages over a persistent WebSocket connection on
//! port 3000.  A client first sends a `register` message carrying a pairing
//! credential (the *client key*) and a fixed capability manifest; the TV
//! replies — possibly after the user confirms on screen — with a `registered`
//! message.  After that, the client issues `request` messages against
//! `ssap://` URIs and matches `response`/`error` replies to requests by
//! correlation id.
//!
//! - **`protocol`** – message types for the wire, the registration manifest,
//!   and the correlation-id counter.
//! - **`domain`** – pure entity types; currently the device endpoint.
//! - **`wake`** – the 102-byte wake-on-LAN magic packet and MAC address
//!   parsing.

pub mod domain;
pub mod protocol;
pub mod wake;

// Re-export the most-used types at the crate root so callers can write
// `ssap_core::SsapMessage` instead of the full module path.
pub use domain::endpoint::DeviceEndpoint;
pub use protocol::correlation::{CorrelationCounter, REGISTER_ID};
pub use protocol::manifest::register_payload;
pub use protocol::messages::{SsapMessage, WireError};
pub use wake::{magic_packet, MacAddr, WakeError, MAGIC_PACKET_LEN, WAKE_PORTS};
