//! Infrastructure layer: everything that touches a socket or the filesystem.

pub mod arp;
pub mod keystore;
pub mod transport;
pub mod wol;
