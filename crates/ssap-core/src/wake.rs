//! Wake-on-LAN magic-packet construction.
//!
//! A powered-down network interface with WoL enabled listens for a fixed
//! broadcast payload: 6 bytes of `0xFF` followed by the interface's hardware
//! address repeated 16 times — 102 bytes total.  This module builds that
//! payload; actually broadcasting it is the application's job (the packet is
//! conventionally sent as a UDP datagram to ports 7 and 9).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Size of a magic packet in bytes: 6 + 16 × 6.
pub const MAGIC_PACKET_LEN: usize = 102;

/// UDP ports the wake packet is conventionally broadcast to (echo and discard).
pub const WAKE_PORTS: [u16; 2] = [7, 9];

/// Errors produced while parsing a hardware address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WakeError {
    /// The address does not have exactly six octets.
    #[error("invalid MAC address {input:?}: expected 6 octets, got {octets}")]
    WrongOctetCount { input: String, octets: usize },

    /// An octet is not a two-digit hex number.
    #[error("invalid MAC address {input:?}: {octet:?} is not a hex octet")]
    BadOctet { input: String, octet: String },
}

/// A six-byte IEEE 802 hardware (MAC) address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Returns the raw six bytes.
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddr {
    type Err = WakeError;

    /// Parses `AA:BB:CC:DD:EE:FF` or `AA-BB-CC-DD-EE-FF` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sep = if s.contains('-') { '-' } else { ':' };
        let parts: Vec<&str> = s.split(sep).collect();
        if parts.len() != 6 {
            return Err(WakeError::WrongOctetCount {
                input: s.to_string(),
                octets: parts.len(),
            });
        }

        let mut octets = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 {
                return Err(WakeError::BadOctet {
                    input: s.to_string(),
                    octet: part.to_string(),
                });
            }
            octets[i] = u8::from_str_radix(part, 16).map_err(|_| WakeError::BadOctet {
                input: s.to_string(),
                octet: part.to_string(),
            })?;
        }
        Ok(MacAddr(octets))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

/// Builds the 102-byte magic packet for `mac`.
///
/// Layout: bytes `[0..6)` are `0xFF`; bytes `[6 + 6k .. 6 + 6k + 6)` are the
/// address, for `k` in `0..16`.
pub fn magic_packet(mac: &MacAddr) -> [u8; MAGIC_PACKET_LEN] {
    let mut packet = [0u8; MAGIC_PACKET_LEN];
    packet[..6].fill(0xFF);
    for k in 0..16 {
        packet[6 + k * 6..6 + k * 6 + 6].copy_from_slice(&mac.0);
    }
    packet
}

// ── Tests ─────────────────────────────────────────────────────────────────────
