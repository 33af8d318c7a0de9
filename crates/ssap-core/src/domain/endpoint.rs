//! The device endpoint: where the TV lives on the network.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default SSAP WebSocket port on webOS TVs.
pub const DEFAULT_SSAP_PORT: u16 = 3000;

/// A TV's network address, immutable for the lifetime of a session.
///
/// The host is kept as a string rather than an `IpAddr` so hostnames work
/// too (the WebSocket client resolves them).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceEndpoint {
    pub host: String,
    pub port: u16,
}

impl DeviceEndpoint {
    /// Creates an endpoint with an explicit port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Creates an endpoint on the default SSAP port (3000).
    pub fn with_default_port(host: impl Into<String>) -> Self {
        Self::new(host, DEFAULT_SSAP_PORT)
    }

    /// Returns the `ws://host:port` URL the transport connects to.
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }

    /// Returns a deterministic, filesystem-safe identifier for this device.
    ///
    /// Used by the credential store to derive the key-file name, so re-running
    /// against the same device reuses the same credential.  Dots and colons
    /// are replaced with underscores (`10.0.0.61` → `10_0_0_61`), matching the
    /// key-file naming the protocol's reference clients established.
    pub fn slug(&self) -> String {
        self.host
            .chars()
            .map(|c| if c == '.' || c == ':' { '_' } else { c })
            .collect()
    }
}

impl fmt::Display for DeviceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_is_3000() {
        let ep = DeviceEndpoint::with_default_port("10.0.0.61");
        assert_eq!(ep.port, 3000);
    }

    #[test]
    fn test_ws_url_formation() {
        let ep = DeviceEndpoint::new("10.0.0.61", 3000);
        assert_eq!(ep.ws_url(), "ws://10.0.0.61:3000");
    }

    #[test]
    fn test_slug_replaces_dots() {
        let ep = DeviceEndpoint::with_default_port("10.0.0.61");
        assert_eq!(ep.slug(), "10_0_0_61");
    }

    #[test]
    fn test_slug_replaces_ipv6_colons() {
        let ep = DeviceEndpoint::new("fe80::1", 3000);
        assert_eq!(ep.slug(), "fe80__1");
    }

    #[test]
    fn test_slug_is_deterministic() {
        // The same endpoint must always map to the same key file.
        let a = DeviceEndpoint::with_default_port("192.168.1.50");
        let b = DeviceEndpoint::with_default_port("192.168.1.50");
        assert_eq!(a.slug(), b.slug());
    }

    #[test]
    fn test_display_includes_port() {
        let ep = DeviceEndpoint::new("tv.local", 3001);
        assert_eq!(ep.to_string(), "tv.local:3001");
    }
}
