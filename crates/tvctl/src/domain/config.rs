//! Session configuration.
//!
//! [`ClientConfig`] is the single source of truth for runtime settings.  It is
//! a plain struct populated from CLI arguments by the binary (no global state,
//! no environment reads inside the domain), which keeps the session easy to
//! construct in tests.

use std::time::Duration;

use ssap_core::DeviceEndpoint;

/// All runtime configuration for one TV session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Address of the TV's SSAP endpoint.  Immutable for the session.
    pub endpoint: DeviceEndpoint,

    /// Bound on connection establishment and on each individual request.
    ///
    /// The original protocol clients used 10 seconds for everything except
    /// pairing.
    pub request_timeout: Duration,

    /// Bound on the registration handshake.
    ///
    /// Longer than [`request_timeout`](Self::request_timeout) because the TV
    /// waits for the user to accept the on-screen pairing prompt.
    pub pairing_timeout: Duration,
}

impl ClientConfig {
    /// Returns a config for `endpoint` with the standard timeouts
    /// (10 s requests, 30 s pairing).
    pub fn for_endpoint(endpoint: DeviceEndpoint) -> Self {
        Self {
            endpoint,
            request_timeout: Duration::from_secs(10),
            pairing_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for ClientConfig {
    /// Defaults suitable for local development and tests: loopback endpoint,
    /// standard timeouts.
    fn default() -> Self {
        Self::for_endpoint(DeviceEndpoint::with_default_port("127.0.0.1"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
