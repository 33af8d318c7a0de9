//! The error taxonomy surfaced by the session.
//!
//! Each variant maps to a different user remediation, so callers (and the CLI)
//! can tell "power the TV on" apart from "re-pair" apart from "just retry":
//!
//! | Variant            | Remediation                                    |
//! |--------------------|------------------------------------------------|
//! | `Connect`          | TV unreachable — power it on / check the IP    |
//! | `Timeout`          | No reply in time — retry                       |
//! | `PairingRejected`  | Declined on screen — re-run pairing            |
//! | `NotAuthenticated` | No pairing yet — run `tvctl pair` first        |
//! | `Device`           | TV executed the request and said no            |

use std::time::Duration;

use thiserror::Error;

use ssap_core::protocol::messages::WireError;

/// All failures a session can surface to its caller.
#[derive(Debug, Error)]
pub enum TvError {
    /// The WebSocket connection could not be established.
    #[error("failed to connect to TV at {endpoint}: {detail}")]
    Connect { endpoint: String, detail: String },

    /// The operation (connect, pairing, or a single request) ran out of time.
    #[error("operation timed out after {0:.0?}")]
    Timeout(Duration),

    /// The TV refused the registration (e.g., the user declined the on-screen
    /// prompt, or the stored credential was revoked).
    #[error("TV rejected the pairing request: {0}")]
    PairingRejected(String),

    /// A request was submitted before the pairing handshake completed.
    #[error("not authenticated with the TV; pair first")]
    NotAuthenticated,

    /// The transport is not in the connected state.
    #[error("not connected to the TV")]
    NotConnected,

    /// The session was closed (or the transport failed) while the operation
    /// was still pending.
    #[error("connection closed while the operation was pending")]
    ConnectionClosed,

    /// The TV executed the request and returned an explicit error payload.
    #[error("TV returned an error: {0}")]
    Device(String),

    /// An SSAP frame failed to serialize or parse.  Inbound parse failures are
    /// dropped at the router and never reach callers; this surfaces only from
    /// outbound serialization.
    #[error(transparent)]
    Wire(#[from] WireError),
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_message_names_the_endpoint() {
        let err = TvError::Connect {
            endpoint: "10.0.0.61:3000".to_string(),
            detail: "connection refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("10.0.0.61:3000"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_pairing_rejection_is_distinguishable_from_timeout() {
        // The CLI prints these to the user; they must not read alike.
        let rejected = TvError::PairingRejected("denied".to_string()).to_string();
        let timed_out = TvError::Timeout(Duration::from_secs(30)).to_string();
        assert!(rejected.contains("rejected"));
        assert!(timed_out.contains("timed out"));
        assert_ne!(rejected, timed_out);
    }

    #[test]
    fn test_wire_error_converts() {
        let wire = WireError::Malformed {
            detail: "bad tag".to_string(),
        };
        let err: TvError = wire.into();
        assert!(matches!(err, TvError::Wire(_)));
    }
}
