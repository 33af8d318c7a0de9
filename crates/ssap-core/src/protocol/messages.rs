//! SSAP protocol message types.
//!
//! Every frame on the wire is a JSON object tagged by a `type` field:
//!
//! ```text
//! {"type": "register",   "id": "register_0", "payload": {…manifest…}}
//! {"type": "registered", "id": "register_0", "payload": {"client-key": "…"}}
//! {"type": "request",    "id": "req_1", "uri": "ssap://system/turnOff"}
//! {"type": "response",   "id": "req_1", "payload": {…}}
//! {"type": "error",      "id": "req_1", "error": "401 insufficient permissions"}
//! ```
//!
//! `register` and `request` flow client → TV; the rest flow TV → client.
//! The `id` is the correlation id linking a request to its eventual reply.
//! A `registered` frame may arrive without an id (the TV sends it unsolicited
//! after the user confirms the pairing prompt), so the field is optional on
//! inbound messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors produced when translating between JSON text and [`SsapMessage`].
#[derive(Debug, Error, PartialEq)]
pub enum WireError {
    /// The frame is not valid JSON or does not match the tagged-variant shape.
    #[error("malformed SSAP frame: {detail}")]
    Malformed { detail: String },

    /// An outbound message could not be serialized.
    #[error("failed to serialize SSAP frame: {detail}")]
    Serialize { detail: String },
}

/// Payload of a `registered` frame.
///
/// `client-key` is present when the TV issues a fresh pairing credential and
/// absent when it accepted an already-valid stored one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredPayload {
    #[serde(rename = "client-key", default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
}

/// All SSAP frames, discriminated by the JSON `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SsapMessage {
    /// Client → TV: pairing handshake carrying the credential and manifest.
    Register {
        id: String,
        /// Opaque registration payload; built by
        /// [`crate::protocol::manifest::register_payload`].
        payload: Value,
    },

    /// TV → client: pairing accepted.
    Registered {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<RegisteredPayload>,
    },

    /// Client → TV: invoke an `ssap://` operation.
    Request {
        id: String,
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },

    /// TV → client: successful reply to a `request`.
    Response {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },

    /// TV → client: explicit failure, either for one request (id present) or
    /// for the pairing handshake.
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
}

impl SsapMessage {
    /// Parses one JSON text frame into a typed message.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Malformed`] when the text is not valid JSON or
    /// carries an unknown `type` tag.  The caller decides whether that is
    /// fatal; the session router logs and drops such frames.
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        serde_json::from_str(text).map_err(|e| WireError::Malformed {
            detail: e.to_string(),
        })
    }

    /// Serializes this message to the JSON text sent over the WebSocket.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Serialize`] if serialization fails (only possible
    /// if a caller-supplied payload `Value` contains a non-string map key).
    pub fn to_json(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(|e| WireError::Serialize {
            detail: e.to_string(),
        })
    }

    /// Returns the wire `type` tag for this message.
    pub fn message_type(&self) -> &'static str {
        match self {
            SsapMessage::Register { .. } => "register",
            SsapMessage::Registered { .. } => "registered",
            SsapMessage::Request { .. } => "request",
            SsapMessage::Response { .. } => "response",
            SsapMessage::Error { .. } => "error",
        }
    }

    /// Returns the correlation id carried by this message, if any.
    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            SsapMessage::Register { id, .. } | SsapMessage::Request { id, .. } => Some(id),
            SsapMessage::Response { id, .. } => Some(id),
            SsapMessage::Registered { id, .. } | SsapMessage::Error { id, .. } => id.as_deref(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
