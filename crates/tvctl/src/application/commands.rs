//! Maps user actions to SSAP operations.
//!
//! Each command is one `ssap://` URI plus optional parameters.  The mapping
//! is deliberately dumb: no name aliasing, no retries — the session owns all
//! protocol state and the CLI owns all presentation.

use serde_json::{json, Value};

use crate::application::session::TvSession;
use crate::domain::error::TvError;

/// A user-facing TV action.
#[derive(Debug, Clone, PartialEq)]
pub enum TvCommand {
    /// Turn the TV off.
    Off,
    /// Fetch system information.
    Info,
    /// Switch to an input source (`HDMI_1`, `HDMI_2`, …).
    Input(String),
    /// Launch an app by its webOS app id (e.g. `netflix`,
    /// `youtube.leanback.v4`).
    App(String),
    /// Set the volume (0–100).
    Volume(u8),
    /// Mute the audio.
    Mute,
}

impl TvCommand {
    /// The SSAP operation URI for this command.
    pub fn uri(&self) -> &'static str {
        match self {
            TvCommand::Off => "ssap://system/turnOff",
            TvCommand::Info => "ssap://system/getSystemInfo",
            TvCommand::Input(_) => "ssap://tv/switchInput",
            TvCommand::App(_) => "ssap://system.launcher/launch",
            TvCommand::Volume(_) => "ssap://audio/setVolume",
            TvCommand::Mute => "ssap://audio/setMute",
        }
    }

    /// Request parameters, when the operation takes any.
    pub fn params(&self) -> Option<Value> {
        match self {
            TvCommand::Off | TvCommand::Info => None,
            TvCommand::Input(input_id) => Some(json!({ "inputId": input_id })),
            TvCommand::App(app_id) => Some(json!({ "id": app_id })),
            TvCommand::Volume(level) => Some(json!({ "volume": level })),
            TvCommand::Mute => Some(json!({ "mute": true })),
        }
    }

    /// One-line confirmation printed on success.
    pub fn success_message(&self) -> String {
        match self {
            TvCommand::Off => "TV turned off".to_string(),
            TvCommand::Info => "TV info retrieved".to_string(),
            TvCommand::Input(input_id) => format!("switched to {input_id}"),
            TvCommand::App(app_id) => format!("launched {app_id}"),
            TvCommand::Volume(level) => format!("volume set to {level}"),
            TvCommand::Mute => "TV muted".to_string(),
        }
    }
}

/// Executes `command` on an authenticated session and returns the TV's
/// response payload.
pub async fn execute(session: &TvSession, command: &TvCommand) -> Result<Value, TvError> {
    session.request(command.uri(), command.params()).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
