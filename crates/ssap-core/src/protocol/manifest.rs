//! The fixed registration manifest.
//!
//! During pairing the TV requires a capability/permission declaration: app
//! identity, localized names, and two permission lists.  The structure and
//! every value in it are an external contract with the TV firmware — the TV
//! matches it against what it expects from a test-signed client, so it must be
//! reproduced verbatim, not assembled from domain logic.  It is therefore
//! stored here as an opaque, versioned JSON constant.

use serde_json::{json, Value};
use std::sync::OnceLock;

/// Manifest schema version (the `manifestVersion` field below).
pub const MANIFEST_VERSION: u32 = 1;

/// The registration manifest, verbatim.
///
/// Do not edit individual fields: the permission lists and the signed block
/// (including its serial) are what the TV firmware accepts for a generic
/// remote-control client.
const MANIFEST_JSON: &str = r#"{
  "manifestVersion": 1,
  "appVersion": "1.0.0",
  "signed": {
    "created": "20140509",
    "appId": "com.lge.test",
    "vendorId": "com.lge",
    "localizedAppNames": {
      "": "LG Remote App",
      "ko-KR": "리모컨 앱",
      "zxx-XX": "ЛГ Rэмotэ AПП"
    },
    "localizedVendorNames": {
      "": "LG Electronics"
    },
    "permissions": [
      "TEST_SECURE",
      "CONTROL_INPUT_TEXT",
      "CONTROL_MOUSE_AND_KEYBOARD",
      "READ_INSTALLED_APPS",
      "READ_LGE_SDX",
      "READ_NOTIFICATIONS",
      "SEARCH",
      "WRITE_SETTINGS",
      "WRITE_NOTIFICATIONS",
      "CONTROL_POWER",
      "READ_CURRENT_CHANNEL",
      "READ_RUNNING_APPS"
    ],
    "serial": "2f930e2d2cfe083771f68e4fe7bb07"
  },
  "permissions": [
    "LAUNCH",
    "LAUNCH_WEBAPP",
    "APP_TO_APP",
    "CLOSE",
    "TEST_OPEN",
    "TEST_PROTECTED",
    "CONTROL_AUDIO",
    "CONTROL_DISPLAY",
    "CONTROL_INPUT_JOYSTICK",
    "CONTROL_INPUT_MEDIA_RECORDING",
    "CONTROL_INPUT_MEDIA_PLAYBACK",
    "CONTROL_INPUT_TV",
    "CONTROL_POWER",
    "READ_APP_STATUS",
    "READ_CURRENT_CHANNEL",
    "READ_INPUT_DEVICE_LIST",
    "READ_NETWORK_STATE",
    "READ_RUNNING_APPS",
    "READ_TV_CHANNEL_LIST",
    "WRITE_NOTIFICATION_TOAST",
    "READ_POWER_STATE",
    "READ_COUNTRY_INFO"
  ]
}"#;

/// Returns the parsed manifest value.
pub fn manifest() -> &'static Value {
    static PARSED: OnceLock<Value> = OnceLock::new();
    // Safe to expect: MANIFEST_JSON is a compile-time constant known to be
    // valid JSON (covered by tests).
    PARSED.get_or_init(|| serde_json::from_str(MANIFEST_JSON).expect("manifest constant is valid JSON"))
}

/// Builds the payload of a `register` frame.
///
/// `client_key` is the stored pairing credential, or the empty string when no
/// pairing has happened yet — the TV treats an empty key as a first-time
/// pairing and shows the on-screen confirmation prompt.
pub fn register_payload(client_key: &str) -> Value {
    json!({
        "forcePairing": false,
        "pairingType": "PROMPT",
        "client-key": client_key,
        "manifest": manifest(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_constant_parses() {
        let m = manifest();
        assert_eq!(m["manifestVersion"], MANIFEST_VERSION);
        assert_eq!(m["appVersion"], "1.0.0");
    }

    #[test]
    fn test_manifest_signed_block_is_verbatim() {
        // The TV validates these exact values; a drift here breaks pairing.
        let signed = &manifest()["signed"];
        assert_eq!(signed["appId"], "com.lge.test");
        assert_eq!(signed["vendorId"], "com.lge");
        assert_eq!(signed["serial"], "2f930e2d2cfe083771f68e4fe7bb07");
        assert_eq!(signed["permissions"].as_array().unwrap().len(), 12);
    }

    #[test]
    fn test_manifest_has_full_permission_list() {
        let perms = manifest()["permissions"].as_array().unwrap();
        assert_eq!(perms.len(), 22);
        assert!(perms.contains(&serde_json::Value::from("CONTROL_POWER")));
        assert!(perms.contains(&serde_json::Value::from("CONTROL_AUDIO")));
    }

    #[test]
    fn test_register_payload_embeds_key_and_manifest() {
        // Arrange / Act
        let payload = register_payload("my-key");

        // Assert
        assert_eq!(payload["forcePairing"], false);
        assert_eq!(payload["pairingType"], "PROMPT");
        assert_eq!(payload["client-key"], "my-key");
        assert_eq!(payload["manifest"]["manifestVersion"], MANIFEST_VERSION);
    }

    #[test]
    fn test_register_payload_with_empty_key() {
        // First-time pairing sends an empty string, not a missing field.
        let payload = register_payload("");
        assert_eq!(payload["client-key"], "");
    }
}
