//! Per-device credential persistence.
//!
//! The TV issues an opaque *client key* on first successful pairing; storing
//! it lets later runs skip the on-screen confirmation.  Each device gets one
//! plain-text file — the entire trimmed file contents are the token, nothing
//! more — under the platform config directory:
//!
//! - Windows:  `%APPDATA%\tvctl\<slug>.key`
//! - Linux:    `~/.config/tvctl/<slug>.key`
//! - macOS:    `~/Library/Application Support/tvctl/<slug>.key`
//!
//! The file name is derived deterministically from the device endpoint
//! ([`DeviceEndpoint::slug`]), so re-running against the same TV reuses its
//! credential.
//!
//! Read failures are non-fatal: a missing or unreadable file simply means "no
//! credential yet" and triggers a fresh pairing.  Write failures are reported
//! to the caller, who logs them without revoking a pairing the TV already
//! confirmed for the current run.
//!
//! Two processes pointed at the same TV share the same file without
//! coordination; last write wins.  For a one-shot CLI this race is benign.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use ssap_core::DeviceEndpoint;

/// Error type for credential store operations.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred while writing.
    #[error("I/O error writing key file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File-based store of per-device pairing credentials.
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    /// Opens the store in the platform config directory.
    ///
    /// The directory itself is created lazily on first [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::NoPlatformConfigDir`] when the base directory
    /// cannot be determined from the environment.
    pub fn open() -> Result<Self, KeyStoreError> {
        let dir = platform_config_dir().ok_or(KeyStoreError::NoPlatformConfigDir)?;
        Ok(Self { dir })
    }

    /// Opens a store rooted at an explicit directory (tests, overrides).
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Full path of the key file for `endpoint`.
    pub fn key_file(&self, endpoint: &DeviceEndpoint) -> PathBuf {
        self.dir.join(format!("{}.key", endpoint.slug()))
    }

    /// Loads the stored credential for `endpoint`, if any.
    ///
    /// Never fails: missing, unreadable, or empty files all yield `None`.
    pub fn load(&self, endpoint: &DeviceEndpoint) -> Option<String> {
        let path = self.key_file(endpoint);
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    debug!("key file {} is empty", path.display());
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(e) => {
                debug!("no stored credential at {}: {e}", path.display());
                None
            }
        }
    }

    /// Persists `credential` for `endpoint`, overwriting any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Io`] when the directory or file cannot be
    /// written.  Callers report this without discarding the in-memory
    /// credential for the current run.
    pub fn save(&self, endpoint: &DeviceEndpoint, credential: &str) -> Result<(), KeyStoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| KeyStoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.key_file(endpoint);
        std::fs::write(&path, credential).map_err(|source| KeyStoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("stored credential at {}", path.display());
        Ok(())
    }

    /// The directory backing this store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Resolves the platform config directory for tvctl.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("tvctl"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("tvctl"))
    }

    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/tvctl
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("tvctl")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_store() -> (KeyStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("tvctl_test_{}", Uuid::new_v4()));
        (KeyStore::with_dir(&dir), dir)
    }

    #[test]
    fn test_load_returns_none_when_file_absent() {
        // Arrange: a store in a directory that was never written to
        let (store, dir) = temp_store();
        let endpoint = DeviceEndpoint::with_default_port("10.0.0.61");

        // Act / Assert
        assert_eq!(store.load(&endpoint), None);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_then_load_round_trips() {
        // Arrange
        let (store, dir) = temp_store();
        let endpoint = DeviceEndpoint::with_default_port("10.0.0.61");

        // Act
        store.save(&endpoint, "abc123").expect("save");
        let loaded = store.load(&endpoint);

        // Assert
        assert_eq!(loaded.as_deref(), Some("abc123"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_key_file_name_derives_from_endpoint() {
        let (store, _dir) = temp_store();
        let endpoint = DeviceEndpoint::with_default_port("10.0.0.61");

        let path = store.key_file(&endpoint);

        assert!(
            path.ends_with("10_0_0_61.key"),
            "unexpected key file name: {path:?}"
        );
    }

    #[test]
    fn test_load_trims_surrounding_whitespace() {
        // The entire trimmed file contents are the token; a trailing newline
        // from a hand-edited file must not corrupt the credential.
        let (store, dir) = temp_store();
        let endpoint = DeviceEndpoint::with_default_port("10.0.0.61");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(store.key_file(&endpoint), "  abc123\n").unwrap();

        assert_eq!(store.load(&endpoint).as_deref(), Some("abc123"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_treats_empty_file_as_no_credential() {
        let (store, dir) = temp_store();
        let endpoint = DeviceEndpoint::with_default_port("10.0.0.61");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(store.key_file(&endpoint), "\n").unwrap();

        assert_eq!(store.load(&endpoint), None);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_overwrites_previous_credential() {
        // Renewal: the TV may issue a fresh key on re-pairing.
        let (store, dir) = temp_store();
        let endpoint = DeviceEndpoint::with_default_port("10.0.0.61");

        store.save(&endpoint, "old-key").expect("save old");
        store.save(&endpoint, "new-key").expect("save new");

        assert_eq!(store.load(&endpoint).as_deref(), Some("new-key"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_distinct_endpoints_use_distinct_files() {
        let (store, dir) = temp_store();
        let tv_a = DeviceEndpoint::with_default_port("10.0.0.61");
        let tv_b = DeviceEndpoint::with_default_port("10.0.0.75");

        store.save(&tv_a, "key-a").expect("save a");
        store.save(&tv_b, "key-b").expect("save b");

        assert_eq!(store.load(&tv_a).as_deref(), Some("key-a"));
        assert_eq!(store.load(&tv_b).as_deref(), Some("key-b"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_to_unwritable_dir_reports_io_error() {
        // /proc is not writable; save must surface the failure as Io.
        #[cfg(target_os = "linux")]
        {
            let store = KeyStore::with_dir("/proc/tvctl_cannot_exist");
            let endpoint = DeviceEndpoint::with_default_port("10.0.0.61");
            let result = store.save(&endpoint, "abc");
            assert!(matches!(result, Err(KeyStoreError::Io { .. })));
        }
    }
}
