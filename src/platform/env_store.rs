//! External configuration mirror.
//!
//! Gateway credentials are mirrored into a dotenv-style file read by the
//! mail/SMS/payment collaborators. Writes here are best-effort: the settings
//! layer logs a failed sync as a warning and keeps the database row.

use std::path::PathBuf;
use std::sync::Mutex;

use crate::errors::{Error, Result};

/// Process-wide key/value configuration store consumed by external
/// collaborators.
pub trait ExternalConfigStore: Send + Sync {
    /// Set `key` to `value`. An empty value clears the key's payload while
    /// keeping the key present, so collaborators see it as unset.
    fn set_variable(&self, key: &str, value: &str) -> Result<()>;
}

/// Dotenv-file-backed store: replaces the matching `KEY=` line in place or
/// appends one, preserving all unrelated lines and comments.
pub struct EnvFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl EnvFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    fn read_lines(&self) -> Result<Vec<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(Error::external_sync(format!(
                "Failed to read config file '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }
}

impl ExternalConfigStore for EnvFileStore {
    fn set_variable(&self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() || key.contains(['=', '\n']) {
            return Err(Error::external_sync(format!("Invalid config key '{}'", key)));
        }
        if value.contains('\n') {
            return Err(Error::external_sync(format!("Invalid config value for '{}'", key)));
        }

        let _guard = self.lock.lock().map_err(|_| {
            Error::external_sync("Config file lock poisoned by an earlier panic".to_string())
        })?;

        let mut lines = self.read_lines()?;
        let entry = format!("{}={}", key, value);
        let prefix = format!("{}=", key);

        match lines.iter_mut().find(|line| line.starts_with(&prefix)) {
            Some(line) => *line = entry,
            None => lines.push(entry),
        }

        let mut content = lines.join("\n");
        content.push('\n');
        std::fs::write(&self.path, content).map_err(|e| {
            Error::external_sync(format!(
                "Failed to write config file '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> EnvFileStore {
        EnvFileStore::new(dir.path().join(".env.gateways"))
    }

    #[test]
    fn test_set_appends_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.set_variable("STRIPE_KEY", "pk_live_1").unwrap();
        store.set_variable("PAYPAL_CLIENT_ID", "cid").unwrap();
        store.set_variable("STRIPE_KEY", "pk_live_2").unwrap();

        let content = std::fs::read_to_string(dir.path().join(".env.gateways")).unwrap();
        assert_eq!(content, "STRIPE_KEY=pk_live_2\nPAYPAL_CLIENT_ID=cid\n");
    }

    #[test]
    fn test_unrelated_lines_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.gateways");
        std::fs::write(&path, "# managed by campanile\nOTHER=keep\n").unwrap();

        let store = EnvFileStore::new(&path);
        store.set_variable("SMS_GATEWAY", "twilio").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "# managed by campanile\nOTHER=keep\nSMS_GATEWAY=twilio\n");
    }

    #[test]
    fn test_clearing_writes_empty_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set_variable("TWILIO_TOKEN", "secret").unwrap();
        store.set_variable("TWILIO_TOKEN", "").unwrap();

        let content = std::fs::read_to_string(dir.path().join(".env.gateways")).unwrap();
        assert_eq!(content, "TWILIO_TOKEN=\n");
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.set_variable("", "x").is_err());
        assert!(store.set_variable("A=B", "x").is_err());
        assert!(store.set_variable("KEY", "a\nb").is_err());
    }
}
