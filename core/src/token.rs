//! Persistence for the bearer token.
//!
//! A token store holds exactly one string under `TOKEN_STORAGE_KEY`. Stores
//! never fail loudly: a broken backend degrades to "no token", which the
//! session treats as logged out.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Fixed key the token is stored under.
pub const TOKEN_STORAGE_KEY: &str = "auth_token";

/// Get/set/clear access to the persisted bearer token.
pub trait TokenStore {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str);
    fn clear(&self);
}

/// In-process token store.
///
/// Clones share the same slot, so a test can keep a handle and inspect what
/// the session stored.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore {
    token: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts out holding `token`.
    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        store.set(token);
        store
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A poisoned lock still holds a valid Option.
        self.token.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.slot().clone()
    }

    fn set(&self, token: &str) {
        *self.slot() = Some(token.to_string());
    }

    fn clear(&self) {
        *self.slot() = None;
    }
}

/// Durable token store backed by a small JSON file.
///
/// The file holds a single object `{"auth_token": "<token>"}`. A missing or
/// unreadable file reads as "no token".
#[derive(Clone, Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> BTreeMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "failed to read token file: {e}");
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), "ignoring malformed token file: {e}");
            BTreeMap::new()
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(path = %parent.display(), "failed to create token directory: {e}");
                return;
            }
        }
        let result = serde_json::to_string(entries)
            .map_err(std::io::Error::other)
            .and_then(|raw| write_private(&self.path, &raw));
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), "failed to write token file: {e}");
        }
    }
}

/// Replace the file's contents, readable by the owner only on unix.
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // mode() only applies when the file is created
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<String> {
        self.read_entries().remove(TOKEN_STORAGE_KEY)
    }

    fn set(&self, token: &str) {
        let mut entries = self.read_entries();
        entries.insert(TOKEN_STORAGE_KEY.to_string(), token.to_string());
        self.write_entries(&entries);
    }

    fn clear(&self) {
        let mut entries = self.read_entries();
        if entries.remove(TOKEN_STORAGE_KEY).is_some() {
            self.write_entries(&entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_starts_empty() {
        assert!(MemoryTokenStore::new().get().is_none());
    }

    #[test]
    fn memory_store_set_get_clear() {
        let store = MemoryTokenStore::new();
        store.set("T1");
        assert_eq!(store.get().as_deref(), Some("T1"));
        store.set("T2");
        assert_eq!(store.get().as_deref(), Some("T2"));
        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn memory_store_clones_share_the_slot() {
        let store = MemoryTokenStore::new();
        let handle = store.clone();
        store.set("shared");
        assert_eq!(handle.get().as_deref(), Some("shared"));
    }

    #[test]
    fn file_store_missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        assert!(store.get().is_none());
    }

    #[test]
    fn file_store_survives_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");

        FileTokenStore::new(&path).set("persisted");
        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.get().as_deref(), Some("persisted"));

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[TOKEN_STORAGE_KEY], "persisted");

        reopened.clear();
        assert!(FileTokenStore::new(&path).get().is_none());
    }

    #[test]
    fn file_store_ignores_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert!(store.get().is_none());
        store.set("fresh");
        assert_eq!(store.get().as_deref(), Some("fresh"));
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_private_to_the_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        FileTokenStore::new(&path).set("secret");

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
