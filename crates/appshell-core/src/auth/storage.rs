//! Per-session key/value storage backing the auth store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::AuthError;

/// String key/value store scoped to one session, shaped like the browser's
/// `sessionStorage`.
pub trait SessionStorage: Send {
    fn get_item(&self, key: &str) -> Result<Option<String>, AuthError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), AuthError>;
    fn remove_item(&mut self, key: &str) -> Result<(), AuthError>;
}

/// In-process storage. Lives exactly as long as the store that owns it.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), AuthError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), AuthError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Directory of one `<key>.json` file per item.
///
/// Each CLI session gets its own directory, which is what a browser tab is
/// to `sessionStorage`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage for a named session under `root/sessions/`.
    pub fn for_session(root: &Path, session_id: &str) -> Self {
        Self::new(root.join("sessions").join(session_id))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AuthError> {
        let path = self.item_path(key);
        if !path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| AuthError::storage(key, e))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), AuthError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| AuthError::storage(key, e))?;
        std::fs::write(self.item_path(key), value).map_err(|e| AuthError::storage(key, e))
    }

    fn remove_item(&mut self, key: &str) -> Result<(), AuthError> {
        let path = self.item_path(key);
        if path.exists() {
            std::fs::remove_file(path).map_err(|e| AuthError::storage(key, e))?;
        }
        Ok(())
    }
}
