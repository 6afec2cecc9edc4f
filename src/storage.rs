//! Durable token storage.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session mirrors its token into exactly one key/value entry named
//! [`TOKEN_KEY`]. Natively that entry is a file holding the raw token; in the
//! browser (`hydrate` feature) it is `window.localStorage`. Tests use the
//! in-memory store.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Fixed storage key for the bearer token.
pub const TOKEN_KEY: &str = "jwtToken";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No storage backend is reachable (e.g. `localStorage` disabled).
    #[error("token storage unavailable")]
    Unavailable,
    #[error("token storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The backend refused the write (quota, private browsing).
    #[error("token storage rejected write: {0}")]
    Rejected(String),
}

/// A single durable slot for the raw token string.
pub trait TokenStore {
    /// Read the stored token. Blank entries read as `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Overwrite the stored token.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn save(&mut self, token: &str) -> Result<(), StorageError>;

    /// Delete the stored token. Removing an absent token succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&mut self) -> Result<(), StorageError>;
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `token`, as if left over from an earlier run.
    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self { token: Some(token.to_owned()) }
    }

    #[must_use]
    pub fn get(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.token.clone().filter(|t| !t.trim().is_empty()))
    }

    fn save(&mut self, token: &str) -> Result<(), StorageError> {
        self.token = Some(token.to_owned());
        Ok(())
    }

    fn remove(&mut self) -> Result<(), StorageError> {
        self.token = None;
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// Token stored as the sole contents of a file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.recipebox/jwtToken`, or `None` when no home directory is set.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .filter(|h| !h.is_empty())?;
        Some(PathBuf::from(home).join(".recipebox").join(TOKEN_KEY))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| token.to_owned()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, token: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_private(&self.path, token.as_bytes())?;
        Ok(())
    }

    fn remove(&mut self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write as _;
    use std::os::unix::fs::OpenOptionsExt as _;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(bytes)
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, bytes)
}

// =============================================================================
// BROWSER
// =============================================================================

/// `window.localStorage` entry keyed by [`TOKEN_KEY`].
#[cfg(feature = "hydrate")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageTokenStore;

#[cfg(feature = "hydrate")]
impl LocalStorageTokenStore {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or(StorageError::Unavailable)
    }
}

#[cfg(feature = "hydrate")]
impl TokenStore for LocalStorageTokenStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        let storage = Self::storage()?;
        let raw = storage.get_item(TOKEN_KEY).ok().flatten();
        Ok(raw.filter(|t| !t.trim().is_empty()))
    }

    fn save(&mut self, token: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(TOKEN_KEY, token)
            .map_err(|e| StorageError::Rejected(format!("{e:?}")))
    }

    fn remove(&mut self) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(TOKEN_KEY)
            .map_err(|e| StorageError::Rejected(format!("{e:?}")))
    }
}
