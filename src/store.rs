//! Pairing token persistence.
//!
//! The TV issues an opaque token on the first approved pairing; presenting
//! it on later connections skips the on-screen approval. This module defines
//! the [`TokenStore`] seam plus two implementations: an in-memory store for
//! tests and short-lived sessions, and a file-backed store for real use.
//!
//! Store failures are never fatal: the session treats a failed read as "no
//! token" (forcing a fresh pairing) and a failed write as a dropped write.

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};

// ============================================================================
// TokenStore
// ============================================================================

/// Abstract persistent store for the single pairing token.
///
/// Both operations may suspend on underlying I/O but must stay bounded;
/// the session reads before every connect attempt and writes once per
/// successful pairing, with no concurrent writers.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns the persisted token, or `None` if no pairing has happened.
    async fn get(&self) -> Result<Option<String>>;

    /// Persists the token, overwriting any previous value.
    async fn set(&self, token: &str) -> Result<()>;
}

/// Shared handle to a token store.
pub type SharedTokenStore = Arc<dyn TokenStore>;

// ============================================================================
// MemoryTokenStore
// ============================================================================

/// In-memory token store.
///
/// Tokens do not survive the process; mainly useful in tests and for
/// callers that manage persistence themselves.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    /// Creates an empty in-memory store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with a token.
    #[inline]
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self) -> Result<Option<String>> {
        Ok(self.token.lock().clone())
    }

    async fn set(&self, token: &str) -> Result<()> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }
}

// ============================================================================
// FileTokenStore
// ============================================================================

/// File-backed token store.
///
/// Persists the token as the trimmed contents of a single file. A missing
/// file reads as "no token"; any other I/O failure maps to
/// [`Error::Storage`].
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store backed by the given file path.
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage(format!(
                "failed to read token from {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn set(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::storage(format!(
                    "failed to create token directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        tokio::fs::write(&self.path, token).await.map_err(|e| {
            Error::storage(format!(
                "failed to write token to {}: {e}",
                self.path.display()
            ))
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_empty() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get().await.expect("get"), None);
    }

    #[tokio::test]
    async fn test_memory_store_set_get() {
        let store = MemoryTokenStore::new();
        store.set("17447402").await.expect("set");
        assert_eq!(store.get().await.expect("get"), Some("17447402".into()));
    }

    #[tokio::test]
    async fn test_memory_store_overwrite() {
        let store = MemoryTokenStore::with_token("old");
        store.set("new").await.expect("set");
        assert_eq!(store.get().await.expect("get"), Some("new".into()));
    }

    #[tokio::test]
    async fn test_file_store_missing_reads_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().join("token"));
        assert_eq!(store.get().await.expect("get"), None);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().join("token"));

        store.set("17447402").await.expect("set");
        assert_eq!(store.get().await.expect("get"), Some("17447402".into()));
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().join("nested/dir/token"));

        store.set("abc").await.expect("set");
        assert_eq!(store.get().await.expect("get"), Some("abc".into()));
    }

    #[tokio::test]
    async fn test_file_store_trims_whitespace() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("token");
        tokio::fs::write(&path, "  17447402\n").await.expect("write");

        let store = FileTokenStore::new(&path);
        assert_eq!(store.get().await.expect("get"), Some("17447402".into()));
    }

    #[tokio::test]
    async fn test_file_store_empty_file_reads_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("token");
        tokio::fs::write(&path, "").await.expect("write");

        let store = FileTokenStore::new(&path);
        assert_eq!(store.get().await.expect("get"), None);
    }
}
