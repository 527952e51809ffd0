//! Save/load persistence
//!
//! Features:
//! - One JSON document under a single storage key
//! - Missing fields merge over defaults
//! - Corrupt or unreadable saves fall back to a fresh profile
//!
//! The run controller talks to storage only through `SaveStore`, so tests can
//! swap in `MemoryStore`.

pub mod snapshot;
pub mod store;

pub use snapshot::{RunSnapshot, SaveSnapshot, StatsSnapshot};
#[cfg(not(target_arch = "wasm32"))]
pub use store::FileStore;
#[cfg(target_arch = "wasm32")]
pub use store::LocalStorageStore;
pub use store::MemoryStore;

use thiserror::Error;

/// Storage key (LocalStorage key on the web, file stem natively)
pub const STORAGE_KEY: &str = "typesmup198x.save.v1";

/// Errors from a storage backend
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage unavailable: {0}")]
    Storage(String),
    #[error("save file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("save is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Synchronous load/store port for the save document
pub trait SaveStore {
    /// Read the save; `Ok(None)` when nothing has been stored yet
    fn load(&mut self) -> Result<Option<SaveSnapshot>, PersistError>;

    fn store(&mut self, save: &SaveSnapshot) -> Result<(), PersistError>;

    /// Load, substituting defaults for anything missing or unreadable
    fn load_or_default(&mut self) -> SaveSnapshot {
        match self.load() {
            Ok(Some(save)) => save,
            Ok(None) => SaveSnapshot::default(),
            Err(err) => {
                log::warn!("Discarding unreadable save: {err}");
                SaveSnapshot::default()
            }
        }
    }
}
