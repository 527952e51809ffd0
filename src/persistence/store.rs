//! Storage backends

use super::{PersistError, SaveSnapshot, SaveStore};

/// In-memory store holding the serialized document
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    json: Option<String>,
    /// Successful `store` calls
    pub writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from raw stored text (possibly corrupt)
    pub fn with_json(json: impl Into<String>) -> Self {
        Self {
            json: Some(json.into()),
            writes: 0,
        }
    }

    pub fn json(&self) -> Option<&str> {
        self.json.as_deref()
    }
}

impl SaveStore for MemoryStore {
    fn load(&mut self) -> Result<Option<SaveSnapshot>, PersistError> {
        match &self.json {
            Some(json) => Ok(Some(SaveSnapshot::from_json(json)?)),
            None => Ok(None),
        }
    }

    fn store(&mut self, save: &SaveSnapshot) -> Result<(), PersistError> {
        self.json = Some(save.to_json()?);
        self.writes += 1;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use crate::persistence::{PersistError, STORAGE_KEY, SaveSnapshot, SaveStore};

    /// JSON file on disk
    #[derive(Debug, Clone)]
    pub struct FileStore {
        path: PathBuf,
    }

    impl FileStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        /// `<dir>/typesmup198x.save.v1.json`
        pub fn in_dir(dir: impl AsRef<Path>) -> Self {
            Self::new(dir.as_ref().join(format!("{STORAGE_KEY}.json")))
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl SaveStore for FileStore {
        fn load(&mut self) -> Result<Option<SaveSnapshot>, PersistError> {
            match fs::read_to_string(&self.path) {
                Ok(json) => Ok(Some(SaveSnapshot::from_json(&json)?)),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
                Err(err) => Err(err.into()),
            }
        }

        fn store(&mut self, save: &SaveSnapshot) -> Result<(), PersistError> {
            // tmp -> save
            let tmp = self.path.with_extension("tmp");
            fs::write(&tmp, save.to_json()?)?;
            fs::rename(&tmp, &self.path)?;
            log::debug!("Save written to {}", self.path.display());
            Ok(())
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::LocalStorageStore;

#[cfg(target_arch = "wasm32")]
mod web {
    use crate::persistence::{PersistError, STORAGE_KEY, SaveSnapshot, SaveStore};

    /// Browser LocalStorage under `STORAGE_KEY`
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LocalStorageStore;

    impl LocalStorageStore {
        fn storage() -> Result<web_sys::Storage, PersistError> {
            web_sys::window()
                .and_then(|w| w.local_storage().ok())
                .flatten()
                .ok_or_else(|| PersistError::Storage("LocalStorage unavailable".into()))
        }
    }

    impl SaveStore for LocalStorageStore {
        fn load(&mut self) -> Result<Option<SaveSnapshot>, PersistError> {
            let storage = Self::storage()?;
            let json = storage
                .get_item(STORAGE_KEY)
                .map_err(|e| PersistError::Storage(format!("{e:?}")))?;
            match json {
                Some(json) => Ok(Some(SaveSnapshot::from_json(&json)?)),
                None => Ok(None),
            }
        }

        fn store(&mut self, save: &SaveSnapshot) -> Result<(), PersistError> {
            let json = save.to_json()?;
            Self::storage()?
                .set_item(STORAGE_KEY, &json)
                .map_err(|e| PersistError::Storage(format!("{e:?}")))?;
            log::debug!("Save written ({} bytes)", json.len());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        let mut save = SaveSnapshot::default();
        save.player_name = "ZED".into();
        save.high_score = 12_345;
        store.store(&save).unwrap();

        assert_eq!(store.writes, 1);
        assert_eq!(store.load().unwrap(), Some(save));
    }

    #[test]
    fn test_corrupt_save_falls_back_to_default() {
        let mut store = MemoryStore::with_json("{not json");
        assert!(matches!(store.load(), Err(PersistError::Json(_))));
        assert_eq!(store.load_or_default(), SaveSnapshot::default());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = std::env::temp_dir().join(format!("typer198x-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut store = FileStore::in_dir(&dir);
        let _ = std::fs::remove_file(store.path());
        assert!(store.load().unwrap().is_none());

        let mut save = SaveSnapshot::default();
        save.last_unlocked_level = 4;
        store.store(&save).unwrap();
        assert_eq!(store.load_or_default().last_unlocked_level, 4);

        std::fs::remove_file(store.path()).unwrap();
    }
}
