//! File-backed store: one file per key under a state directory

use super::KeyValueStore;
use crate::utils::safe_filename;
use std::path::{Path, PathBuf};

const VALUE_EXTENSION: &str = "value";

/// Stores each key as `<dir>/<safe key>.value`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", safe_filename(key), VALUE_EXTENSION))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> crate::Result<Option<String>> {
        match std::fs::read_to_string(self.key_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(crate::Error::storage(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> crate::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        // Readers never observe a partially written value.
        let path = self.key_path(key);
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> crate::Result<()> {
        match std::fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> crate::Result<()> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(VALUE_EXTENSION) {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_key_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("state"));
        assert_eq!(store.get("ncuacg.personaId").unwrap(), None);
    }

    #[test]
    fn test_set_creates_dir_and_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("state"));

        store.set("ncuacg.personaId", "storyboard_coach").unwrap();

        let reopened = FileStore::new(temp_dir.path().join("state"));
        assert_eq!(
            reopened.get("ncuacg.personaId").unwrap().as_deref(),
            Some("storyboard_coach")
        );
    }

    #[test]
    fn test_clear_only_removes_value_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        std::fs::write(temp_dir.path().join("README"), "keep").unwrap();

        store.clear().unwrap();

        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap(), None);
        assert!(temp_dir.path().join("README").exists());
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        store.remove("nothing").unwrap();
    }
}
