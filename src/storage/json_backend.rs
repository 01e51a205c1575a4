use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::{
    core::utils::{app_data_dir, collections_dir_in},
    errors::Result,
    utils::persistence::{ensure_dir, read_json, write_json_atomic},
};

use super::{CollectionKey, CollectionStore};

/// Stores each collection as a pretty-printed JSON file under one directory.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Uses `root` as the collections directory, creating it when missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        ensure_dir(&root)?;
        Ok(Self { root })
    }

    /// Storage under the application data directory.
    pub fn new_default() -> Result<Self> {
        Self::new(collections_dir_in(&app_data_dir()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection_path(&self, key: CollectionKey) -> PathBuf {
        self.root.join(format!("{}.json", key.as_str()))
    }
}

impl CollectionStore for JsonStorage {
    fn read(&self, key: CollectionKey) -> Result<Option<Value>> {
        read_json(&self.collection_path(key))
    }

    fn write(&self, key: CollectionKey, value: &Value) -> Result<()> {
        let path = self.collection_path(key);
        write_json_atomic(&path, value)?;
        debug!(collection = %key, path = %path.display(), "collection written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_one_file_per_collection() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path().join("data")).unwrap();
        storage
            .write(CollectionKey::Payments, &json!([{"id": "1-2024-03"}]))
            .unwrap();
        assert!(dir.path().join("data/payments.json").exists());
        assert!(!dir.path().join("data/expenses.json").exists());
        assert_eq!(
            storage.read(CollectionKey::Payments).unwrap(),
            Some(json!([{"id": "1-2024-03"}]))
        );
        assert_eq!(storage.read(CollectionKey::Expenses).unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).unwrap();
        std::fs::write(storage.collection_path(CollectionKey::Budgets), "{not json").unwrap();
        assert!(storage.read(CollectionKey::Budgets).is_err());
    }
}
