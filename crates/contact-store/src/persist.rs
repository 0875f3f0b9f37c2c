//! Registry persistence.
//!
//! The whole registry (contacts, audit trail, counters) is snapshotted to
//! a single JSON file after every mutation. Writes are atomic (temp file +
//! rename); a missing file loads as an empty registry.

use crate::error::StoreError;
use crate::registry::ContactRegistry;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, warn};

/// JSON-file backed persistence.
pub struct FileStore {
    storage_path: PathBuf,
}

impl FileStore {
    pub fn new(storage_path: PathBuf) -> Self {
        Self { storage_path }
    }

    pub async fn save(&self, registry: &ContactRegistry) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(registry)?;

        if let Some(parent) = self.storage_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.storage_path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &self.storage_path).await?;

        debug!(
            "Saved registry ({} bytes) to {:?}",
            data.len(),
            self.storage_path
        );
        Ok(())
    }

    pub async fn load(&self) -> Result<ContactRegistry, StoreError> {
        if !self.storage_path.exists() {
            info!(
                "Registry file not found at {:?}, starting with empty registry",
                self.storage_path
            );
            return Ok(ContactRegistry::new());
        }

        let data = fs::read(&self.storage_path).await?;
        let registry: ContactRegistry = serde_json::from_slice(&data)?;

        info!(
            "Loaded registry with {} contacts from {:?}",
            registry.len(),
            self.storage_path
        );
        Ok(registry)
    }
}

/// In-memory only, for tests or when persistence is disabled.
pub struct MemoryStore;

impl MemoryStore {
    pub async fn save(&self, _registry: &ContactRegistry) -> Result<(), StoreError> {
        debug!("Memory store: save is a no-op");
        Ok(())
    }

    pub async fn load(&self) -> Result<ContactRegistry, StoreError> {
        debug!("Memory store: returning empty registry");
        Ok(ContactRegistry::new())
    }
}

/// Persistence backend selected at startup.
pub enum Persistence {
    File(FileStore),
    Memory(MemoryStore),
}

impl Persistence {
    pub fn file(storage_path: PathBuf) -> Self {
        Persistence::File(FileStore::new(storage_path))
    }

    pub fn memory() -> Self {
        warn!("Persistence disabled, registry is in-memory only");
        Persistence::Memory(MemoryStore)
    }

    pub async fn save(&self, registry: &ContactRegistry) -> Result<(), StoreError> {
        match self {
            Persistence::File(s) => s.save(registry).await,
            Persistence::Memory(s) => s.save(registry).await,
        }
    }

    pub async fn load(&self) -> Result<ContactRegistry, StoreError> {
        match self {
            Persistence::File(s) => s.load().await,
            Persistence::Memory(s) => s.load().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConsentState;

    #[tokio::test]
    async fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("contacts.json"));

        let mut registry = ContactRegistry::new();
        registry.create("+14125550100", "Joey", "admin", "direct").unwrap();
        registry
            .set_consent("+14125550100", ConsentState::OptedOut, "system", "10.0.0.1")
            .unwrap();

        store.save(&registry).await.unwrap();
        let restored = store.load().await.unwrap();

        let contact = restored.get_by_phone("+14125550100").unwrap();
        assert_eq!(contact.name, "Joey");
        assert_eq!(contact.consent, ConsentState::OptedOut);
        assert_eq!(restored.audit_len(), 2);
    }

    #[tokio::test]
    async fn missing_file_loads_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nope.json"));

        let registry = store.load().await.unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = FileStore::new(path);
        assert!(matches!(store.load().await, Err(StoreError::Storage(_))));
    }

    #[tokio::test]
    async fn new_ids_are_never_reused_after_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("contacts.json"));

        let mut registry = ContactRegistry::new();
        let first = registry.create("+14125550100", "", "admin", "direct").unwrap();
        registry.delete(first.id, "admin", "direct").unwrap();
        store.save(&registry).await.unwrap();

        let mut restored = store.load().await.unwrap();
        let second = restored.create("+14125550101", "", "admin", "direct").unwrap();
        assert!(second.id > first.id);
    }
}
