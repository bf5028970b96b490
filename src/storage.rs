//! Persistent key-value storage for the API key.
//!
//! The browser build syncs this store across a profile; here it is a JSON
//! object on disk that is rewritten whole on every set. Writes go to a
//! sibling temp file that is renamed over the real one, so readers see
//! either the old map or the new one.

use crate::error::{LookupError, StorageError};
use async_trait::async_trait;
use log::{debug, info};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

#[async_trait]
pub trait SyncStorage: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, name: &str, value: &str) -> Result<(), StorageError>;
}

/// JSON-file backed storage.
pub struct JsonFileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<config_dir>/syncflo/storage.json`, or `./storage.json` when the
    /// platform has no config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("syncflo").join("storage.json"))
            .unwrap_or_else(|| PathBuf::from("storage.json"))
    }

    /// `storage.json` -> `storage.json.tmp`, in the same directory so the
    /// rename stays on one filesystem.
    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    async fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SyncStorage for JsonFileStorage {
    async fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(name))
    }

    async fn set(&self, name: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(name.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let body = serde_json::to_vec_pretty(&entries)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Wrote '{}' to {}", name, self.path.display());
        Ok(())
    }
}

/// In-process storage, used headless and in tests.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SyncStorage for MemoryStorage {
    async fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().await.get(name).cloned())
    }

    async fn set(&self, name: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .await
            .insert(name.to_string(), value.to_string());
        Ok(())
    }
}

/// The single stored secret, bound to a fixed key name.
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn SyncStorage>,
    key_name: &'static str,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn SyncStorage>, key_name: &'static str) -> Self {
        Self { storage, key_name }
    }

    pub fn key_name(&self) -> &'static str {
        self.key_name
    }

    pub async fn get_key(&self) -> Result<Option<String>, StorageError> {
        let key = self.storage.get(self.key_name).await?;
        Ok(key.filter(|k| !k.is_empty()))
    }

    /// Stores `value` verbatim. No format validation beyond non-empty.
    pub async fn set_key(&self, value: &str) -> Result<(), StorageError> {
        if value.is_empty() {
            return Err(StorageError::EmptyValue(self.key_name.to_string()));
        }
        self.storage.set(self.key_name, value).await?;
        info!("Stored API key under '{}'", self.key_name);
        Ok(())
    }

    /// The key, or `MissingCredential` when none is configured.
    pub async fn require(&self) -> Result<String, LookupError> {
        self.get_key().await?.ok_or(LookupError::MissingCredential)
    }
}

/// Show the first and last few characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_storage_round_trips_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let store = CredentialStore::new(Arc::new(JsonFileStorage::new(&path)), "groqApiKey");
        assert_eq!(store.get_key().await.unwrap(), None);
        store.set_key("gsk_secret").await.unwrap();

        let reopened = CredentialStore::new(Arc::new(JsonFileStorage::new(&path)), "groqApiKey");
        assert_eq!(reopened.get_key().await.unwrap().as_deref(), Some("gsk_secret"));
    }

    #[tokio::test]
    async fn key_names_do_not_collide() {
        let storage: Arc<dyn SyncStorage> = Arc::new(MemoryStorage::new());
        let groq = CredentialStore::new(storage.clone(), "groqApiKey");
        let gemini = CredentialStore::new(storage, "geminiApiKey");

        groq.set_key("a").await.unwrap();
        assert_eq!(gemini.get_key().await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_overwrites_previous_value() {
        let store = CredentialStore::new(Arc::new(MemoryStorage::new()), "groqApiKey");
        store.set_key("old").await.unwrap();
        store.set_key("new").await.unwrap();
        assert_eq!(store.get_key().await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn empty_value_is_rejected() {
        let store = CredentialStore::new(Arc::new(MemoryStorage::new()), "groqApiKey");
        assert!(matches!(
            store.set_key("").await,
            Err(StorageError::EmptyValue(_))
        ));
    }

    #[tokio::test]
    async fn require_reports_missing_credential() {
        let store = CredentialStore::new(Arc::new(MemoryStorage::new()), "groqApiKey");
        assert!(matches!(
            store.require().await,
            Err(LookupError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, b"not json").unwrap();

        let storage = JsonFileStorage::new(&path);
        assert!(matches!(
            storage.get("groqApiKey").await,
            Err(StorageError::Json(_))
        ));
    }

    #[tokio::test]
    async fn leftover_temp_file_does_not_affect_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, br#"{"groqApiKey":"gsk_old"}"#).unwrap();
        // What an interrupted write leaves behind.
        std::fs::write(dir.path().join("storage.json.tmp"), br#"{"groqApiK"#).unwrap();

        let storage = JsonFileStorage::new(&path);
        assert_eq!(storage.get("groqApiKey").await.unwrap().as_deref(), Some("gsk_old"));

        storage.set("groqApiKey", "gsk_new").await.unwrap();
        assert_eq!(storage.get("groqApiKey").await.unwrap().as_deref(), Some("gsk_new"));
        assert!(!dir.path().join("storage.json.tmp").exists());
    }

    #[tokio::test]
    async fn set_replaces_file_without_losing_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let storage = JsonFileStorage::new(&path);
        storage.set("geminiApiKey", "AIza").await.unwrap();
        storage.set("groqApiKey", "gsk").await.unwrap();

        let on_disk: HashMap<String, String> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 2);
        assert_eq!(on_disk["geminiApiKey"], "AIza");
    }

    #[test]
    fn masks_secrets() {
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret("gsk_1234567890"), "gsk_...7890");
    }
}
