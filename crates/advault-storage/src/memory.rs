//! In-memory storage for tests

use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock storage implementation that stores blobs in memory
#[derive(Clone, Default)]
pub struct MockStorage {
    files: Arc<Mutex<HashMap<String, StoredObject>>>,
    fail_puts: Arc<AtomicBool>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Check if a blob exists in the mock storage
    pub fn has_file(&self, key: &str) -> bool {
        self.files
            .lock()
            .map(|files| files.contains_key(key))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.files.lock().map(|files| files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_err<T>(_: T) -> StorageError {
        StorageError::BackendError("mock storage lock poisoned".to_string())
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String> {
        validate_key(key)?;
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("mock put failure".to_string()));
        }
        self.files.lock().map_err(Self::lock_err)?.insert(
            key.to_string(),
            StoredObject {
                data: Bytes::from(data),
                content_type: content_type.to_string(),
            },
        );
        Ok(key.to_string())
    }

    async fn get(&self, key: &str) -> StorageResult<Option<StoredObject>> {
        validate_key(key)?;
        Ok(self.files.lock().map_err(Self::lock_err)?.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.files.lock().map_err(Self::lock_err)?.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.files.lock().map_err(Self::lock_err)?.contains_key(key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
