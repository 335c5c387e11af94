//! Record store abstraction
//!
//! The ingestion pipeline and HTTP layer depend on this trait rather than on
//! `AdRepository` directly, so they can run against the in-memory store in tests.

use advault_core::models::Ad;
use async_trait::async_trait;

use crate::StoreError;

#[async_trait]
pub trait AdStore: Send + Sync {
    /// Persist the ad with its tactics and shots as one logical write.
    /// Must fail with `StoreError::Conflict` if the id is taken.
    async fn create_ad(&self, ad: &Ad) -> Result<String, StoreError>;

    async fn get_ad_by_id(&self, id: &str) -> Result<Option<Ad>, StoreError>;

    async fn ad_exists(&self, id: &str) -> Result<bool, StoreError>;

    /// Returns whether a record was removed
    async fn delete_ad(&self, id: &str) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

#[cfg(any(test, feature = "test-helpers"))]
mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory record store with the same uniqueness guarantee as Postgres
    #[derive(Clone, Default)]
    pub struct MemoryAdStore {
        ads: Arc<Mutex<HashMap<String, Ad>>>,
        fail_creates: Arc<AtomicBool>,
        create_calls: Arc<AtomicUsize>,
    }

    impl MemoryAdStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent `create_ad` fail with a database error
        pub fn fail_creates(&self, fail: bool) {
            self.fail_creates.store(fail, Ordering::SeqCst);
        }

        pub fn create_calls(&self) -> usize {
            self.create_calls.load(Ordering::SeqCst)
        }

        pub fn len(&self) -> usize {
            self.ads.lock().map(|ads| ads.len()).unwrap_or(0)
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn poisoned<T>(_: T) -> StoreError {
            StoreError::Unavailable("memory store lock poisoned".to_string())
        }
    }

    #[async_trait]
    impl AdStore for MemoryAdStore {
        async fn create_ad(&self, ad: &Ad) -> Result<String, StoreError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_creates.load(Ordering::SeqCst) {
                return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
            }
            let mut ads = self.ads.lock().map_err(Self::poisoned)?;
            if ads.contains_key(&ad.id) {
                return Err(StoreError::Conflict(ad.id.clone()));
            }
            ads.insert(ad.id.clone(), ad.clone());
            Ok(ad.id.clone())
        }

        async fn get_ad_by_id(&self, id: &str) -> Result<Option<Ad>, StoreError> {
            Ok(self.ads.lock().map_err(Self::poisoned)?.get(id).cloned())
        }

        async fn ad_exists(&self, id: &str) -> Result<bool, StoreError> {
            Ok(self.ads.lock().map_err(Self::poisoned)?.contains_key(id))
        }

        async fn delete_ad(&self, id: &str) -> Result<bool, StoreError> {
            Ok(self.ads.lock().map_err(Self::poisoned)?.remove(id).is_some())
        }

        async fn health_check(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use memory::MemoryAdStore;
