use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use farmhub::{
    storage::{FileStorage, KeyValueStore, MemoryStorage},
    Storefront,
};

use crate::helpers::{FakeApi, TRACING};

pub const TIMEOUT: Duration = Duration::from_secs(2);

pub struct TestStorefront<S> {
    pub storefront: Storefront<Arc<FakeApi>, S>,
    pub api: Arc<FakeApi>,
    pub storage: Arc<S>,
}

impl<S: KeyValueStore> TestStorefront<S> {
    /// Simulates a restart: a fresh storefront over the same API and storage
    pub async fn restart(self) -> Self {
        let storefront = Storefront::build(self.api.clone(), self.storage.clone(), TIMEOUT).await;
        Self {
            storefront,
            api: self.api,
            storage: self.storage,
        }
    }
}

pub async fn spawn_storefront(api: Arc<FakeApi>) -> TestStorefront<MemoryStorage> {
    spawn_with_storage(api, Arc::new(MemoryStorage::new())).await
}

/// Storefront persisting to a fresh file in the temp directory
pub async fn spawn_file_storefront(api: Arc<FakeApi>) -> (TestStorefront<FileStorage>, PathBuf) {
    let path = std::env::temp_dir().join(format!("farmhub-{}.json", Uuid::new_v4()));
    let storage = Arc::new(FileStorage::open(&path).expect("failed to open file storage"));
    (spawn_with_storage(api, storage).await, path)
}

async fn spawn_with_storage<S: KeyValueStore>(api: Arc<FakeApi>, storage: Arc<S>) -> TestStorefront<S> {
    lazy_static::initialize(&TRACING);

    let storefront = Storefront::build(api.clone(), storage.clone(), TIMEOUT).await;
    TestStorefront {
        storefront,
        api,
        storage,
    }
}
