use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::StoreError;
use super::{Document, DocumentStore};

/// In-memory document store for tests: contents are settable at any time,
/// and the store can be toggled unavailable to exercise degradation paths.
#[derive(Debug, Clone, Default)]
pub struct MockDocumentStore {
    documents: Arc<RwLock<Vec<Document>>>,
    unavailable: Arc<AtomicBool>,
    fetch_count: Arc<AtomicU64>,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<Document>) -> Self {
        let store = Self::new();
        store.set_documents(documents);
        store
    }

    pub fn set_documents(&self, documents: Vec<Document>) {
        *self.documents.write() = documents;
    }

    /// Makes every subsequent fetch fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Release);
    }

    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn fetch_all(&self, _collection: &str) -> Result<Vec<Document>, StoreError> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        if self.unavailable.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable {
                reason: "mock store set unavailable".to_string(),
            });
        }

        Ok(self.documents.read().clone())
    }
}
