//! Entity store gateway: the sole source of canonical records.
//!
//! [`DocumentStore`] abstracts the remote document store down to
//! `fetch_all(collection)`; nothing in the core depends on a specific
//! store's wire protocol. [`StoreGateway`] turns fetched documents into
//! [`CanonicalRecord`]s, reusing embeddings for unchanged names, and
//! [`RefreshManager`] swaps snapshots on a schedule with backoff;
//! a failed refresh leaves the previous snapshot serving.

mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use error::StoreError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockDocumentStore;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::cache::ResultCache;
use crate::constants::{REFRESH_BACKOFF_INITIAL_SECS, REFRESH_BACKOFF_MAX_SECS};
use crate::embedding::TextEncoder;
use crate::hashing::{hash_record_content, hash_record_id};
use crate::index::CandidateIndex;
use crate::normalize::normalize;
use crate::record::CanonicalRecord;

/// Attempts per refresh before giving up until the next tick.
const REFRESH_MAX_ATTEMPTS: u32 = 3;

/// A raw document from the backing store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    /// Convenience constructor for fixtures and tests.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert(
            "display_name".to_string(),
            serde_json::Value::String(display_name.into()),
        );
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Attaches a numeric metadata feature.
    pub fn with_feature(mut self, name: &str, value: f64) -> Self {
        let metadata = self
            .fields
            .entry("metadata".to_string())
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        if let Some(map) = metadata.as_object_mut() {
            map.insert(
                name.to_string(),
                serde_json::Value::from(value),
            );
        }
        self
    }

    fn display_name(&self) -> Option<&str> {
        self.fields
            .get("display_name")
            .or_else(|| self.fields.get("name"))
            .and_then(|v| v.as_str())
    }

    fn metadata(&self) -> BTreeMap<String, f64> {
        self.fields
            .get("metadata")
            .and_then(|v| v.as_object())
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_f64().map(|f| (k.clone(), f)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Key-value/document boundary to the remote store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;
}

/// [`DocumentStore`] over a REST endpoint serving JSON document arrays.
#[derive(Debug, Clone)]
pub struct RestDocumentStore {
    client: reqwest::Client,
    base_url: String,
}

impl RestDocumentStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), collection);

        let response = self.client.get(&url).send().await?;
        let response = response.error_for_status().map_err(StoreError::from)?;

        response
            .json::<Vec<Document>>()
            .await
            .map_err(|e| StoreError::MalformedResponse {
                collection: collection.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Loads complete, consistent record sets from the store.
///
/// Embeddings are cached by a content fingerprint of `(store id, normalized
/// name)`, so a refresh only re-encodes records whose text actually changed.
pub struct StoreGateway<S: DocumentStore> {
    store: S,
    encoder: Arc<TextEncoder>,
    collection: String,
    vector_cache: Mutex<HashMap<u64, Vec<f32>>>,
}

impl<S: DocumentStore> std::fmt::Debug for StoreGateway<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreGateway")
            .field("collection", &self.collection)
            .field("cached_vectors", &self.vector_cache.lock().len())
            .finish_non_exhaustive()
    }
}

impl<S: DocumentStore> StoreGateway<S> {
    pub fn new(store: S, encoder: Arc<TextEncoder>, collection: impl Into<String>) -> Self {
        Self {
            store,
            encoder,
            collection: collection.into(),
            vector_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetches all documents and returns the full canonical record set.
    ///
    /// Documents without a usable name, or whose name fails to encode, are
    /// skipped with a warning; everything returned is complete.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn load_snapshot(&self) -> Result<Vec<CanonicalRecord>, StoreError> {
        let documents = self.store.fetch_all(&self.collection).await?;
        debug!(documents = documents.len(), "Documents fetched");

        // Resolve names first so the encode batch covers exactly the texts
        // missing from the vector cache.
        let mut prepared: Vec<(Document, String, u64)> = Vec::with_capacity(documents.len());
        for doc in documents {
            let Some(name) = doc.display_name().map(str::to_string) else {
                warn!(doc_id = %doc.id, "Document has no display name, skipping");
                continue;
            };
            let normalized = normalize(&name);
            if normalized.is_empty() {
                warn!(doc_id = %doc.id, "Document name normalizes to empty, skipping");
                continue;
            }
            let fingerprint = hash_record_content(&doc.id, &normalized);
            prepared.push((doc, normalized, fingerprint));
        }

        let mut vectors: HashMap<u64, Vec<f32>> = HashMap::with_capacity(prepared.len());
        let mut missing: Vec<(u64, String)> = Vec::new();
        {
            let cache = self.vector_cache.lock();
            for (_, normalized, fingerprint) in &prepared {
                if let Some(vector) = cache.get(fingerprint) {
                    vectors.insert(*fingerprint, vector.clone());
                } else {
                    missing.push((*fingerprint, normalized.clone()));
                }
            }
        }

        if !missing.is_empty() {
            debug!(missing = missing.len(), "Encoding new record names");
            let texts: Vec<&str> = missing.iter().map(|(_, t)| t.as_str()).collect();
            match self.encoder.encode_batch(&texts) {
                Ok(embeddings) => {
                    for ((fingerprint, _), embedding) in missing.iter().zip(embeddings) {
                        vectors.insert(*fingerprint, embedding);
                    }
                }
                Err(batch_err) => {
                    // Salvage what encodes; only the bad records drop out.
                    warn!(error = %batch_err, "Batch encode failed, retrying per record");
                    for (fingerprint, text) in &missing {
                        match self.encoder.encode(text) {
                            Ok(embedding) => {
                                vectors.insert(*fingerprint, embedding);
                            }
                            Err(e) => {
                                warn!(text_len = text.len(), error = %e, "Skipping unencodable record");
                            }
                        }
                    }
                }
            }
        }

        let mut records = Vec::with_capacity(prepared.len());
        for (doc, normalized, fingerprint) in prepared {
            let Some(embedding) = vectors.get(&fingerprint).cloned() else {
                continue;
            };
            let display_name = doc
                .display_name()
                .expect("display name checked during preparation")
                .to_string();
            records.push(CanonicalRecord {
                id: hash_record_id(&doc.id),
                store_id: doc.id.clone(),
                display_name,
                normalized_name: normalized,
                embedding,
                metadata: doc.metadata(),
            });
        }

        // Retire cache entries for records that vanished from the store.
        *self.vector_cache.lock() = vectors;

        info!(records = records.len(), "Snapshot loaded");
        Ok(records)
    }
}

/// Periodically rebuilds the candidate index from the store.
///
/// Each cycle retries with exponential backoff; exhausted retries leave the
/// previous snapshot (and the result cache) untouched until the next tick.
/// A successful install clears the result cache.
pub struct RefreshManager<S: DocumentStore> {
    gateway: Arc<StoreGateway<S>>,
    index: Arc<CandidateIndex>,
    cache: Arc<ResultCache>,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

impl<S: DocumentStore + 'static> RefreshManager<S> {
    pub fn new(
        gateway: Arc<StoreGateway<S>>,
        index: Arc<CandidateIndex>,
        cache: Arc<ResultCache>,
        interval: Duration,
    ) -> Self {
        Self {
            gateway,
            index,
            cache,
            interval,
            shutdown: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// One refresh cycle: load, install, invalidate the result cache.
    ///
    /// Retries transient store failures with exponential backoff before
    /// giving up. Returns the new snapshot generation on success.
    pub async fn refresh_once(&self) -> Result<u64, StoreError> {
        let mut delay = Duration::from_secs(REFRESH_BACKOFF_INITIAL_SECS);

        for attempt in 1..=REFRESH_MAX_ATTEMPTS {
            match self.gateway.load_snapshot().await {
                Ok(records) => {
                    let generation = self.index.install(records);
                    self.cache.invalidate_all();
                    return Ok(generation);
                }
                Err(e) if attempt < REFRESH_MAX_ATTEMPTS => {
                    warn!(
                        attempt,
                        max_attempts = REFRESH_MAX_ATTEMPTS,
                        backoff = ?delay,
                        error = %e,
                        "Refresh attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_secs(REFRESH_BACKOFF_MAX_SECS));
                }
                Err(e) => return Err(e),
            }
        }

        unreachable!("loop returns on success or final failure")
    }

    /// Starts the periodic refresh task (no-op if already running).
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return tokio::spawn(async {});
        }

        let gateway = Arc::clone(&self.gateway);
        let index = Arc::clone(&self.index);
        let cache = Arc::clone(&self.cache);
        let interval = self.interval;
        let shutdown = Arc::clone(&self.shutdown);
        let running = Arc::clone(&self.running);

        tokio::spawn(async move {
            let manager = RefreshManager {
                gateway,
                index,
                cache,
                interval,
                shutdown: Arc::clone(&shutdown),
                running: Arc::clone(&running),
            };

            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; the startup path already
            // loads a snapshot inline, so swallow it.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if shutdown.load(Ordering::Acquire) {
                    break;
                }

                match manager.refresh_once().await {
                    Ok(generation) => {
                        debug!(generation, "Scheduled refresh complete");
                    }
                    Err(e) => {
                        warn!(error = %e, "Refresh failed, keeping previous snapshot");
                    }
                }
            }

            running.store(false, Ordering::Release);
        })
    }

    /// Signals the refresh task to stop after its current cycle.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl<S: DocumentStore> std::fmt::Debug for RefreshManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshManager")
            .field("interval", &self.interval)
            .field("running", &self.running.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
