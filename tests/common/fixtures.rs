//! Shared fixtures for integration tests: a full service wired over the
//! mock document store, stub encoder, and a scriptable oracle.

use std::sync::Arc;
use std::time::Duration;

use namesake::cache::ResultCache;
use namesake::embedding::{EncoderConfig, TextEncoder};
use namesake::engine::{EngineOptions, MatchEngine};
use namesake::index::CandidateIndex;
use namesake::oracle::{Disambiguator, FallbackPolicy, MockOracle};
use namesake::ranking::{Ranker, WeightedFusionModel};
use namesake::store::{Document, MockDocumentStore, RefreshManager, StoreGateway};

pub struct TestService {
    pub engine: Arc<MatchEngine>,
    pub index: Arc<CandidateIndex>,
    pub cache: Arc<ResultCache>,
    pub store: MockDocumentStore,
    pub refresher: Arc<RefreshManager<MockDocumentStore>>,
}

pub fn people_documents() -> Vec<Document> {
    vec![
        Document::new("doc-1", "John Smith"),
        Document::new("doc-2", "Jane Smith"),
        Document::new("doc-3", "Acme Corporation"),
    ]
}

/// Builds a service over `documents` and performs the initial snapshot load.
///
/// The stub encoder's semantics are hash-noise, so fusion leans on the
/// lexical signal to keep threshold behavior deterministic in tests.
pub async fn service_with(
    documents: Vec<Document>,
    oracle: MockOracle,
    policy: FallbackPolicy,
) -> TestService {
    let encoder = Arc::new(TextEncoder::load(EncoderConfig::stub()).expect("stub encoder"));
    let store = MockDocumentStore::with_documents(documents);
    let gateway = Arc::new(StoreGateway::new(
        store.clone(),
        Arc::clone(&encoder),
        "entities",
    ));

    let index = Arc::new(CandidateIndex::new());
    let cache = Arc::new(ResultCache::new());
    let refresher = Arc::new(RefreshManager::new(
        gateway,
        Arc::clone(&index),
        Arc::clone(&cache),
        Duration::from_secs(300),
    ));
    refresher.refresh_once().await.expect("initial load");

    let ranker = Arc::new(Ranker::new(
        Arc::new(WeightedFusionModel::with_weights(0.9, 0.1)),
        0.75,
        Vec::new(),
    ));
    let disambiguator = Disambiguator::new(Arc::new(oracle), Duration::from_millis(100));

    let engine = Arc::new(MatchEngine::new(
        encoder,
        Arc::clone(&index),
        ranker,
        Arc::clone(&cache),
        disambiguator,
        EngineOptions {
            shortlist_size: 50,
            fallback_top_k: 5,
            query_timeout: Duration::from_secs(2),
            fallback_policy: policy,
        },
    ));

    TestService {
        engine,
        index,
        cache,
        store,
        refresher,
    }
}
