//! Namesake HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use namesake::cache::ResultCache;
use namesake::config::Config;
use namesake::embedding::{EncoderConfig, TextEncoder};
use namesake::engine::{EngineOptions, MatchEngine};
use namesake::gateway::{GatewayState, create_router};
use namesake::index::CandidateIndex;
use namesake::oracle::{Disambiguator, GenaiOracle};
use namesake::ranking::{FusionModel, GradientBoostedModel, Ranker, WeightedFusionModel};
use namesake::store::{RefreshManager, RestDocumentStore, StoreGateway};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        store_url = %config.store_url,
        collection = %config.store_collection,
        "Namesake starting"
    );

    let encoder_config = if let Some(path) = &config.encoder_path {
        EncoderConfig::new(path.clone())
            .embedding_dim(config.embedding_dim)
            .max_seq_len(config.max_seq_len)
    } else {
        tracing::warn!("No NAMESAKE_ENCODER_PATH configured, running encoder in stub mode");
        EncoderConfig::stub()
            .embedding_dim(config.embedding_dim)
            .max_seq_len(config.max_seq_len)
    };
    let encoder = Arc::new(TextEncoder::load(encoder_config)?);

    let fusion: Arc<dyn FusionModel> = if let Some(path) = &config.fusion_model_path {
        Arc::new(GradientBoostedModel::load(path)?)
    } else {
        tracing::warn!("No NAMESAKE_FUSION_MODEL_PATH configured, using weighted fusion");
        Arc::new(WeightedFusionModel::new())
    };
    let ranker = Arc::new(Ranker::new(
        fusion,
        config.confidence_threshold,
        config.metadata_features.clone(),
    ));

    let index = Arc::new(CandidateIndex::new());
    let cache = Arc::new(ResultCache::with_settings(
        config.cache_capacity,
        config.cache_ttl,
    ));

    let store = RestDocumentStore::new(config.store_url.clone());
    let gateway = Arc::new(StoreGateway::new(
        store,
        Arc::clone(&encoder),
        config.store_collection.clone(),
    ));

    let refresher = Arc::new(RefreshManager::new(
        gateway,
        Arc::clone(&index),
        Arc::clone(&cache),
        config.refresh_interval,
    ));

    // First load happens inline so the service starts populated when the
    // store is reachable; a failure here is not fatal (stale-is-better-
    // than-down, and here "stale" is the empty zeroth snapshot).
    match refresher.refresh_once().await {
        Ok(generation) => tracing::info!(generation, "Initial snapshot loaded"),
        Err(e) => tracing::warn!(error = %e, "Initial snapshot load failed, serving empty index"),
    }
    refresher.start();

    let oracle = Arc::new(GenaiOracle::new(config.oracle_model.clone()));
    let disambiguator = Disambiguator::new(oracle, config.fallback_timeout);

    let engine = Arc::new(MatchEngine::new(
        encoder,
        index,
        ranker,
        cache,
        disambiguator,
        EngineOptions::from_config(&config),
    ));

    let app = create_router(GatewayState::new(engine));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&refresher)))
        .await?;

    tracing::info!("Namesake shutdown complete");
    Ok(())
}

async fn shutdown_signal(refresher: Arc<RefreshManager<RestDocumentStore>>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping refresh task");
    refresher.shutdown();

    // Give an in-flight refresh a moment to notice the flag.
    tokio::time::sleep(Duration::from_millis(100)).await;
}
