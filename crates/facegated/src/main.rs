use anyhow::{Context, Result};
use facegate_core::compare::DistanceComparator;
use facegate_core::matcher::{MatchBudget, MatchEngine};
use facegate_core::store::PersonStore;
use facegate_remote::{DocStoreClient, RemoteEmbedder};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

mod config;
mod http;

use config::Config;
use http::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    let store_url =
        Url::parse(&config.store_url).context("FACEGATE_STORE_URL is not a valid URL")?;
    let embed_url =
        Url::parse(&config.embed_url).context("FACEGATE_EMBED_URL is not a valid URL")?;

    let http_client = reqwest::Client::new();
    let store: Arc<dyn PersonStore> = Arc::new(DocStoreClient::new(
        http_client.clone(),
        store_url,
        config.store_collection.clone(),
        config.store_token.clone(),
    ));
    let embedder = Arc::new(RemoteEmbedder::new(http_client, embed_url));
    let comparator = Arc::new(DistanceComparator::new(config.distance_threshold));
    let engine = Arc::new(MatchEngine::new(
        store.clone(),
        embedder,
        comparator,
        MatchBudget {
            base: Duration::from_secs(config.match_base_timeout_secs),
            per_record: Duration::from_millis(config.match_per_record_millis),
        },
    ));

    let state = AppState::new(store, engine);
    let addr = format!("{}:{}", config.bind_addr, config.port);
    tracing::info!(
        %addr,
        store = %config.store_url,
        collection = %config.store_collection,
        embedder = %config.embed_url,
        threshold = config.distance_threshold,
        "facegated starting"
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, http::router(state)).await?;

    Ok(())
}
