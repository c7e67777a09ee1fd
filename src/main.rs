//! AI Geek Toolbox backend: binary entrypoint.
//! Boots the Axum HTTP server, wiring the tool store, the listing fetcher,
//! and the Prometheus endpoint.

use std::sync::Arc;

use anyhow::Context;
use shuttle_axum::ShuttleAxum;

use ai_geek_toolbox::{
    api,
    ingest::fetch::HttpFetcher,
    metrics::Metrics,
    store::{MemoryStore, SqliteStore, ToolStore},
    ScrapeConfig,
};

/// `STORE_BACKEND=memory` keeps everything in process; anything else opens
/// the SQLite database from the config.
fn open_store(cfg: &ScrapeConfig) -> anyhow::Result<Arc<dyn ToolStore>> {
    let backend = std::env::var("STORE_BACKEND").unwrap_or_default();
    if backend.eq_ignore_ascii_case("memory") {
        tracing::warn!("using in-memory tool store; data is lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = SqliteStore::open(&cfg.database_path)
        .with_context(|| format!("opening tool database {}", cfg.database_path))?;
    tracing::info!(path = %cfg.database_path, "tool database ready");
    Ok(Arc::new(store))
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    ai_geek_toolbox::init_tracing();

    let cfg = ScrapeConfig::load_default().context("loading scrape config")?;
    tracing::info!(source = %cfg.source_url, cap = cfg.max_candidates, "scrape config loaded");

    let store = open_store(&cfg)?;
    let fetcher = HttpFetcher::new(&cfg.user_agent, cfg.timeout()).context("building fetcher")?;
    let metrics = Metrics::init().context("installing prometheus recorder")?;

    let state = api::AppState::new(store, Arc::new(fetcher), cfg);
    let router = api::create_router(state).merge(metrics.router());

    Ok(router.into())
}
