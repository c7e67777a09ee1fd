//! One-shot scrape: run the pipeline against the configured source, print
//! the resulting run log as JSON and exit non-zero on a failed run.
//!
//! Usage: `cargo run --bin scrape_once`

use anyhow::Context;

use ai_geek_toolbox::{
    ingest::{fetch::HttpFetcher, run_once, types::RunStatus},
    store::SqliteStore,
    ScrapeConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    ai_geek_toolbox::init_tracing();

    let cfg = ScrapeConfig::load_default().context("loading scrape config")?;
    let fetcher = HttpFetcher::new(&cfg.user_agent, cfg.timeout()).context("building fetcher")?;
    let store = SqliteStore::open(&cfg.database_path)
        .with_context(|| format!("opening tool database {}", cfg.database_path))?;

    // the store is closed on every path, including a failed log write
    let outcome = run_once(&fetcher, &store, &cfg).await;
    let closed = store.close();

    let log = outcome.context("writing scrape run log")?;
    closed.context("closing tool database")?;

    println!("{}", serde_json::to_string_pretty(&log)?);
    if log.status == RunStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}
