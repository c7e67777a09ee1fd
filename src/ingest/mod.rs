// src/ingest/mod.rs
pub mod classify;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod reconcile;
pub mod run_log;
pub mod types;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::config::ScrapeConfig;
use crate::ingest::error::{ScrapeError, StoreError};
use crate::ingest::extract::origin_of;
use crate::ingest::run_log::RunTracker;
use crate::ingest::types::{PageSource, ScrapeRunLog};
use crate::store::ToolStore;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scrape_runs_total", "Scrape runs by final status.");
        describe_counter!(
            "scrape_candidates_total",
            "Candidates accepted by the extractor."
        );
        describe_counter!("scrape_items_added_total", "Tools inserted.");
        describe_counter!("scrape_items_updated_total", "Tools refreshed.");
        describe_counter!(
            "scrape_candidate_errors_total",
            "Candidates skipped because reconciliation failed."
        );
        describe_counter!("scrape_fetch_errors_total", "Listing page fetch errors.");
        describe_histogram!("scrape_extract_ms", "Extraction time in milliseconds.");
        describe_gauge!("scrape_last_run_ts", "Unix ts when the last scrape finished.");
    });
}

/// Normalize scraped text: decode entities, strip tags, ASCII quotes,
/// collapse whitespace, cap length.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap: 1000 chars
    if out.chars().count() > 1000 {
        out = out.chars().take(1000).collect();
    }

    out
}

/// One end-to-end run: fetch → extract → classify/reconcile each candidate →
/// write exactly one run log.
///
/// Fetch failures and an unusable source URL end the run with a `failed`
/// log; a failing candidate is counted in `items_failed` and skipped. Only
/// a failure to write the run log itself is returned as `Err`.
pub async fn run_once(
    source: &dyn PageSource,
    store: &dyn ToolStore,
    cfg: &ScrapeConfig,
) -> Result<ScrapeRunLog, StoreError> {
    ensure_metrics_described();

    let mut tracker = RunTracker::start(&cfg.source_name);
    let outcome = scrape_into(source, store, cfg, &mut tracker).await;
    if let Err(e) = &outcome {
        error!(target: "ingest", error = %e, source = %cfg.source_name, "scrape run failed");
    }

    let log = tracker.finish(store, outcome.as_ref().err()).await?;

    counter!("scrape_runs_total", "status" => log.status.as_str()).increment(1);
    gauge!("scrape_last_run_ts").set(log.created_at.timestamp() as f64);
    info!(
        target: "ingest",
        status = log.status.as_str(),
        found = log.items_found,
        added = log.items_added,
        updated = log.items_updated,
        failed = log.items_failed,
        secs = log.duration_secs,
        "scrape run logged"
    );
    Ok(log)
}

async fn scrape_into(
    source: &dyn PageSource,
    store: &dyn ToolStore,
    cfg: &ScrapeConfig,
    tracker: &mut RunTracker,
) -> Result<(), ScrapeError> {
    let origin =
        origin_of(&cfg.source_url).ok_or_else(|| ScrapeError::InvalidSource(cfg.source_url.clone()))?;

    info!(target: "ingest", url = %cfg.source_url, provider = source.name(), "fetching listing page");
    let body = source.fetch_page(&cfg.source_url).await?;

    let extraction = {
        let extractor = cfg
            .extractor()
            .map_err(|e| ScrapeError::InvalidSource(format!("{}: {e:#}", cfg.source_url)))?;
        extractor.extract(&body, &origin)
    };
    if extraction.blocks_seen == 0 {
        warn!(target: "ingest", url = %cfg.source_url, "no tool blocks located on page");
    }
    tracker.items_found = extraction.candidates.len() as u32;
    counter!("scrape_candidates_total").increment(extraction.candidates.len() as u64);
    info!(
        target: "ingest",
        blocks = extraction.blocks_seen,
        accepted = extraction.candidates.len(),
        "extracted candidates"
    );

    // One candidate at a time: lookup+write for an identity completes before
    // the next candidate is looked up.
    for candidate in &extraction.candidates {
        let now = chrono::Utc::now();
        match reconcile::reconcile(store, candidate, &cfg.source_url, now).await {
            Ok(outcome) => {
                match &outcome {
                    reconcile::ReconcileOutcome::Added(_) => {
                        counter!("scrape_items_added_total").increment(1)
                    }
                    reconcile::ReconcileOutcome::Updated(_) => {
                        counter!("scrape_items_updated_total").increment(1)
                    }
                }
                debug!(target: "ingest", name = %candidate.name, ?outcome, "reconciled");
                tracker.record(&outcome);
            }
            Err(e) => {
                warn!(target: "ingest", error = %e, name = %candidate.name, "candidate skipped");
                counter!("scrape_candidate_errors_total").increment(1);
                tracker.items_failed += 1;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_collapses_ws_and_entities() {
        let s = "  Hello,&nbsp;&nbsp; <b>world</b>!  ";
        assert_eq!(normalize_text(s), "Hello, world!");
    }

    #[test]
    fn normalize_text_converts_typographic_quotes() {
        assert_eq!(normalize_text("“ok” ‘fine’"), r#""ok" 'fine'"#);
    }
}
