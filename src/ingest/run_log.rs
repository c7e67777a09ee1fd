// src/ingest/run_log.rs
use std::time::Instant;

use crate::ingest::error::{ScrapeError, StoreError};
use crate::ingest::reconcile::ReconcileOutcome;
use crate::ingest::types::{NewRunLog, RunStatus, ScrapeRunLog};
use crate::store::ToolStore;

/// Counts accumulated during one run. Consumed by [`RunTracker::finish`], so
/// a run can be logged at most once.
#[derive(Debug)]
pub struct RunTracker {
    source: String,
    started: Instant,
    pub items_found: u32,
    pub items_added: u32,
    pub items_updated: u32,
    pub items_failed: u32,
}

impl RunTracker {
    pub fn start(source: &str) -> Self {
        Self {
            source: source.to_string(),
            started: Instant::now(),
            items_found: 0,
            items_added: 0,
            items_updated: 0,
            items_failed: 0,
        }
    }

    pub fn record(&mut self, outcome: &ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Added(_) => self.items_added += 1,
            ReconcileOutcome::Updated(_) => self.items_updated += 1,
        }
    }

    /// Build the log entry for this run, `failed` when `error` is set.
    pub fn entry(&self, error: Option<&ScrapeError>) -> NewRunLog {
        NewRunLog {
            source: self.source.clone(),
            status: if error.is_some() {
                RunStatus::Failed
            } else {
                RunStatus::Success
            },
            items_found: self.items_found,
            items_added: self.items_added,
            items_updated: self.items_updated,
            items_failed: self.items_failed,
            duration_secs: self.started.elapsed().as_secs(),
            error_message: error.map(|e| e.to_string()),
        }
    }

    /// Write the single audit entry for this run.
    pub async fn finish(
        self,
        store: &dyn ToolStore,
        error: Option<&ScrapeError>,
    ) -> Result<ScrapeRunLog, StoreError> {
        store.log_run(self.entry(error)).await
    }
}
