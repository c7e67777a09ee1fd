use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::catalog::{group_tools, ToolGroup};
use crate::config::ScrapeConfig;
use crate::ingest::{self, types::PageSource, types::RunStatus};
use crate::store::ToolStore;

const DEFAULT_RUNS_LIMIT: usize = 20;
const MAX_RUNS_LIMIT: usize = 200;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn ToolStore>,
    source: Arc<dyn PageSource>,
    config: Arc<ScrapeConfig>,
    // one scrape at a time; concurrent triggers queue here
    run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ToolStore>,
        source: Arc<dyn PageSource>,
        config: ScrapeConfig,
    ) -> Self {
        Self {
            store,
            source,
            config: Arc::new(config),
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/scrape", get(trigger_scrape).post(trigger_scrape))
        .route("/api/scrape/runs", get(list_runs))
        .route("/api/tools", get(list_tools))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let body = json!({ "success": false, "error": message.into() });
    (status, Json(body)).into_response()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeData {
    items_found: u32,
    items_added: u32,
    items_updated: u32,
    items_failed: u32,
    duration_seconds: u64,
}

#[derive(Serialize)]
struct ScrapeResp {
    success: bool,
    message: &'static str,
    data: ScrapeData,
}

async fn trigger_scrape(State(state): State<AppState>) -> Response {
    let _guard = state.run_lock.lock().await;
    let log = match ingest::run_once(state.source.as_ref(), state.store.as_ref(), &state.config)
        .await
    {
        Ok(log) => log,
        Err(e) => {
            tracing::error!(error = %e, "failed to write scrape run log");
            return failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("scrape log could not be written: {e}"),
            );
        }
    };

    match log.status {
        RunStatus::Success => Json(ScrapeResp {
            success: true,
            message: "scrape completed",
            data: ScrapeData {
                items_found: log.items_found,
                items_added: log.items_added,
                items_updated: log.items_updated,
                items_failed: log.items_failed,
                duration_seconds: log.duration_secs,
            },
        })
        .into_response(),
        RunStatus::Failed => failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            log.error_message.unwrap_or_else(|| "scrape failed".into()),
        ),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolsStats {
    total_tools: usize,
    categories: usize,
    duration: String,
}

#[derive(Serialize)]
struct ToolsResp {
    success: bool,
    groups: Vec<ToolGroup>,
    stats: ToolsStats,
}

async fn list_tools(State(state): State<AppState>) -> Response {
    let t0 = Instant::now();
    let tools = match state.store.list_tools().await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "listing tools failed");
            return failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };
    let groups = group_tools(&tools);
    Json(ToolsResp {
        success: true,
        stats: ToolsStats {
            total_tools: tools.len(),
            categories: groups.len(),
            duration: format!("{}ms", t0.elapsed().as_millis()),
        },
        groups,
    })
    .into_response()
}

#[derive(Deserialize)]
struct RunsQuery {
    limit: Option<usize>,
}

async fn list_runs(
    State(state): State<AppState>,
    query: Result<Query<RunsQuery>, QueryRejection>,
) -> Response {
    let q = match query {
        Ok(Query(q)) => q,
        Err(rej) => return failure(rej.status(), rej.body_text()),
    };
    let limit = q.limit.unwrap_or(DEFAULT_RUNS_LIMIT).clamp(1, MAX_RUNS_LIMIT);
    match state.store.recent_runs(limit).await {
        Ok(runs) => Json(json!({ "success": true, "runs": runs })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "listing scrape runs failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
