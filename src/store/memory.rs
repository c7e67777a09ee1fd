// src/store/memory.rs
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};

use super::{url_key, ToolStore};
use crate::ingest::error::StoreError;
use crate::ingest::types::{NewRunLog, NewTool, ScrapeRunLog, ToolPatch, ToolRecord};

/// Process-local store. Used by tests and by `STORE_BACKEND=memory` deployments
/// that do not need persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    tools: Vec<ToolRecord>,
    runs: Vec<ScrapeRunLog>,
    next_tool_id: i64,
    next_run_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

#[async_trait::async_trait]
impl ToolStore for MemoryStore {
    async fn find_by_identity(
        &self,
        name: &str,
        url: &str,
    ) -> Result<Option<ToolRecord>, StoreError> {
        let key = url_key(url);
        let g = self.lock()?;
        Ok(g
            .tools
            .iter()
            .find(|t| t.name == name || url_key(&t.url) == key)
            .cloned())
    }

    async fn insert(&self, tool: NewTool) -> Result<ToolRecord, StoreError> {
        let mut g = self.lock()?;
        g.next_tool_id += 1;
        let rec = ToolRecord {
            id: g.next_tool_id,
            name: tool.name,
            description: tool.description,
            url: tool.url,
            logo_url: tool.logo_url,
            category: tool.category,
            sub_category: tool.sub_category,
            tag: tool.tag,
            pricing: tool.pricing,
            source_url: tool.source_url,
            created_at: tool.created_at,
            updated_at: tool.created_at,
        };
        g.tools.push(rec.clone());
        Ok(rec)
    }

    async fn update(&self, id: i64, patch: ToolPatch) -> Result<ToolRecord, StoreError> {
        let mut g = self.lock()?;
        let rec = g
            .tools
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;
        rec.description = patch.description;
        rec.logo_url = patch.logo_url;
        rec.category = patch.category;
        rec.sub_category = patch.sub_category;
        rec.tag = patch.tag;
        rec.pricing = patch.pricing;
        rec.updated_at = patch.updated_at;
        Ok(rec.clone())
    }

    async fn log_run(&self, entry: NewRunLog) -> Result<ScrapeRunLog, StoreError> {
        let mut g = self.lock()?;
        g.next_run_id += 1;
        let log = ScrapeRunLog {
            id: g.next_run_id,
            source: entry.source,
            status: entry.status,
            items_found: entry.items_found,
            items_added: entry.items_added,
            items_updated: entry.items_updated,
            items_failed: entry.items_failed,
            duration_secs: entry.duration_secs,
            error_message: entry.error_message,
            created_at: Utc::now(),
        };
        g.runs.push(log.clone());
        Ok(log)
    }

    async fn list_tools(&self) -> Result<Vec<ToolRecord>, StoreError> {
        Ok(self.lock()?.tools.clone())
    }

    async fn recent_runs(&self, limit: usize) -> Result<Vec<ScrapeRunLog>, StoreError> {
        Ok(self.lock()?.runs.iter().rev().take(limit).cloned().collect())
    }
}
