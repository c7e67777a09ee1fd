// src/store/mod.rs
//! Tool storage collaborator.
//!
//! The pipeline only needs read-then-write-if-absent per identity, so the
//! trait stays narrow: identity lookup, insert, patch, and an append-only
//! run log. `list_tools` and `recent_runs` serve the read side.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::ingest::error::StoreError;
use crate::ingest::types::{NewRunLog, NewTool, ScrapeRunLog, ToolPatch, ToolRecord};

#[async_trait::async_trait]
pub trait ToolStore: Send + Sync {
    /// First record (lowest id) whose name equals `name` OR whose normalized
    /// URL equals the normalized `url`.
    async fn find_by_identity(&self, name: &str, url: &str)
        -> Result<Option<ToolRecord>, StoreError>;
    async fn insert(&self, tool: NewTool) -> Result<ToolRecord, StoreError>;
    async fn update(&self, id: i64, patch: ToolPatch) -> Result<ToolRecord, StoreError>;
    async fn log_run(&self, entry: NewRunLog) -> Result<ScrapeRunLog, StoreError>;
    /// All tools in creation order.
    async fn list_tools(&self) -> Result<Vec<ToolRecord>, StoreError>;
    /// Newest first.
    async fn recent_runs(&self, limit: usize) -> Result<Vec<ScrapeRunLog>, StoreError>;
}

/// Identity key of a URL: fragment dropped, scheme/host lower-cased, one
/// trailing slash removed. Unparsable input is only trimmed and lower-cased.
pub fn url_key(url: &str) -> String {
    let trimmed = url.trim();
    let mut key = match reqwest::Url::parse(trimmed) {
        Ok(mut u) => {
            u.set_fragment(None);
            u.to_string()
        }
        Err(_) => trimmed.to_lowercase(),
    };
    if key.ends_with('/') {
        key.pop();
    }
    key
}
