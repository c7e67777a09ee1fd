// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::classify::Category;
use crate::ingest::error::FetchError;

/// A tool block that survived extraction, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCandidate {
    pub name: String,
    pub description: Option<String>,
    pub url: String,              // absolute, rebased onto the source origin
    pub logo_url: Option<String>, // absolute, same rule
    pub pricing: Option<String>,
}

impl ToolCandidate {
    /// Description with the generated placeholder for cards that carry none.
    pub fn description_or_default(&self) -> String {
        match self.description.as_deref() {
            Some(d) if !d.trim().is_empty() => d.to_string(),
            _ => format!("{} is an AI tool", self.name),
        }
    }
}

/// Stored tool row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRecord {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub url: String,
    pub logo_url: Option<String>,
    pub category: Category,
    pub sub_category: Option<String>,
    pub tag: Option<String>,
    pub pricing: Option<String>,
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to insert a new [`ToolRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTool {
    pub name: String,
    pub description: String,
    pub url: String,
    pub logo_url: Option<String>,
    pub category: Category,
    pub sub_category: Option<String>,
    pub tag: Option<String>,
    pub pricing: Option<String>,
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Mutable fields overwritten when a candidate matches an existing record.
/// Identity fields (`name`, `url`) and `created_at` are never part of a patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPatch {
    pub description: String,
    pub logo_url: Option<String>,
    pub category: Category,
    pub sub_category: Option<String>,
    pub tag: Option<String>,
    pub pricing: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(RunStatus::Success),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }
}

/// Audit entry handed to the store at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRunLog {
    pub source: String,
    pub status: RunStatus,
    pub items_found: u32,
    pub items_added: u32,
    pub items_updated: u32,
    pub items_failed: u32,
    pub duration_secs: u64,
    pub error_message: Option<String>,
}

/// Persisted, immutable run log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRunLog {
    pub id: i64,
    pub source: String,
    pub status: RunStatus,
    pub items_found: u32,
    pub items_added: u32,
    pub items_updated: u32,
    pub items_failed: u32,
    #[serde(rename = "durationSeconds")]
    pub duration_secs: u64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Where listing pages come from. Production uses `HttpFetcher`; tests and
/// tooling use `StaticPage`.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
    fn name(&self) -> &'static str;
}
