// src/ingest/reconcile.rs
use chrono::{DateTime, Utc};

use crate::ingest::classify::classify;
use crate::ingest::error::CandidateError;
use crate::ingest::types::{NewTool, ToolCandidate, ToolPatch, ToolRecord};
use crate::store::ToolStore;

pub const UNKNOWN_PRICING: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Added(ToolRecord),
    Updated(ToolRecord),
}

/// Classify one candidate and create-or-update it by union identity.
///
/// On a match every mutable field is refreshed (description, logo, category,
/// sub-category, tag, pricing, `updated_at`); `name`, `url` and `created_at`
/// of the stored record are kept.
pub async fn reconcile(
    store: &dyn ToolStore,
    candidate: &ToolCandidate,
    source_url: &str,
    now: DateTime<Utc>,
) -> Result<ReconcileOutcome, CandidateError> {
    let wrap = |source| CandidateError::Reconcile {
        name: candidate.name.clone(),
        source,
    };

    let description = candidate.description_or_default();
    let class = classify(&candidate.name, &description);
    let pricing = candidate
        .pricing
        .clone()
        .unwrap_or_else(|| UNKNOWN_PRICING.to_string());

    let existing = store
        .find_by_identity(&candidate.name, &candidate.url)
        .await
        .map_err(wrap)?;

    match existing {
        Some(rec) => {
            let patch = ToolPatch {
                description,
                logo_url: candidate.logo_url.clone(),
                category: class.category,
                sub_category: Some(class.category.label().to_string()),
                tag: Some(class.tag.to_string()),
                pricing: Some(pricing),
                updated_at: now,
            };
            let updated = store.update(rec.id, patch).await.map_err(wrap)?;
            Ok(ReconcileOutcome::Updated(updated))
        }
        None => {
            let tool = NewTool {
                name: candidate.name.clone(),
                description,
                url: candidate.url.clone(),
                logo_url: candidate.logo_url.clone(),
                category: class.category,
                sub_category: Some(class.category.label().to_string()),
                tag: Some(class.tag.to_string()),
                pricing: Some(pricing),
                source_url: Some(source_url.to_string()),
                created_at: now,
            };
            let added = store.insert(tool).await.map_err(wrap)?;
            Ok(ReconcileOutcome::Added(added))
        }
    }
}
