//! Read-side projection: tools grouped by sub-category for the listing page.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::ingest::types::ToolRecord;

pub const FALLBACK_GROUP: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCard {
    pub name: String,
    pub desc: String,
    pub url: String,
    pub tag: String,
    pub is_vip: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolGroup {
    pub group: String,
    /// Group key lower-cased with whitespace removed, used as a DOM anchor.
    pub category: String,
    pub tags: Vec<String>,
    pub tools: Vec<ToolCard>,
}

/// Paid tier signal: "paid" or "premium" anywhere in the pricing text.
pub fn is_vip(pricing: Option<&str>) -> bool {
    pricing.is_some_and(|p| {
        let p = p.to_lowercase();
        p.contains("paid") || p.contains("premium")
    })
}

/// Group `tools` by `sub_category` (empty → "Other").
///
/// Groups come out ordered by key; inside a group the input order is kept,
/// so callers pass records in creation order.
pub fn group_tools(tools: &[ToolRecord]) -> Vec<ToolGroup> {
    let mut groups: BTreeMap<String, ToolGroup> = BTreeMap::new();

    for t in tools {
        let key = t
            .sub_category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(FALLBACK_GROUP)
            .to_string();

        let g = groups.entry(key.clone()).or_insert_with(|| ToolGroup {
            category: key.to_lowercase().split_whitespace().collect(),
            group: key.clone(),
            tags: Vec::new(),
            tools: Vec::new(),
        });

        let tag = t.tag.as_deref().filter(|s| !s.is_empty());
        if let Some(tag) = tag {
            if !g.tags.iter().any(|x| x == tag) {
                g.tags.push(tag.to_string());
            }
        }
        g.tools.push(ToolCard {
            name: t.name.clone(),
            desc: t.description.clone(),
            url: t.url.clone(),
            tag: tag.unwrap_or(key.as_str()).to_string(),
            is_vip: is_vip(t.pricing.as_deref()),
        });
    }

    groups
        .into_values()
        .map(|mut g| {
            if g.tags.is_empty() {
                g.tags.push(g.group.clone());
            }
            g
        })
        .collect()
}
