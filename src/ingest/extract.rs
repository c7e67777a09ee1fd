// src/ingest/extract.rs
//! Candidate extraction from a listing page.
//!
//! The upstream markup is not contractually stable, so extraction is a
//! heuristic driven by data:
//! - block selectors are tried in priority order; the first one that matches
//!   anything supplies the blocks, in document order, capped at N;
//! - every field has an ordered list of [`FieldRule`]s, first non-empty wins.
//!
//! Blocks without a usable name or a resolvable link are dropped silently.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::ingest::normalize_text;
use crate::ingest::types::ToolCandidate;

/// One extraction step: select a descendant (or the block itself when
/// `selector` is absent), then read either an attribute or its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub attr: Option<String>,
}

impl FieldRule {
    pub fn text(selector: &str) -> Self {
        Self {
            selector: Some(selector.to_string()),
            attr: None,
        }
    }

    pub fn attr(selector: &str, attr: &str) -> Self {
        Self {
            selector: Some(selector.to_string()),
            attr: Some(attr.to_string()),
        }
    }

    pub fn own_attr(attr: &str) -> Self {
        Self {
            selector: None,
            attr: Some(attr.to_string()),
        }
    }
}

/// Selector lists as configuration data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractRules {
    pub blocks: Vec<String>,
    pub name: Vec<FieldRule>,
    pub description: Vec<FieldRule>,
    pub url: Vec<FieldRule>,
    pub logo: Vec<FieldRule>,
    pub pricing: Vec<FieldRule>,
}

impl Default for ExtractRules {
    fn default() -> Self {
        Self {
            blocks: vec![
                ".tool-card".into(),
                ".ai-tool-card".into(),
                r#"[class*="tool"]"#.into(),
                r#"[class*="card"]"#.into(),
            ],
            name: vec![
                FieldRule::text("h3"),
                FieldRule::text("h2"),
                FieldRule::text(".title"),
                FieldRule::text(r#"[class*="title"]"#),
                FieldRule::text(r#"[class*="name"]"#),
            ],
            description: vec![
                FieldRule::text(".description"),
                FieldRule::text(".desc"),
                FieldRule::text(r#"[class*="desc"]"#),
                FieldRule::text("p"),
            ],
            url: vec![FieldRule::attr("a[href]", "href"), FieldRule::own_attr("href")],
            logo: vec![
                FieldRule::attr("img[src]", "src"),
                FieldRule::attr("img[data-src]", "data-src"),
            ],
            pricing: vec![
                FieldRule::text(r#"[class*="pricing"]"#),
                FieldRule::text(r#"[class*="price"]"#),
            ],
        }
    }
}

struct CompiledRule {
    selector: Option<Selector>,
    attr: Option<String>,
}

impl CompiledRule {
    /// All non-empty values this rule yields for `block`, in document order.
    fn values<'a>(&'a self, block: ElementRef<'a>) -> impl Iterator<Item = String> + 'a {
        let targets: Box<dyn Iterator<Item = ElementRef<'a>> + 'a> = match &self.selector {
            Some(sel) => Box::new(block.select(sel)),
            None => Box::new(std::iter::once(block)),
        };
        targets.filter_map(move |el| self.read(el))
    }

    fn read(&self, el: ElementRef<'_>) -> Option<String> {
        let raw = match &self.attr {
            Some(a) => el.value().attr(a)?.trim().to_string(),
            None => normalize_text(&el.text().collect::<String>()),
        };
        (!raw.is_empty()).then_some(raw)
    }
}

fn parse_selector(s: &str) -> anyhow::Result<Selector> {
    Selector::parse(s).map_err(|e| anyhow::anyhow!("invalid selector '{s}': {e:?}"))
}

fn compile(rules: &[FieldRule]) -> anyhow::Result<Vec<CompiledRule>> {
    rules
        .iter()
        .map(|r| {
            Ok(CompiledRule {
                selector: r.selector.as_deref().map(parse_selector).transpose()?,
                attr: r.attr.clone(),
            })
        })
        .collect()
}

/// Outcome of one extraction pass.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub candidates: Vec<ToolCandidate>,
    /// Blocks examined (after the cap), accepted or not.
    pub blocks_seen: usize,
}

pub struct Extractor {
    blocks: Vec<Selector>,
    name: Vec<CompiledRule>,
    description: Vec<CompiledRule>,
    url: Vec<CompiledRule>,
    logo: Vec<CompiledRule>,
    pricing: Vec<CompiledRule>,
    max_candidates: usize,
    min_name_len: usize,
}

impl Extractor {
    pub fn new(
        rules: &ExtractRules,
        max_candidates: usize,
        min_name_len: usize,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            blocks: rules
                .blocks
                .iter()
                .map(|s| parse_selector(s))
                .collect::<anyhow::Result<_>>()?,
            name: compile(&rules.name)?,
            description: compile(&rules.description)?,
            url: compile(&rules.url)?,
            logo: compile(&rules.logo)?,
            pricing: compile(&rules.pricing)?,
            max_candidates,
            min_name_len,
        })
    }

    /// Parse `html` and collect the accepted candidates.
    ///
    /// The parsed document never leaves this function, so callers can hold
    /// the result across `.await` points.
    pub fn extract(&self, html: &str, origin: &str) -> Extraction {
        let t0 = Instant::now();
        let doc = Html::parse_document(html);

        let blocks = self.blocks(&doc, origin);
        let blocks_seen = blocks.len();
        let candidates: Vec<ToolCandidate> =
            blocks.into_iter().filter_map(|(_, c)| c).collect();

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        metrics::histogram!("scrape_extract_ms").record(ms);

        Extraction {
            candidates,
            blocks_seen,
        }
    }

    /// Candidate sequence over an already parsed document.
    pub fn candidates<'a>(
        &'a self,
        doc: &'a Html,
        origin: &'a str,
    ) -> impl Iterator<Item = ToolCandidate> + 'a {
        self.blocks(doc, origin).into_iter().filter_map(|(_, c)| c)
    }

    /// Up to `max_candidates` blocks from the first block selector that
    /// matches, in document order, each paired with the candidate it yields.
    ///
    /// A match that wraps another usable match (a list container around the
    /// real cards) is not a block. Of the rest, a match nested in an already
    /// taken block is skipped.
    fn blocks<'a>(
        &self,
        doc: &'a Html,
        origin: &str,
    ) -> Vec<(ElementRef<'a>, Option<ToolCandidate>)> {
        let Some(sel) = self.blocks.iter().find(|s| doc.select(s).next().is_some()) else {
            return Vec::new();
        };
        let matches: Vec<(ElementRef<'a>, Option<ToolCandidate>)> = doc
            .select(sel)
            .map(|el| (el, self.candidate(el, origin)))
            .collect();

        let wrappers: Vec<ElementRef<'a>> = matches
            .iter()
            .filter(|(_, c)| c.is_some())
            .flat_map(|(el, _)| el.ancestors().filter_map(ElementRef::wrap))
            .collect();

        let mut taken: Vec<ElementRef<'a>> = Vec::new();
        matches
            .into_iter()
            .filter(|(el, _)| !wrappers.contains(el))
            .filter(|(el, _)| {
                if el
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|a| taken.contains(&a))
                {
                    return false;
                }
                taken.push(*el);
                true
            })
            .take(self.max_candidates)
            .collect()
    }

    fn candidate(&self, block: ElementRef<'_>, origin: &str) -> Option<ToolCandidate> {
        let Some(name) = first_value(&self.name, block) else {
            tracing::debug!(target: "extract", "block without name skipped");
            return None;
        };
        if name.chars().count() < self.min_name_len {
            tracing::debug!(target: "extract", %name, "name too short, skipped");
            return None;
        }
        let Some(url) = first_resolved(&self.url, block, origin) else {
            tracing::debug!(target: "extract", %name, "no resolvable link, skipped");
            return None;
        };

        Some(ToolCandidate {
            description: first_value(&self.description, block).filter(|d| *d != name),
            logo_url: first_resolved(&self.logo, block, origin),
            pricing: first_value(&self.pricing, block),
            name,
            url,
        })
    }
}

fn first_value(rules: &[CompiledRule], block: ElementRef<'_>) -> Option<String> {
    rules.iter().flat_map(|r| r.values(block)).next()
}

fn first_resolved(rules: &[CompiledRule], block: ElementRef<'_>, origin: &str) -> Option<String> {
    rules
        .iter()
        .flat_map(|r| r.values(block))
        .find_map(|href| rebase_url(&href, origin))
}

/// `scheme://host[:port]` of `source_url`, or `None` for URLs without one.
pub fn origin_of(source_url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(source_url).ok()?;
    let origin = parsed.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

/// Make `href` absolute against `origin` by string prefixing.
/// Returns `None` for links that cannot point at a tool page.
pub fn rebase_url(href: &str, origin: &str) -> Option<String> {
    let h = href.trim();
    let lower = h.to_ascii_lowercase();
    if h.is_empty()
        || h.starts_with('#')
        || ["javascript:", "mailto:", "tel:", "data:"]
            .iter()
            .any(|p| lower.starts_with(p))
    {
        return None;
    }
    if lower.starts_with("http") {
        return Some(h.to_string());
    }

    let origin = origin.trim_end_matches('/');
    if let Some(rest) = h.strip_prefix("//") {
        let scheme = origin.split("://").next().unwrap_or("https");
        return Some(format!("{scheme}://{rest}"));
    }
    if h.starts_with('/') {
        Some(format!("{origin}{h}"))
    } else {
        Some(format!("{origin}/{h}"))
    }
}
