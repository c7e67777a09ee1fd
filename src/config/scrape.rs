// src/config/scrape.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::extract::{origin_of, ExtractRules, Extractor};

pub const ENV_CONFIG_PATH: &str = "SCRAPE_CONFIG_PATH";
pub const ENV_SOURCE_URL: &str = "SCRAPE_SOURCE_URL";
pub const ENV_TIMEOUT_SECS: &str = "SCRAPE_TIMEOUT_SECS";
pub const ENV_DB_PATH: &str = "TOOLBOX_DB_PATH";

pub const DEFAULT_CONFIG_TOML: &str = "config/scrape.toml";
pub const DEFAULT_CONFIG_JSON: &str = "config/scrape.json";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Label written to every run log, e.g. "toolify.ai".
    pub source_name: String,
    pub source_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Cap on blocks examined per run.
    pub max_candidates: usize,
    /// Names shorter than this (in chars) are rejected.
    pub min_name_len: usize,
    pub database_path: String,
    pub rules: ExtractRules,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            source_name: "toolify.ai".into(),
            source_url: "https://www.toolify.ai/zh".into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            timeout_secs: 30,
            max_candidates: 20,
            min_name_len: 2,
            database_path: "data/toolbox.sqlite".into(),
            rules: ExtractRules::default(),
        }
    }
}

impl ScrapeConfig {
    /// Load from an explicit path. TOML or JSON, picked by extension.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading scrape config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: ScrapeConfig = match ext.as_str() {
            "json" => serde_json::from_str(&content).context("parsing scrape config json")?,
            _ => toml::from_str(&content).context("parsing scrape config toml")?,
        };
        cfg.with_env_overrides()?.validated()
    }

    /// Resolution order:
    /// 1) $SCRAPE_CONFIG_PATH (must exist)
    /// 2) config/scrape.toml
    /// 3) config/scrape.json
    /// 4) built-in defaults
    ///
    /// Env overrides (`SCRAPE_SOURCE_URL`, `SCRAPE_TIMEOUT_SECS`,
    /// `TOOLBOX_DB_PATH`) apply on top of whichever was found.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from_file(&pb);
        }
        for candidate in [DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_JSON] {
            let p = PathBuf::from(candidate);
            if p.exists() {
                return Self::load_from_file(&p);
            }
        }
        Self::default().with_env_overrides()?.validated()
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var(ENV_SOURCE_URL) {
            self.source_url = url.trim().to_string();
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_SECS}={raw:?} is not a number"))?;
        }
        if let Ok(p) = std::env::var(ENV_DB_PATH) {
            self.database_path = p;
        }
        Ok(self)
    }

    pub fn validated(self) -> Result<Self> {
        if origin_of(&self.source_url).is_none() {
            bail!("source_url {:?} has no http(s) origin", self.source_url);
        }
        if self.max_candidates == 0 {
            bail!("max_candidates must be at least 1");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be at least 1");
        }
        self.extractor().context("compiling extraction rules")?;
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn extractor(&self) -> Result<Extractor> {
        Extractor::new(&self.rules, self.max_candidates, self.min_name_len)
    }
}
