// src/ingest/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::classify::{default_table, CountryClassifier, CountryKeywords};
use crate::ingest::ledger::LedgerFallback;
use crate::ingest::providers::{gnews, newsapi, JsonApiProvider};
use crate::ingest::registry::{ProviderRegistry, RunMode};
use crate::ingest::types::ArticleFields;

pub const ENV_PATH: &str = "NEWS_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/news.toml";
pub const DEFAULT_JSON_PATH: &str = "config/news.json";

fn default_output() -> PathBuf {
    PathBuf::from("news_file.json")
}
fn default_ledger() -> PathBuf {
    PathBuf::from("titles.txt")
}
fn default_quota_state() -> PathBuf {
    PathBuf::from("quota_state.json")
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_daily_quota() -> u32 {
    100
}
fn default_articles_pointer() -> String {
    "/articles".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    /// Ordered keyword table; empty means the built-in one.
    #[serde(default)]
    pub countries: Vec<CountryKeywords>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_ledger")]
    pub ledger: PathBuf,
    #[serde(default = "default_quota_state")]
    pub quota_state: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            ledger: default_ledger(),
            quota_state: default_quota_state(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default)]
    pub ledger_fallback: LedgerFallback,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Overrides each provider's default search query.
    #[serde(default)]
    pub query: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            ledger_fallback: LedgerFallback::default(),
            request_timeout_secs: default_timeout_secs(),
            query: None,
        }
    }
}

impl RunConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Newsapi,
    Gnews,
    Custom,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    /// Literal key, or "ENV" to read `NEWSAPI_API_KEY` / `GNEWS_API_KEY` / `<NAME>_API_KEY`.
    pub api_key: String,
    #[serde(default = "default_daily_quota")]
    pub daily_quota: u32,
    #[serde(default)]
    pub query: Option<String>,
    // custom providers only
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub key_param: Option<String>,
    #[serde(default)]
    pub query_param: Option<String>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default = "default_articles_pointer")]
    pub articles_pointer: String,
    #[serde(default)]
    pub fields: Option<ArticleFields>,
}

impl ProviderConfig {
    fn key_env_var(&self) -> String {
        match self.kind {
            ProviderKind::Newsapi => "NEWSAPI_API_KEY".to_string(),
            ProviderKind::Gnews => "GNEWS_API_KEY".to_string(),
            ProviderKind::Custom => format!(
                "{}_API_KEY",
                self.name
                    .to_ascii_uppercase()
                    .replace(|c: char| !c.is_ascii_alphanumeric(), "_")
            ),
        }
    }

    fn resolve_api_key(&self) -> Result<String> {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            let var = self.key_env_var();
            return std::env::var(&var)
                .map_err(|_| anyhow!("Missing {var} env var for provider {}", self.name));
        }
        Ok(self.api_key.clone())
    }

    /// JSON pointers are either empty (whole document) or start with `/`.
    fn check_pointers(&self, fields: &ArticleFields) -> Result<()> {
        for (what, ptr) in [
            ("articles_pointer", &self.articles_pointer),
            ("fields.title", &fields.title),
            ("fields.published_at", &fields.published_at),
            ("fields.outlet", &fields.outlet),
            ("fields.url", &fields.url),
        ] {
            if !ptr.is_empty() && !ptr.starts_with('/') {
                bail!(
                    "provider {}: {what} = {ptr:?} is not a JSON pointer (expected e.g. \"/{ptr}\")",
                    self.name
                );
            }
        }
        Ok(())
    }

    pub fn build(&self, default_query: Option<&str>) -> Result<JsonApiProvider> {
        let key = self.resolve_api_key()?;
        let query = self.query.as_deref().or(default_query);
        match self.kind {
            ProviderKind::Newsapi => newsapi::provider(&key, query.unwrap_or(newsapi::DEFAULT_QUERY))
                .map(|p| p.renamed(&self.name)),
            ProviderKind::Gnews => gnews::provider(&key, query.unwrap_or(gnews::DEFAULT_QUERY))
                .map(|p| p.renamed(&self.name)),
            ProviderKind::Custom => {
                let base = self
                    .base_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("custom provider {} needs base_url", self.name))?;
                let fields = self
                    .fields
                    .clone()
                    .ok_or_else(|| anyhow!("custom provider {} needs fields", self.name))?;
                self.check_pointers(&fields)?;
                let key_param = self.key_param.as_deref().unwrap_or("apiKey");
                let query_param = self.query_param.as_deref().unwrap_or("q");
                let mut params: Vec<(&str, &str)> = self
                    .params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                params.push((key_param, key.as_str()));
                if let Some(q) = query {
                    params.push((query_param, q));
                }
                JsonApiProvider::from_params(
                    &self.name,
                    base,
                    params,
                    &self.articles_pointer,
                    fields,
                )
            }
        }
    }
}

impl AppConfig {
    pub fn classifier(&self) -> CountryClassifier {
        if self.countries.is_empty() {
            CountryClassifier::new(default_table())
        } else {
            CountryClassifier::new(self.countries.clone())
        }
    }

    /// Provider list from config, or from whichever default API keys are set
    /// in the environment when config lists none.
    pub fn provider_configs(&self) -> Vec<ProviderConfig> {
        if !self.providers.is_empty() {
            return self.providers.clone();
        }
        let mut out = Vec::new();
        for (name, kind, var, quota) in [
            (
                newsapi::NAME,
                ProviderKind::Newsapi,
                "NEWSAPI_API_KEY",
                newsapi::DEFAULT_DAILY_QUOTA,
            ),
            (
                gnews::NAME,
                ProviderKind::Gnews,
                "GNEWS_API_KEY",
                gnews::DEFAULT_DAILY_QUOTA,
            ),
        ] {
            if std::env::var(var).is_ok() {
                out.push(ProviderConfig {
                    name: name.to_string(),
                    kind,
                    api_key: "ENV".to_string(),
                    daily_quota: quota,
                    query: None,
                    base_url: None,
                    key_param: None,
                    query_param: None,
                    params: BTreeMap::new(),
                    articles_pointer: default_articles_pointer(),
                    fields: None,
                });
            } else {
                tracing::warn!(provider = name, env = var, "api key not set; provider disabled");
            }
        }
        out
    }

    pub fn build_registry(&self) -> Result<ProviderRegistry> {
        let mut reg = ProviderRegistry::new();
        for pc in self.provider_configs() {
            let p = pc.build(self.run.query.as_deref())?;
            reg.register(Box::new(p), pc.daily_quota)
                .with_context(|| format!("registering provider {}", pc.name))?;
        }
        Ok(reg)
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing config {}", path.display()))
}

/// Load config using env var + fallbacks:
/// 1) $NEWS_CONFIG_PATH
/// 2) config/news.toml
/// 3) config/news.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<AppConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            bail!("{ENV_PATH} points to non-existent path");
        }
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Ok(AppConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<AppConfig> {
    match hint_ext {
        "json" => Ok(serde_json::from_str(s)?),
        "toml" => Ok(toml::from_str(s)?),
        // no usable extension: JSON documents start with '{'
        _ if s.trim_start().starts_with('{') => Ok(serde_json::from_str(s)?),
        _ => Ok(toml::from_str(s)?),
    }
}
