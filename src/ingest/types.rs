// src/ingest/types.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IngestError;

/// Provider-native article object; field layout differs per provider.
pub type RawArticle = Value;

/// Provider-agnostic article record written to the output sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CanonicalArticle {
    pub content: String, // article title
    pub country: String, // inferred, or "World"
    pub date: String,    // D/M/YY, no leading zeros
    #[serde(rename = "Type")]
    pub kind: String, // outlet name
    pub source: String,  // article URL
}

/// One run's worth of accepted articles; one JSON document on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsBatch {
    #[serde(rename = "news articles")]
    pub articles: Vec<CanonicalArticle>,
}

/// JSON pointers (RFC 6901) locating the fields of one raw article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleFields {
    pub title: String,
    pub published_at: String,
    pub outlet: String,
    pub url: String,
}

impl ArticleFields {
    pub fn new(title: &str, published_at: &str, outlet: &str, url: &str) -> Self {
        Self {
            title: title.to_string(),
            published_at: published_at.to_string(),
            outlet: outlet.to_string(),
            url: url.to_string(),
        }
    }
}

/// Opaque "GET url -> JSON document" capability.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, url: &str) -> anyhow::Result<Value>;
}

/// One external news-search API.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fully-built request URL, credential included. Never log it.
    fn endpoint(&self) -> &str;

    fn fields(&self) -> &ArticleFields;

    /// Unwrap the provider's response envelope into raw article objects.
    fn extract_articles(&self, body: &Value) -> Result<Vec<RawArticle>, IngestError>;

    /// Single GET, no retries. Quota is enforced by the adapter before this runs.
    async fn fetch(&self, transport: &dyn Transport) -> Result<Value, IngestError> {
        transport
            .get_json(self.endpoint())
            .await
            .map_err(|e| IngestError::Transport {
                provider: self.name().to_string(),
                reason: format!("{e:#}"),
            })
    }
}
