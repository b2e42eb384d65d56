// src/ingest/providers/mod.rs
//! News-search API providers.
//!
//! Every supported API answers a GET with a JSON envelope holding an array of
//! article objects, so one [`JsonApiProvider`] covers them all; the per-API
//! modules only know the URL shape and where the fields live.

pub mod gnews;
pub mod newsapi;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::error::IngestError;
use crate::ingest::types::{ArticleFields, NewsProvider, RawArticle};

#[derive(Debug)]
pub struct JsonApiProvider {
    name: String,
    endpoint: String,
    articles_pointer: String,
    fields: ArticleFields,
}

impl JsonApiProvider {
    pub fn new(name: &str, endpoint: &str, articles_pointer: &str, fields: ArticleFields) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            articles_pointer: articles_pointer.to_string(),
            fields,
        }
    }

    /// Same API under another registry name, e.g. two NewsAPI keys.
    pub fn renamed(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Build the endpoint from a base URL and query parameters (percent-encoded).
    pub fn from_params<'p, I>(
        name: &str,
        base_url: &str,
        params: I,
        articles_pointer: &str,
        fields: ArticleFields,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (&'p str, &'p str)>,
    {
        let url = reqwest::Url::parse_with_params(base_url, params)
            .with_context(|| format!("invalid base url for provider {name}"))?;
        Ok(Self::new(name, url.as_str(), articles_pointer, fields))
    }
}

#[async_trait]
impl NewsProvider for JsonApiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn fields(&self) -> &ArticleFields {
        &self.fields
    }

    fn extract_articles(&self, body: &Value) -> Result<Vec<RawArticle>, IngestError> {
        match body.pointer(&self.articles_pointer).and_then(Value::as_array) {
            Some(items) => Ok(items.clone()),
            None => Err(IngestError::Transport {
                provider: self.name.clone(),
                reason: format!(
                    "response has no article array at {}{}",
                    self.articles_pointer,
                    api_error_hint(body)
                ),
            }),
        }
    }
}

// NewsAPI reports `{"status":"error","message":..}`, GNews `{"errors":[..]}`.
fn api_error_hint(body: &Value) -> String {
    if let Some(msg) = body.get("message").and_then(Value::as_str) {
        return format!(" ({msg})");
    }
    if let Some(errs) = body.get("errors") {
        return format!(" ({errs})");
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p() -> JsonApiProvider {
        JsonApiProvider::new(
            "Test",
            "https://news.test/search",
            "/data/items",
            ArticleFields::new("/headline", "/ts", "/site", "/link"),
        )
    }

    #[test]
    fn extracts_nested_article_array() {
        let body = json!({ "data": { "items": [ { "headline": "x" }, { "headline": "y" } ] } });
        assert_eq!(p().extract_articles(&body).unwrap().len(), 2);
    }

    #[test]
    fn missing_array_is_a_provider_failure_with_hint() {
        let body = json!({ "status": "error", "message": "apiKeyInvalid" });
        let err = p().extract_articles(&body).unwrap_err();
        assert!(matches!(err, IngestError::Transport { .. }));
        assert!(err.to_string().contains("apiKeyInvalid"));
    }

    #[test]
    fn params_are_percent_encoded() {
        let p = JsonApiProvider::from_params(
            "Test",
            "https://news.test/search",
            [("q", "covid OR pandemic"), ("lang", "en")],
            "/articles",
            ArticleFields::new("/title", "/publishedAt", "/source/name", "/url"),
        )
        .unwrap();
        assert_eq!(
            p.endpoint(),
            "https://news.test/search?q=covid+OR+pandemic&lang=en"
        );
    }
}
