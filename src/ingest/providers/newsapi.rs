// src/ingest/providers/newsapi.rs
use anyhow::Result;

use super::JsonApiProvider;
use crate::ingest::types::ArticleFields;

pub const NAME: &str = "NewsAPI";
pub const BASE_URL: &str = "https://newsapi.org/v2/everything";
pub const DEFAULT_QUERY: &str = "covid OR pandemic OR coronavirus";
pub const DEFAULT_DAILY_QUOTA: u32 = 100;

pub fn fields() -> ArticleFields {
    ArticleFields::new("/title", "/publishedAt", "/source/name", "/url")
}

/// newsapi.org `/v2/everything`, English only.
pub fn provider(api_key: &str, query: &str) -> Result<JsonApiProvider> {
    JsonApiProvider::from_params(
        NAME,
        BASE_URL,
        [("language", "en"), ("apiKey", api_key), ("q", query)],
        "/articles",
        fields(),
    )
}
