// src/ingest/providers/gnews.rs
use anyhow::Result;

use super::JsonApiProvider;
use crate::ingest::types::ArticleFields;

pub const NAME: &str = "GNews";
pub const BASE_URL: &str = "https://gnews.io/api/v4/search";
pub const DEFAULT_QUERY: &str = "covid OR pandemic OR coronavirus OR omicron";
pub const DEFAULT_DAILY_QUOTA: u32 = 100;

/// GNews output keeps the outlet homepage (`source.url`) as the source link,
/// not the story URL.
pub fn fields() -> ArticleFields {
    ArticleFields::new("/title", "/publishedAt", "/source/name", "/source/url")
}

/// gnews.io `/api/v4/search`, English only.
pub fn provider(api_key: &str, query: &str) -> Result<JsonApiProvider> {
    JsonApiProvider::from_params(
        NAME,
        BASE_URL,
        [("token", api_key), ("lang", "en"), ("q", query)],
        "/articles",
        fields(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::NewsProvider;
    use serde_json::json;

    #[test]
    fn source_link_is_outlet_homepage() {
        let p = provider("tok", DEFAULT_QUERY).unwrap();
        assert!(p.endpoint().contains("token=tok"));
        let body = json!({
            "totalArticles": 1,
            "articles": [{
                "title": "Omicron cases fall",
                "publishedAt": "2022-02-01T12:00:00Z",
                "url": "https://straits.test/story",
                "source": { "name": "The Straits Times", "url": "https://straits.test" }
            }]
        });
        let raws = p.extract_articles(&body).unwrap();
        assert_eq!(
            raws[0].pointer(&p.fields().url).and_then(|v| v.as_str()),
            Some("https://straits.test")
        );
    }
}
