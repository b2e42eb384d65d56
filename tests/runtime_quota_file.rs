// tests/runtime_quota_file.rs
use pandemic_news_feed::ingest::config::load_config_from;
use pandemic_news_feed::ingest::output::MemorySink;
use pandemic_news_feed::ingest::providers::JsonApiProvider;
use pandemic_news_feed::ingest::quota::QuotaState;
use pandemic_news_feed::ingest::transport::StaticTransport;
use pandemic_news_feed::ingest::types::ArticleFields;
use pandemic_news_feed::runtime::NewsRuntime;
use pandemic_news_feed::{CountryClassifier, MemoryLedger, ProviderRegistry, RunMode};
use serde_json::json;
use std::fs;

#[test]
fn reset_quota_file_zeroes_configured_providers() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("quota_state.json");
    let cfg_path = dir.path().join("news.toml");
    fs::write(
        &cfg_path,
        format!(
            r#"
[paths]
quota_state = "{}"

[[providers]]
name = "NewsAPI"
kind = "newsapi"
api_key = "k"

[[providers]]
name = "GNews"
kind = "gnews"
api_key = "t"
"#,
            state_path.display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();
    fs::write(&state_path, r#"{ "providers": { "NewsAPI": 100, "GNews": 37 } }"#).unwrap();

    let cfg = load_config_from(&cfg_path).unwrap();
    let state = NewsRuntime::reset_quota_file(&cfg).unwrap();
    assert_eq!(state.providers["NewsAPI"], 0);
    assert_eq!(state.providers["GNews"], 0);

    let on_disk = QuotaState::load(&state_path).unwrap();
    assert_eq!(on_disk, state);
}

#[serial_test::serial]
#[test]
fn reset_needs_no_api_keys_and_keeps_unconfigured_entries() {
    std::env::remove_var("NEWSAPI_API_KEY");
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("quota_state.json");
    let cfg_path = dir.path().join("news.toml");
    fs::write(
        &cfg_path,
        format!(
            r#"
[paths]
quota_state = "{}"

[[providers]]
name = "NewsAPI"
kind = "newsapi"
api_key = "ENV"
"#,
            state_path.display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();
    fs::write(&state_path, r#"{ "providers": { "NewsAPI": 100, "Retired": 12 } }"#).unwrap();

    let cfg = load_config_from(&cfg_path).unwrap();
    let state = NewsRuntime::reset_quota_file(&cfg).unwrap();
    assert_eq!(state.providers["NewsAPI"], 0);
    assert_eq!(state.providers["Retired"], 0);
    assert_eq!(QuotaState::load(&state_path).unwrap(), state);
}

fn wire_runtime() -> NewsRuntime {
    let url = "https://news.test/search";
    let t = StaticTransport::new().with(
        url,
        json!({ "articles": [{
            "title": "Bangkok reopens schools",
            "publishedAt": "2022-01-10T08:00:00Z",
            "source": { "name": "Wire" },
            "url": "https://news.test/1"
        }]}),
    );
    let mut reg = ProviderRegistry::new();
    reg.register(
        Box::new(JsonApiProvider::new(
            "Wire",
            url,
            "/articles",
            ArticleFields::new("/title", "/publishedAt", "/source/name", "/url"),
        )),
        5,
    )
    .unwrap();
    NewsRuntime::with_parts(
        reg,
        Box::new(t),
        CountryClassifier::default(),
        Box::new(MemoryLedger::new()),
        Box::new(MemorySink::default()),
        RunMode::Single,
    )
}

#[tokio::test]
async fn saved_state_keeps_counters_of_unregistered_providers() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("quota_state.json");
    fs::write(&state_path, r#"{ "providers": { "Wire": 2, "Retired": 7 } }"#).unwrap();

    let mut rt = wire_runtime().with_quota_file(&state_path).unwrap();
    assert_eq!(rt.registry.get("Wire").unwrap().quota().used(), 2);
    rt.run_once().await.unwrap();

    let on_disk = QuotaState::load(&state_path).unwrap();
    assert_eq!(on_disk.providers["Wire"], 3);
    assert_eq!(on_disk.providers["Retired"], 7);
}

#[tokio::test]
async fn unsaved_quota_state_still_returns_the_summary() {
    let dir = tempfile::tempdir().unwrap();
    let state_dir = dir.path().join("state");
    let mut rt = wire_runtime()
        .with_quota_file(state_dir.join("quota_state.json"))
        .unwrap();
    // a plain file where the state directory should go
    fs::write(&state_dir, "").unwrap();

    let s = rt.run_once().await.unwrap();
    assert_eq!(s.accepted, 1);
    assert_eq!(rt.registry.get("Wire").unwrap().quota().used(), 1);
}
