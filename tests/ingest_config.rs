// tests/ingest_config.rs
use pandemic_news_feed::ingest::config::{load_config_default, load_config_from, ENV_PATH};
use pandemic_news_feed::RunMode;
use std::{env, fs, path::PathBuf};

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("news.toml");
    fs::write(
        &p_toml,
        r#"
[run]
mode = "all"
request_timeout_secs = 5

[[providers]]
name = "NewsAPI"
kind = "newsapi"
api_key = "k"
"#,
    )
    .unwrap();
    let c = load_config_from(&p_toml).unwrap();
    assert_eq!(c.run.mode, RunMode::All);
    assert_eq!(c.providers[0].daily_quota, 100);

    let p_json = dir.path().join("news.json");
    fs::write(&p_json, r#"{ "paths": { "ledger": "state/titles.txt" } }"#).unwrap();
    let cj = load_config_from(&p_json).unwrap();
    assert_eq!(cj.paths.ledger, PathBuf::from("state/titles.txt"));
    assert_eq!(cj.paths.output, PathBuf::from("news_file.json"));
}

#[test]
fn unknown_provider_kind_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("news.toml");
    fs::write(
        &p,
        r#"
[[providers]]
name = "X"
kind = "carrier-pigeon"
api_key = "k"
"#,
    )
    .unwrap();
    assert!(load_config_from(&p).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_PATH);

    // 1) nothing -> defaults
    let c = load_config_default().unwrap();
    assert_eq!(c.run.mode, RunMode::Single);

    // 2) ./config/news.toml
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("news.toml"), "[run]\nmode = \"all\"\n").unwrap();
    assert_eq!(load_config_default().unwrap().run.mode, RunMode::All);

    // 3) env wins
    let p_env = tmp.path().join("elsewhere.json");
    fs::write(&p_env, r#"{ "run": { "mode": "single" } }"#).unwrap();
    env::set_var(ENV_PATH, p_env.display().to_string());
    assert_eq!(load_config_default().unwrap().run.mode, RunMode::Single);

    // 4) env pointing nowhere is an error
    env::set_var(ENV_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(load_config_default().is_err());
    env::remove_var(ENV_PATH);

    env::set_current_dir(&old).unwrap();
}
