// tests/scrape_config.rs
//
// Config file loading and env overrides. Tests touching process env run
// serially.

use serial_test::serial;
use std::env;
use std::fs;
use tempfile::tempdir;

use ai_geek_toolbox::config::scrape::{
    ENV_CONFIG_PATH, ENV_DB_PATH, ENV_SOURCE_URL, ENV_TIMEOUT_SECS,
};
use ai_geek_toolbox::ScrapeConfig;

fn clear_env() {
    for k in [ENV_CONFIG_PATH, ENV_SOURCE_URL, ENV_TIMEOUT_SECS, ENV_DB_PATH] {
        env::remove_var(k);
    }
}

#[test]
#[serial]
fn toml_file_is_loaded_and_env_overrides_apply() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("scrape.toml");
    fs::write(
        &path,
        r#"
source_name = "example"
source_url = "https://example.com/list"
max_candidates = 7

[rules]
blocks = [".item"]
name = [{ selector = ".item-title" }]
"#,
    )
    .unwrap();

    env::set_var(ENV_CONFIG_PATH, &path);
    env::set_var(ENV_TIMEOUT_SECS, "5");
    env::set_var(ENV_DB_PATH, "/tmp/toolbox-test.sqlite");
    let cfg = ScrapeConfig::load_default().unwrap();
    clear_env();

    assert_eq!(cfg.source_name, "example");
    assert_eq!(cfg.source_url, "https://example.com/list");
    assert_eq!(cfg.max_candidates, 7);
    assert_eq!(cfg.timeout_secs, 5);
    assert_eq!(cfg.database_path, "/tmp/toolbox-test.sqlite");
    assert_eq!(cfg.rules.blocks, vec![".item".to_string()]);
    assert_eq!(cfg.rules.name[0].selector.as_deref(), Some(".item-title"));
}

#[test]
#[serial]
fn json_file_is_accepted() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("scrape.json");
    fs::write(&path, r#"{ "source_url": "https://example.org/", "timeout_secs": 10 }"#).unwrap();

    let cfg = ScrapeConfig::load_from_file(&path).unwrap();
    assert_eq!(cfg.source_url, "https://example.org/");
    assert_eq!(cfg.timeout_secs, 10);
    assert_eq!(cfg.max_candidates, 20);
}

#[test]
#[serial]
fn missing_config_path_is_an_error() {
    clear_env();
    env::set_var(ENV_CONFIG_PATH, "/definitely/not/here/scrape.toml");
    let res = ScrapeConfig::load_default();
    clear_env();
    assert!(res.is_err());
}

#[test]
#[serial]
fn invalid_selector_in_file_is_rejected() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("scrape.toml");
    fs::write(&path, "[rules]\nblocks = [\"div[[\"]\n").unwrap();

    let err = ScrapeConfig::load_from_file(&path).unwrap_err();
    assert!(format!("{err:#}").contains("selector"), "{err:#}");
}

#[test]
#[serial]
fn bad_timeout_override_is_an_error() {
    clear_env();
    env::set_var(ENV_TIMEOUT_SECS, "soon");
    let dir = tempdir().unwrap();
    let path = dir.path().join("scrape.toml");
    fs::write(&path, "").unwrap();

    let res = ScrapeConfig::load_from_file(&path);
    clear_env();
    assert!(res.is_err());
}
