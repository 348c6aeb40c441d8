//! Tests for config module

use parametric::config::{expand_tilde, Config};
use parametric::request::SortOrder;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.engine.default_max_values, 10);
    assert_eq!(config.engine.default_sort, SortOrder::DocumentCount);
    assert!(config.engine.parametric_fields.is_empty());
    assert!(config.cache.enabled);
    assert_eq!(config.cache.max_entries, 1000);
    assert_eq!(config.observability.log_format, "pretty");
    assert_eq!(config.observability.log_level, "info,parametric=debug");
}

#[test]
fn test_expand_tilde() {
    let home = dirs::home_dir().unwrap();

    let expanded = expand_tilde(&PathBuf::from("~/docs.json")).unwrap();
    assert_eq!(expanded, home.join("docs.json"));

    let expanded = expand_tilde(&PathBuf::from("~")).unwrap();
    assert_eq!(expanded, home);

    let expanded = expand_tilde(&PathBuf::from("/absolute/path")).unwrap();
    assert_eq!(expanded, PathBuf::from("/absolute/path"));
}

#[test]
fn test_partial_toml_uses_defaults() {
    let config = Config::from_toml_str(
        r#"
        [engine]
        default_sort = "alphabetical"
        parametric_fields = ["CATEGORY", "/DOCUMENT/REGION"]

        [cache]
        max_entries = 50
        "#,
    )
    .unwrap();

    assert_eq!(config.engine.default_sort, SortOrder::Alphabetical);
    assert_eq!(config.engine.default_max_values, 10);
    assert_eq!(config.engine.parametric_fields.len(), 2);
    assert!(config.cache.enabled);
    assert_eq!(config.cache.max_entries, 50);
    assert_eq!(config.observability.log_format, "pretty");
}

#[test]
fn test_invalid_values_rejected() {
    let err = Config::from_toml_str("[cache]\nmax_entries = 0\n").unwrap_err();
    assert!(err.to_string().contains("max_entries"));

    let err = Config::from_toml_str("[observability]\nlog_format = \"xml\"\n").unwrap_err();
    assert!(err.to_string().contains("log_format"));

    assert!(Config::from_toml_str("[engine]\ndefault_sort = \"sideways\"\n").is_err());
}

#[test]
fn test_save_and_load() {
    let temp = tempdir().unwrap();
    let config_path = temp.path().join("config.toml");

    let mut config = Config::default();
    config.engine.default_max_values = 25;
    config.engine.documents = Some(temp.path().join("docs.json"));
    config.cache.enabled = false;
    config.observability.log_format = "json".to_string();

    config.save(&config_path).unwrap();
    let loaded = Config::load_or_create(&config_path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_load_or_create_writes_default() {
    let temp = tempdir().unwrap();
    let config_path = temp.path().join("nested").join("config.toml");

    let config = Config::load_or_create(&config_path).unwrap();

    assert_eq!(config, Config::default());
    assert!(config_path.exists());
}

#[test]
fn test_load_or_create_unwritable_location_falls_back_to_default() {
    let temp = tempdir().unwrap();
    let blocker = temp.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();

    // The parent is a regular file, so the default cannot be written.
    let config_path = blocker.join("config.toml");
    let config = Config::load_or_create(&config_path).unwrap();

    assert_eq!(config, Config::default());
    assert!(!config_path.exists());
}
