//! Tests for config module

use discovery::config::{default_config_path, Config, UNKNOWN_TYPES_ENV};
use discovery::UnknownTypePolicy;
use std::collections::HashMap;
use tempfile::tempdir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.decoding.unknown_types, UnknownTypePolicy::Lenient);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, "pretty");
    assert_eq!(config.decoder().policy(), UnknownTypePolicy::Lenient);
}

#[test]
fn test_default_config_path() {
    let path = default_config_path();
    assert!(path.ends_with(".discovery/config.toml"));
}

#[test]
fn test_load_missing_file_gives_defaults() {
    let temp = tempdir().unwrap();
    let config = Config::load_from(&temp.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_load_partial_file() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[decoding]
unknown_types = "strict"
"#,
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.decoding.unknown_types, UnknownTypePolicy::Strict);
    // Unspecified sections keep their defaults
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_load_invalid_policy_fails() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "[decoding]\nunknown_types = \"sometimes\"\n").unwrap();

    assert!(Config::load_from(&path).is_err());
}

#[test]
fn test_save_and_reload() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.decoding.unknown_types = UnknownTypePolicy::Strict;
    config.logging.level = "discovery=debug".to_string();
    config.logging.format = "json".to_string();
    config.save(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("unknown_types = \"strict\""));

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_overrides() {
    let vars = HashMap::from([(UNKNOWN_TYPES_ENV.to_string(), "STRICT".to_string())]);
    let mut config = Config::default();
    config.apply_overrides(|key| vars.get(key).cloned());
    assert_eq!(config.decoding.unknown_types, UnknownTypePolicy::Strict);
    assert_eq!(config.decoder().policy(), UnknownTypePolicy::Strict);
}

#[test]
fn test_invalid_override_is_ignored() {
    let vars = HashMap::from([(UNKNOWN_TYPES_ENV.to_string(), "maybe".to_string())]);
    let mut config = Config::default();
    config.decoding.unknown_types = UnknownTypePolicy::Strict;
    config.apply_overrides(|key| vars.get(key).cloned());
    assert_eq!(config.decoding.unknown_types, UnknownTypePolicy::Strict);
}

#[test]
fn test_no_override_keeps_file_value() {
    let mut config = Config::default();
    config.apply_overrides(|_| None);
    assert_eq!(config, Config::default());
}
