//! Configuration tests
//!
//! The round-trip tests guard the config file template: when a field is
//! added to `Config`, they fail until `to_toml` and the `File*` structs
//! agree on it.

use super::*;
use std::collections::HashMap;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Round-trip tests
// ─────────────────────────────────────────────────────────────────────────────

/// Verify that serialized config can be parsed back.
#[test]
fn test_config_roundtrip_default() {
    let config = Config::default();
    let toml_str = config.to_toml();

    let parsed: Result<FileConfig, _> = toml::from_str(&toml_str);
    assert!(
        parsed.is_ok(),
        "Default config should round-trip.\nTOML:\n{}\nError: {:?}",
        toml_str,
        parsed.err()
    );
}

/// Non-default values survive serialization
#[test]
fn test_config_roundtrip_custom_values() {
    let mut config = Config::default();
    config.scheduler.interval_ms = 100;
    config.grid.default_size = 36;
    config.grid.default_title = "Shop \"deluxe\"".to_string();
    config.grid.interaction_cancelled = true;
    config.logging.level = "debug".to_string();
    config.logging.file_enabled = true;
    config.logging.file_rotation = LogRotation::Hourly;
    config.demo.refresh = false;
    config.demo.size = 45;

    let parsed = Config::from_toml_str(&config.to_toml()).unwrap();
    assert_eq!(parsed.scheduler, config.scheduler);
    assert_eq!(parsed.grid, config.grid);
    assert_eq!(parsed.logging, config.logging);
    assert_eq!(parsed.demo, config.demo);
}

// ─────────────────────────────────────────────────────────────────────────────
// Partial files
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_file_gives_defaults() {
    let config = Config::from_toml_str("").unwrap();
    assert_eq!(config.scheduler.interval_ms, 50);
    assert_eq!(config.grid, GridDefaults::default());
    assert_eq!(config.logging, LoggingConfig::default());
    assert!(config.enable_tui);
}

#[test]
fn test_partial_section_keeps_other_defaults() {
    let config = Config::from_toml_str(
        r#"
[grid]
default_title = "Bank"

[logging]
file_rotation = "NEVER"
"#,
    )
    .unwrap();
    assert_eq!(config.grid.default_title, "Bank");
    assert_eq!(config.grid.default_size, 9);
    assert_eq!(config.logging.file_rotation, LogRotation::Never);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_unknown_rotation_falls_back_to_daily() {
    assert_eq!(LogRotation::parse("weekly"), LogRotation::Daily);
    assert_eq!(LogRotation::parse("Hourly"), LogRotation::Hourly);
    assert_eq!(
        tracing_appender::rolling::Rotation::from(LogRotation::Never),
        tracing_appender::rolling::Rotation::NEVER
    );
}

#[test]
fn test_filter_directive_targets_the_crate() {
    let mut logging = LoggingConfig::default();
    assert_eq!(logging.filter_directive(), "slotgrid=info");
    logging.level = " debug ".to_string();
    assert_eq!(logging.filter_directive(), "slotgrid=debug");
}

#[test]
fn test_invalid_file_is_an_error() {
    assert!(Config::from_toml_str("[scheduler]\ninterval_ms = \"fast\"").is_err());
}

#[test]
fn test_zero_interval_is_clamped() {
    let config = SchedulerConfig { interval_ms: 0 };
    assert_eq!(config.interval(), Duration::from_millis(1));
    assert_eq!(
        SchedulerConfig::default().interval(),
        Duration::from_millis(50)
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Environment overrides
// ─────────────────────────────────────────────────────────────────────────────

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn test_env_overrides_file() {
    let mut config =
        Config::from_toml_str("[scheduler]\ninterval_ms = 200\n[logging]\nlevel = \"warn\"")
            .unwrap();
    config.apply_env(env(&[
        ("SLOTGRID_INTERVAL_MS", "25"),
        ("SLOTGRID_LOG_LEVEL", "trace"),
        ("SLOTGRID_NO_TUI", "true"),
    ]));
    assert_eq!(config.scheduler.interval_ms, 25);
    assert_eq!(config.logging.level, "trace");
    assert!(!config.enable_tui);
}

#[test]
fn test_unparseable_env_interval_is_ignored() {
    let mut config = Config::default();
    config.apply_env(env(&[("SLOTGRID_INTERVAL_MS", "soon"), ("SLOTGRID_NO_TUI", "0")]));
    assert_eq!(config.scheduler.interval_ms, 50);
    assert!(config.enable_tui);
}

// ─────────────────────────────────────────────────────────────────────────────
// Files on disk
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::from_path(&dir.path().join("config.toml")).unwrap();
    assert_eq!(config.demo, DemoConfig::default());
}

#[test]
fn test_write_default_if_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    assert!(Config::write_default_if_missing(&path).unwrap());
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("[scheduler]"));

    // never overwrites
    std::fs::write(&path, "[demo]\nsize = 18\n").unwrap();
    assert!(!Config::write_default_if_missing(&path).unwrap());
    assert_eq!(Config::from_path(&path).unwrap().demo.size, 18);
}

#[test]
fn test_broken_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[grid\n").unwrap();

    let err = Config::from_path(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("config.toml"));
}
