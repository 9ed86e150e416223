use std::time::Duration;

use rowflow::config::{EngineConfig, EngineConfigStore};

#[test]
fn defaults_match_the_observed_engine_behavior() {
    let config = EngineConfig::default();
    assert_eq!(config.render_budget_ms, 200);
    assert_eq!(config.progress_interval, 10);
    assert_eq!(config.overscan, 5);
    assert_eq!(config.render_budget(), Duration::from_millis(200));
}

#[test]
fn render_schedule_guards_against_a_zero_progress_interval() {
    let config = EngineConfig {
        progress_interval: 0,
        ..EngineConfig::default()
    };
    assert_eq!(config.render_schedule().progress_interval, 1);
}

#[test]
fn load_or_default_returns_defaults_when_the_file_is_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = EngineConfigStore::at(dir.path().join("engine.toml"));
    let config = store.load_or_default().expect("load");
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = EngineConfigStore::at(dir.path().join("nested").join("engine.toml"));

    let config = EngineConfig {
        render_budget_ms: 50,
        progress_interval: 4,
        overscan: 12,
    };
    store.save(&config).expect("save");
    assert_eq!(store.load_or_default().expect("load"), config);
}

#[test]
fn missing_keys_fall_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "render_budget_ms = 75\n").expect("write");

    let config = EngineConfigStore::at(&path).load_or_default().expect("load");
    assert_eq!(config.render_budget_ms, 75);
    assert_eq!(config.progress_interval, 10);
    assert_eq!(config.overscan, 5);
}

#[test]
fn malformed_toml_is_an_error_not_a_silent_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "render_budget_ms = \"fast\"\n").expect("write");

    assert!(EngineConfigStore::at(&path).load_or_default().is_err());
}
