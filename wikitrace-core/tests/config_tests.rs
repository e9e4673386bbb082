// Tests for tracker configuration

use std::fs;
use tempfile::TempDir;
use wikitrace_core::config::CONFIG_FILE_NAME;
use wikitrace_core::{DEFAULT_WINDOW_MS, TraceError, TrackerConfig};

#[test]
fn test_defaults() {
    let config = TrackerConfig::default();
    assert_eq!(config.window_ms, DEFAULT_WINDOW_MS);
    assert!(config.persist_pending);
    assert!(config.keep_history);
    assert_eq!(config.window().num_milliseconds(), 10_000);
}

#[test]
fn test_missing_file_gives_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = TrackerConfig::load(&temp_dir.path().join(CONFIG_FILE_NAME)).unwrap();
    assert_eq!(config, TrackerConfig::default());
}

#[test]
fn test_partial_file_fills_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "window-ms = 2500\n").unwrap();

    let config = TrackerConfig::load(&path).unwrap();
    assert_eq!(config.window_ms, 2_500);
    assert!(config.persist_pending);
    assert!(config.keep_history);
}

#[test]
fn test_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(CONFIG_FILE_NAME);
    let config = TrackerConfig {
        keep_history: false,
        ..TrackerConfig::default()
    }
    .with_window_ms(4_000);

    config.save(&path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("window-ms = 4000"));
    assert_eq!(TrackerConfig::load(&path).unwrap(), config);
}

#[test]
fn test_invalid_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "window-ms = \"soon\"\n").unwrap();

    let err = TrackerConfig::load(&path).unwrap_err();
    assert!(matches!(err, TraceError::ConfigError(_)));
}
