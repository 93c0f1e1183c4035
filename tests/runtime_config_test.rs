//! Integration tests for runtime config persistence

use simtree::config::{RuntimeConfig, DEFAULT_CHANNEL_CAPACITY};
use simtree::SimTreeError;
use tempfile::tempdir;

#[test]
fn test_save_and_load_round_trip() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("runtime.toml");

    let config = RuntimeConfig {
        reply_timeout_ms: 750,
        channel_capacity: 16,
        log_frames: true,
    };
    config.save(&path)?;

    let loaded = RuntimeConfig::load(&path)?;
    assert_eq!(loaded, config);
    Ok(())
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = RuntimeConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, SimTreeError::Io(_)));
}

#[test]
fn test_load_malformed_toml_is_config_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "reply_timeout_ms = \"soon\"").unwrap();

    let err = RuntimeConfig::load(&path).unwrap_err();
    assert!(matches!(err, SimTreeError::Config(_)));
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("partial.toml");
    std::fs::write(&path, "log_frames = true\n").unwrap();

    let config = RuntimeConfig::load(&path).unwrap();
    assert!(config.log_frames);
    assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
}
