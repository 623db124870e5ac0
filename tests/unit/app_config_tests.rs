/*!
 * Tests for app configuration loading
 */

use anyhow::Result;
use std::fs;
use vidcaption::app_config::{Config, LogLevel};
use vidcaption::captions::Position;

use crate::common;

/// Test that a missing config file is created with default values
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config, Config::default());

    let written: Config = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(written, config);

    Ok(())
}

/// Test that an existing config file is read rather than overwritten
#[test]
fn test_loadOrCreate_withExistingFile_shouldReadIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let json = r#"{
        "style": { "position": "top", "shadow": true, "max_chars": 30 },
        "transcription": { "model": "small", "language": "en" },
        "max_concurrent_jobs": 3,
        "log_level": "warn"
    }"#;
    let path = common::create_test_file(temp_dir.path(), "conf.json", json.as_bytes())?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.style.position, Position::Top);
    assert!(config.style.shadow);
    assert_eq!(config.style.max_chars, 30);
    assert_eq!(config.transcription.model, "small");
    assert_eq!(config.transcription.language.as_deref(), Some("en"));
    assert_eq!(config.transcription.command, "whisper");
    assert_eq!(config.max_concurrent_jobs, Some(3));
    assert_eq!(config.log_level, LogLevel::Warn);
    assert!(config.validate().is_ok());

    // The file on disk is left untouched
    assert_eq!(fs::read_to_string(&path)?, json);

    Ok(())
}

/// Test that malformed JSON is reported with the file path
#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", b"{ not json")?;

    let err = Config::load_or_create(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));

    Ok(())
}

/// Test that invalid style defaults fail validation
#[test]
fn test_validate_withZeroFontSize_shouldFail() {
    let mut config = common::test_config(std::path::Path::new("/tmp/vidcaption-test"));
    config.style.font_size = 0;

    assert!(config.validate().is_err());
}
