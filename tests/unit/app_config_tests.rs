/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use office_translator::app_config::{BackendKind, Config, LogLevel, TERMINOLOGY_NAME};
use office_translator::providers::bedrock::DEFAULT_MODEL_ID;
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "es");
    assert_eq!(config.backend.kind, BackendKind::Translate);
    assert_eq!(config.backend.region, None);
    assert_eq!(config.backend.bedrock.model_id, DEFAULT_MODEL_ID);
    assert_eq!(config.backend.bedrock.max_tokens, 1000);
    assert_eq!(config.backend.bedrock.temperature, 0.0);
    assert_eq!(config.backend.translate.terminology_name, TERMINOLOGY_NAME);
    assert_eq!(config.translation.concurrent_requests, 1);
    assert_eq!(config.translation.retry_count, 0);
    assert_eq!(config.translation.timeout_secs, 60);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();

    // Invalid source language
    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());

    // Auto-detection is only valid as source
    config.source_language = "auto".to_string();
    assert!(config.validate().is_ok());
    config.target_language = "auto".to_string();
    assert!(config.validate().is_err());
    config.target_language = "fr".to_string();

    config.translation.concurrent_requests = 0;
    assert!(config.validate().is_err());
    config.translation.concurrent_requests = 4;
    assert!(config.validate().is_ok());

    // Bedrock settings are only checked for the Bedrock backend
    config.backend.bedrock.temperature = 1.5;
    assert!(config.validate().is_ok());
    config.backend.kind = BackendKind::Bedrock;
    assert!(config.validate().is_err());
    config.backend.bedrock.temperature = 0.2;
    config.backend.bedrock.prompt_template = "Translate please".to_string();
    assert!(config.validate().is_err());
}

/// Test loading a partial JSON file
#[test]
fn test_config_from_file_withPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        br#"{
            "target_language": "de",
            "backend": { "type": "bedrock", "region": "eu-central-1", "bedrock": { "model_id": "anthropic.claude-3-haiku" } },
            "translation": { "concurrent_requests": 8 },
            "log_level": "debug"
        }"#,
    )?;

    let config = Config::from_file(&path)?;

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "de");
    assert_eq!(config.backend.kind, BackendKind::Bedrock);
    assert_eq!(config.backend.region.as_deref(), Some("eu-central-1"));
    assert_eq!(config.backend.bedrock.model_id, "anthropic.claude-3-haiku");
    assert_eq!(config.backend.bedrock.max_tokens, 1000);
    assert_eq!(config.translation.concurrent_requests, 8);
    assert_eq!(config.translation.retry_backoff_ms, 1000);
    assert_eq!(config.log_level, LogLevel::Debug);
    Ok(())
}

/// Test the implicit and explicit configuration paths
#[test]
fn test_config_load_withMissingFile_shouldDependOnExplicitness() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let missing = temp_dir.path().join("conf.json");

    assert_eq!(Config::load(&missing, false)?, Config::default());
    assert!(Config::load(&missing, true).is_err());
    Ok(())
}

/// Test that malformed JSON is rejected
#[test]
fn test_config_from_file_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", b"{ not json")?;

    assert!(Config::from_file(&path).is_err());
    Ok(())
}

/// Test backend kind parsing and display
#[test]
fn test_backend_kind_withStrings_shouldParseAndDisplay() {
    assert_eq!("Bedrock".parse::<BackendKind>().unwrap(), BackendKind::Bedrock);
    assert_eq!("translate".parse::<BackendKind>().unwrap(), BackendKind::Translate);
    assert!("openai".parse::<BackendKind>().is_err());
    assert_eq!(BackendKind::Bedrock.to_string(), "bedrock");
    assert_eq!(BackendKind::Translate.display_name(), "Amazon Translate");
}

/// Test that a config survives serialization
#[test]
fn test_config_serialization_withCustomValues_shouldRoundTrip() -> Result<()> {
    let mut config = Config::default();
    config.backend.kind = BackendKind::Bedrock;
    config.backend.region = Some("us-west-2".to_string());
    config.translation.retry_count = 3;

    let json = serde_json::to_string_pretty(&config)?;
    assert!(json.contains(r#""type": "bedrock""#));

    let parsed: Config = serde_json::from_str(&json)?;
    assert_eq!(parsed, config);
    Ok(())
}

/// Test log level conversion
#[test]
fn test_log_level_withEachLevel_shouldMapToFilter() {
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
