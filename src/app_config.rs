use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

use crate::providers::bedrock::{DEFAULT_MODEL_ID, DEFAULT_PROMPT_TEMPLATE};
use crate::translation::TranslationOptions;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and defaulting configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Source language code (ISO 639-1, or `auto`)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO 639-1)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Translation call settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    // @backend: Amazon Translate
    #[default]
    Translate,
    // @backend: Amazon Bedrock
    Bedrock,
}

impl BackendKind {
    // @returns: Service name for display
    pub fn display_name(&self) -> &str {
        match self {
            Self::Translate => "Amazon Translate",
            Self::Bedrock => "Amazon Bedrock",
        }
    }

    // @returns: Lowercase backend identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Translate => "translate".to_string(),
            Self::Bedrock => "bedrock".to_string(),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "translate" => Ok(Self::Translate),
            "bedrock" => Ok(Self::Bedrock),
            _ => Err(anyhow!("Invalid backend type: {}", s)),
        }
    }
}

/// Backend selection and per-backend settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct BackendConfig {
    // @field: Backend type identifier
    #[serde(rename = "type", default)]
    pub kind: BackendKind,

    // @field: AWS region; AWS_REGION is used when absent
    #[serde(default)]
    pub region: Option<String>,

    // @field: Bedrock settings
    #[serde(default)]
    pub bedrock: BedrockConfig,

    // @field: Amazon Translate settings
    #[serde(default)]
    pub translate: TranslateConfig,
}

/// Amazon Bedrock settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BedrockConfig {
    /// Model identifier
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Maximum tokens in the model's answer
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (0.0 to 1.0)
    #[serde(default)]
    pub temperature: f32,

    /// Instruction prompt with `{source}`, `{target}` and `{text}` placeholders
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            prompt_template: default_prompt_template(),
        }
    }
}

/// Amazon Translate settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslateConfig {
    /// Name the glossary is registered under
    #[serde(default = "default_terminology_name")]
    pub terminology_name: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            terminology_name: default_terminology_name(),
        }
    }
}

/// Translation call settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    /// Maximum number of concurrent requests within one sheet or slide
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Retry count for retryable failures
    #[serde(default)]
    pub retry_count: u32,

    /// Backoff for the first retry (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            concurrent_requests: default_concurrent_requests(),
            retry_count: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TranslationConfig {
    /// Options for the translation port
    pub fn options(&self) -> TranslationOptions {
        TranslationOptions {
            concurrent_requests: self.concurrent_requests,
            retry_count: self.retry_count,
            retry_backoff_ms: self.retry_backoff_ms,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Fixed glossary name used by the Amazon Translate backend
pub const TERMINOLOGY_NAME: &str = "excel-translator-terminology";

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "es".to_string()
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_prompt_template() -> String {
    DEFAULT_PROMPT_TEMPLATE.to_string()
}

fn default_terminology_name() -> String {
    TERMINOLOGY_NAME.to_string()
}

fn default_concurrent_requests() -> usize {
    1 // Strictly sequential unless configured
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_timeout_secs() -> u64 {
    60
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load configuration, falling back to defaults when an implicit path is absent
    ///
    /// An explicitly requested file must exist.
    pub fn load<P: AsRef<Path>>(path: P, explicit: bool) -> Result<Self> {
        let path = path.as_ref();
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        crate::language_utils::validate_source_language(&self.source_language)?;
        crate::language_utils::validate_target_language(&self.target_language)?;

        if self.translation.concurrent_requests == 0 {
            return Err(anyhow!("translation.concurrent_requests must be at least 1"));
        }
        if self.translation.timeout_secs == 0 {
            return Err(anyhow!("translation.timeout_secs must be at least 1"));
        }

        match self.backend.kind {
            BackendKind::Bedrock => {
                let bedrock = &self.backend.bedrock;
                if bedrock.model_id.trim().is_empty() {
                    return Err(anyhow!("backend.bedrock.model_id is required for the Bedrock backend"));
                }
                if bedrock.max_tokens == 0 {
                    return Err(anyhow!("backend.bedrock.max_tokens must be at least 1"));
                }
                if !(0.0..=1.0).contains(&bedrock.temperature) {
                    return Err(anyhow!(
                        "backend.bedrock.temperature must be between 0.0 and 1.0, got {}",
                        bedrock.temperature
                    ));
                }
                if !bedrock.prompt_template.contains("{text}") {
                    return Err(anyhow!("backend.bedrock.prompt_template must contain {{text}}"));
                }
            }
            BackendKind::Translate => {
                if self.backend.translate.terminology_name.trim().is_empty() {
                    return Err(anyhow!("backend.translate.terminology_name cannot be empty"));
                }
            }
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            backend: BackendConfig::default(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
