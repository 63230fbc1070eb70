/*!
 * Translation backends.
 *
 * This module contains client implementations for the supported services:
 * - `amazon_translate`: Amazon Translate (structured requests, terminology resources)
 * - `bedrock`: Amazon Bedrock (instruction prompt to an Anthropic model)
 * - `aws_auth`: AWS credentials and Signature Version 4 request signing
 * - `mock`: deterministic test double
 */

use std::collections::BTreeSet;
use std::fmt::Debug;

use async_trait::async_trait;

use crate::errors::TranslationError;

/// Common trait for all translation backends
///
/// The document walkers only ever see this trait, so backends can be
/// swapped by configuration or replaced with a test double.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Translate one piece of text
    ///
    /// # Arguments
    /// * `text` - Non-empty text to translate
    /// * `source_language` - Source language code (`auto` lets the backend detect it)
    /// * `target_language` - Target language code
    /// * `glossary_refs` - Names of terminology resources to apply
    ///
    /// # Returns
    /// * `Result<String, TranslationError>` - The translated text, trimmed
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        glossary_refs: &BTreeSet<String>,
    ) -> Result<String, TranslationError>;

    /// Register a CSV glossary under `name`, replacing an existing one
    async fn import_terminology(&self, name: &str, _csv: &[u8]) -> Result<(), TranslationError> {
        Err(TranslationError::Unsupported(format!(
            "{} cannot import terminology '{}'",
            self.name(),
            name
        )))
    }

    /// Whether `import_terminology` is implemented
    fn supports_terminology(&self) -> bool {
        false
    }
}

/// Map an HTTP error status and body to a translation error
pub(crate) fn status_error(status: reqwest::StatusCode, body: String) -> TranslationError {
    match status.as_u16() {
        401 | 403 => TranslationError::AuthenticationError(body),
        429 => TranslationError::RateLimitExceeded(body),
        code => TranslationError::ApiError {
            status_code: code,
            message: body,
        },
    }
}

/// Map a transport failure to a translation error
pub(crate) fn transport_error(error: reqwest::Error) -> TranslationError {
    if error.is_timeout() || error.is_connect() {
        TranslationError::ConnectionError(error.to_string())
    } else {
        TranslationError::RequestFailed(error.to_string())
    }
}

pub mod amazon_translate;
pub mod aws_auth;
pub mod bedrock;
pub mod mock;
