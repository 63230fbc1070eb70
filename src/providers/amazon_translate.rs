/*!
 * Amazon Translate backend.
 *
 * Uses the AWS JSON 1.1 protocol: every operation is a signed POST to the
 * regional endpoint root with the operation named in `X-Amz-Target`.
 */

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::aws_auth::{post_signed, AwsCredentials, SigV4Signer};
use super::TranslationBackend;
use crate::errors::TranslationError;

const SERVICE: &str = "translate";
const TARGET_PREFIX: &str = "AWSShineFrontendService_20170701";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// TranslateText request
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TranslateTextRequest<'a> {
    pub text: &'a str,
    pub source_language_code: &'a str,
    pub target_language_code: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub terminology_names: Vec<&'a str>,
}

/// TranslateText response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TranslateTextResponse {
    pub translated_text: String,
    #[serde(default)]
    pub source_language_code: Option<String>,
}

/// Terminology payload of an ImportTerminology request
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TerminologyData {
    /// Base64 of the CSV file
    pub file: String,
    pub format: &'static str,
}

/// ImportTerminology request
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImportTerminologyRequest<'a> {
    pub name: &'a str,
    pub merge_strategy: &'static str,
    pub terminology_data: TerminologyData,
}

/// Error body returned by the JSON protocol
#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(rename = "__type", default)]
    error_type: String,
    #[serde(alias = "Message", default)]
    message: String,
}

/// Amazon Translate client
#[derive(Debug)]
pub struct AmazonTranslate {
    client: Client,
    signer: SigV4Signer,
    endpoint: Url,
}

impl AmazonTranslate {
    /// Create a client for `region`
    pub fn new(credentials: AwsCredentials, region: &str, timeout_secs: u64) -> Result<Self, TranslationError> {
        let endpoint = Url::parse(&format!("https://{}.{}.amazonaws.com/", SERVICE, region))
            .map_err(|e| TranslationError::RequestFailed(format!("Invalid region '{}': {}", region, e)))?;

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            signer: SigV4Signer::new(credentials, region, SERVICE),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn call<T: Serialize>(&self, operation: &str, payload: &T) -> Result<String, TranslationError> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| TranslationError::RequestFailed(format!("Failed to encode request: {}", e)))?;
        let target = format!("{}.{}", TARGET_PREFIX, operation);
        let headers = [("content-type", CONTENT_TYPE), ("x-amz-target", target.as_str())];

        post_signed(&self.client, &self.signer, &self.endpoint, &headers, body)
            .await
            .map_err(classify_service_error)
    }
}

/// Refine a generic API error using the `__type` of the JSON error body
fn classify_service_error(error: TranslationError) -> TranslationError {
    let (status_code, message) = match error {
        TranslationError::ApiError { status_code, message } => (status_code, message),
        other => return other,
    };
    let Ok(body) = serde_json::from_str::<ServiceError>(&message) else {
        return TranslationError::ApiError { status_code, message };
    };

    let kind = body.error_type.rsplit('#').next().unwrap_or_default();
    let detail = if body.message.is_empty() {
        kind.to_string()
    } else {
        format!("{}: {}", kind, body.message)
    };

    match kind {
        "ThrottlingException" | "TooManyRequestsException" | "LimitExceededException" => {
            TranslationError::RateLimitExceeded(detail)
        }
        "UnrecognizedClientException" | "AccessDeniedException" | "InvalidSignatureException"
        | "ExpiredTokenException" => TranslationError::AuthenticationError(detail),
        _ => TranslationError::ApiError {
            status_code,
            message: detail,
        },
    }
}

#[async_trait]
impl TranslationBackend for AmazonTranslate {
    fn name(&self) -> &str {
        "Amazon Translate"
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        glossary_refs: &BTreeSet<String>,
    ) -> Result<String, TranslationError> {
        let request = TranslateTextRequest {
            text,
            source_language_code: source_language,
            target_language_code: target_language,
            terminology_names: glossary_refs.iter().map(String::as_str).collect(),
        };

        let body = self.call("TranslateText", &request).await?;
        let response: TranslateTextResponse = serde_json::from_str(&body)
            .map_err(|e| TranslationError::ParseError(format!("Invalid TranslateText response: {}", e)))?;

        let translated = response.translated_text.trim();
        if translated.is_empty() {
            return Err(TranslationError::ParseError("TranslateText returned no text".to_string()));
        }
        Ok(translated.to_string())
    }

    async fn import_terminology(&self, name: &str, csv: &[u8]) -> Result<(), TranslationError> {
        let request = ImportTerminologyRequest {
            name,
            merge_strategy: "OVERWRITE",
            terminology_data: TerminologyData {
                file: base64::engine::general_purpose::STANDARD.encode(csv),
                format: "CSV",
            },
        };

        self.call("ImportTerminology", &request).await?;
        debug!("Imported terminology '{}' ({} bytes)", name, csv.len());
        Ok(())
    }

    fn supports_terminology(&self) -> bool {
        true
    }
}
