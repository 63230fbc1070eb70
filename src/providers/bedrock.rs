/*!
 * Amazon Bedrock backend.
 *
 * Sends an instruction prompt to an Anthropic model through the Bedrock
 * runtime `InvokeModel` operation and returns the model's answer.
 */

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::aws_auth::{post_signed, uri_encode, AwsCredentials, SigV4Signer};
use super::TranslationBackend;
use crate::errors::TranslationError;

const SERVICE: &str = "bedrock";
const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Model used when none is configured
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-sonnet-20240229-v1:0";

/// Instruction prompt; `{source}`, `{target}` and `{text}` are substituted
pub const DEFAULT_PROMPT_TEMPLATE: &str = "Translate the following text from {source} to {target}. \n\
Provide only the translated text without any explanations or additional text.\n\n\
Text to translate: {text}";

/// Generation settings for Bedrock requests
#[derive(Debug, Clone, PartialEq)]
pub struct BedrockOptions {
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub prompt_template: String,
}

impl Default for BedrockOptions {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            max_tokens: 1000,
            temperature: 0.0,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

/// Anthropic messages body for `InvokeModel`
#[derive(Debug, Serialize)]
pub struct InvokeRequest {
    anthropic_version: &'static str,
    max_tokens: u32,
    messages: Vec<InvokeMessage>,
    temperature: f32,
}

/// A single conversation message
#[derive(Debug, Serialize, Deserialize)]
pub struct InvokeMessage {
    pub role: String,
    pub content: String,
}

/// Anthropic messages response
#[derive(Debug, Deserialize)]
pub struct InvokeResponse {
    pub content: Vec<InvokeContent>,
}

/// Content block of a response
#[derive(Debug, Deserialize)]
pub struct InvokeContent {
    #[serde(rename = "type", default)]
    pub content_type: String,
    #[serde(default)]
    pub text: String,
}

impl InvokeRequest {
    pub fn new(prompt: String, options: &BedrockOptions) -> Self {
        Self {
            anthropic_version: ANTHROPIC_VERSION,
            max_tokens: options.max_tokens,
            messages: vec![InvokeMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: options.temperature,
        }
    }
}

/// Fill the prompt template for one request
pub fn build_prompt(template: &str, text: &str, source_language: &str, target_language: &str) -> String {
    template
        .replace("{source}", source_language)
        .replace("{target}", target_language)
        .replace("{text}", text)
}

/// Amazon Bedrock runtime client
#[derive(Debug)]
pub struct Bedrock {
    client: Client,
    signer: SigV4Signer,
    invoke_url: Url,
    options: BedrockOptions,
}

impl Bedrock {
    /// Create a client for `region`
    pub fn new(
        credentials: AwsCredentials,
        region: &str,
        options: BedrockOptions,
        timeout_secs: u64,
    ) -> Result<Self, TranslationError> {
        let invoke_url = Url::parse(&format!(
            "https://bedrock-runtime.{}.amazonaws.com/model/{}/invoke",
            region,
            uri_encode(&options.model_id, true)
        ))
        .map_err(|e| TranslationError::RequestFailed(format!("Invalid Bedrock endpoint: {}", e)))?;

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            signer: SigV4Signer::new(credentials, region, SERVICE),
            invoke_url,
            options,
        })
    }

    pub fn invoke_url(&self) -> &Url {
        &self.invoke_url
    }

    pub fn model_id(&self) -> &str {
        &self.options.model_id
    }

    /// Extract the answer text from a response
    pub fn extract_text(response: &InvokeResponse) -> Result<String, TranslationError> {
        let text = response
            .content
            .first()
            .map(|c| c.text.trim())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(TranslationError::ParseError("model returned no text".to_string()));
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl TranslationBackend for Bedrock {
    fn name(&self) -> &str {
        "Amazon Bedrock"
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        _glossary_refs: &BTreeSet<String>,
    ) -> Result<String, TranslationError> {
        let prompt = build_prompt(&self.options.prompt_template, text, source_language, target_language);
        let body = serde_json::to_vec(&InvokeRequest::new(prompt, &self.options))
            .map_err(|e| TranslationError::RequestFailed(format!("Failed to encode request: {}", e)))?;

        let headers = [("content-type", "application/json"), ("accept", "application/json")];
        let response = post_signed(&self.client, &self.signer, &self.invoke_url, &headers, body).await?;

        let response: InvokeResponse = serde_json::from_str(&response)
            .map_err(|e| TranslationError::ParseError(format!("Invalid InvokeModel response: {}", e)))?;
        Self::extract_text(&response)
    }
}
