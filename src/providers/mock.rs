/*!
 * Mock backend implementations for testing.
 *
 * This module provides a mock backend that simulates different behaviors:
 * - `MockBackend::working()` - Always succeeds with a tagged translation
 * - `MockBackend::intermittent(n)` - Fails every n-th request
 * - `MockBackend::failing()` - Always fails with an error
 *
 * Every request is recorded so tests can assert on call counts, order and
 * glossary references.
 */

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::TranslationBackend;
use crate::errors::TranslationError;

/// A request seen by the mock backend
#[derive(Debug, Clone, PartialEq)]
pub struct MockRequest {
    /// The text to translate
    pub text: String,
    /// Source language
    pub source_language: String,
    /// Target language
    pub target_language: String,
    /// Glossary references passed with the call
    pub glossary_refs: BTreeSet<String>,
}

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with `[{target}] {text}`
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Answers with nothing, which is a malformed response
    Empty,
    /// Succeeds after a delay that shrinks with every request, so later
    /// requests complete before earlier ones
    Staggered { max_delay_ms: u64 },
}

/// Mock backend for testing translation behavior
#[derive(Debug)]
pub struct MockBackend {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter for intermittent failures
    request_count: Arc<AtomicUsize>,
    /// Every translate call in arrival order
    requests: Arc<Mutex<Vec<MockRequest>>>,
    /// Imported terminology names and sizes
    terminologies: Arc<Mutex<Vec<(String, usize)>>>,
    /// Whether terminology import is offered
    terminology_support: bool,
    /// Custom response generator (optional)
    custom_response: Option<fn(&MockRequest) -> String>,
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            terminologies: Arc::new(Mutex::new(Vec::new())),
            terminology_support: true,
            custom_response: None,
        }
    }

    /// Create a working mock backend that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock backend
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent {
            fail_every: fail_every.max(1),
        })
    }

    /// Create a failing mock backend that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock backend that returns empty answers
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock backend whose earlier requests finish last
    pub fn staggered(max_delay_ms: u64) -> Self {
        Self::new(MockBehavior::Staggered { max_delay_ms })
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&MockRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Disable terminology import, like a prompt-based backend
    pub fn without_terminology(mut self) -> Self {
        self.terminology_support = false;
        self
    }

    /// The translation the working behavior produces for `text`
    pub fn expected_translation(text: &str, target_language: &str) -> String {
        format!("[{}] {}", target_language, text)
    }

    /// Recorded translate requests in arrival order
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    /// Number of translate calls received
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Imported terminologies as `(name, csv length)`
    pub fn terminologies(&self) -> Vec<(String, usize)> {
        self.terminologies.lock().clone()
    }

    fn respond(&self, request: &MockRequest) -> String {
        match self.custom_response {
            Some(generator) => generator(request),
            None => Self::expected_translation(&request.text, &request.target_language),
        }
    }
}

impl Clone for MockBackend {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            requests: Arc::clone(&self.requests),
            terminologies: Arc::clone(&self.terminologies),
            terminology_support: self.terminology_support,
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        glossary_refs: &BTreeSet<String>,
    ) -> Result<String, TranslationError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        let request = MockRequest {
            text: text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            glossary_refs: glossary_refs.clone(),
        };
        self.requests.lock().push(request.clone());

        match self.behavior {
            MockBehavior::Working => Ok(self.respond(&request)),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(TranslationError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(self.respond(&request))
                }
            }

            MockBehavior::Failing => Err(TranslationError::ApiError {
                message: "Simulated backend failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Err(TranslationError::ParseError("model returned no text".to_string())),

            MockBehavior::Staggered { max_delay_ms } => {
                let delay = max_delay_ms / (count as u64 + 1);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(self.respond(&request))
            }
        }
    }

    async fn import_terminology(&self, name: &str, csv: &[u8]) -> Result<(), TranslationError> {
        if !self.terminology_support {
            return Err(TranslationError::Unsupported(format!(
                "Mock cannot import terminology '{}'",
                name
            )));
        }
        self.terminologies.lock().push((name.to_string(), csv.len()));
        Ok(())
    }

    fn supports_terminology(&self) -> bool {
        self.terminology_support
    }
}
