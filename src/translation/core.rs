/*!
 * Translation port.
 *
 * `Translator` turns one piece of text into a `TranslationResult` through the
 * configured backend. It never returns an error: a failed call is logged and
 * the original text is handed back as the fallback value.
 */

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::providers::TranslationBackend;

/// Upper bound for the backoff exponent
const MAX_BACKOFF_SHIFT: u32 = 10;

/// Delay before retry number `attempt` (1-based), doubling each time
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
    base_ms.saturating_mul(1u64 << shift)
}

/// One unit of text to translate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    /// Text to translate, non-empty once trimmed
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    /// Terminology resources to apply, possibly empty
    pub glossary_refs: BTreeSet<String>,
}

impl TranslationRequest {
    /// Build a request, or `None` when `text` is blank
    pub fn new(
        text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        glossary_refs: BTreeSet<String>,
    ) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        Some(Self {
            text,
            source_language: source_language.into(),
            target_language: target_language.into(),
            glossary_refs,
        })
    }
}

/// Outcome of a translation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationResult {
    /// The backend's translation
    Translated(String),
    /// The backend failed; carries the original text
    Failed(String),
}

impl TranslationResult {
    pub fn text(&self) -> &str {
        match self {
            Self::Translated(text) | Self::Failed(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Translated(text) | Self::Failed(text) => text,
        }
    }

    pub fn is_translated(&self) -> bool {
        matches!(self, Self::Translated(_))
    }
}

/// Options for translation calls
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOptions {
    /// Maximum number of concurrent requests within one sheet or slide
    pub concurrent_requests: usize,
    /// Extra attempts for retryable failures
    pub retry_count: u32,
    /// Delay before the first retry; doubles on each further retry
    pub retry_backoff_ms: u64,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            concurrent_requests: 1,
            retry_count: 0,
            retry_backoff_ms: 1000,
        }
    }
}

/// Counts of translated and failed leaves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationStats {
    pub translated: usize,
    pub failed: usize,
}

impl TranslationStats {
    pub fn total(&self) -> usize {
        self.translated + self.failed
    }
}

impl fmt::Display for TranslationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} translated, {} kept original", self.translated, self.failed)
    }
}

#[derive(Debug, Default)]
struct Counters {
    translated: AtomicUsize,
    failed: AtomicUsize,
}

/// The translation port used by the document walkers
#[derive(Debug, Clone)]
pub struct Translator {
    backend: Arc<dyn TranslationBackend>,
    source_language: String,
    target_language: String,
    glossary_refs: BTreeSet<String>,
    options: TranslationOptions,
    counters: Arc<Counters>,
}

impl Translator {
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            source_language: source_language.into(),
            target_language: target_language.into(),
            glossary_refs: BTreeSet::new(),
            options: TranslationOptions::default(),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Pass these glossary references with every request
    pub fn with_glossary_refs(mut self, glossary_refs: BTreeSet<String>) -> Self {
        self.glossary_refs = glossary_refs;
        self
    }

    pub fn with_options(mut self, options: TranslationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    pub fn options(&self) -> &TranslationOptions {
        &self.options
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// A request for `text` in this translator's language pair
    pub fn request(&self, text: &str) -> Option<TranslationRequest> {
        TranslationRequest::new(
            text,
            self.source_language.as_str(),
            self.target_language.as_str(),
            self.glossary_refs.clone(),
        )
    }

    /// Translate one request, falling back to the original text on failure
    pub async fn translate(&self, request: &TranslationRequest) -> TranslationResult {
        let mut attempt: u32 = 0;

        loop {
            let result = self
                .backend
                .translate(
                    &request.text,
                    &request.source_language,
                    &request.target_language,
                    &request.glossary_refs,
                )
                .await;

            match result {
                Ok(text) => {
                    self.counters.translated.fetch_add(1, Ordering::Relaxed);
                    return TranslationResult::Translated(text);
                }
                Err(e) if e.is_retryable() && attempt < self.options.retry_count => {
                    attempt += 1;
                    let delay_ms = backoff_ms(self.options.retry_backoff_ms, attempt);
                    debug!(
                        "{} error: {} - retrying in {}ms (attempt {}/{})",
                        self.backend.name(),
                        e,
                        delay_ms,
                        attempt + 1,
                        self.options.retry_count + 1
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => {
                    warn!("Translation error: {} - keeping original text", e);
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                    return TranslationResult::Failed(request.text.clone());
                }
            }
        }
    }

    /// Counts of translated and failed requests so far
    pub fn stats(&self) -> TranslationStats {
        TranslationStats {
            translated: self.counters.translated.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}
