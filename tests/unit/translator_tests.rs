/*!
 * Tests for the translation port and its fallback policy
 */

use std::collections::BTreeSet;
use std::sync::Arc;

use office_translator::providers::mock::MockBackend;
use office_translator::translation::{TranslationOptions, TranslationRequest, TranslationResult, Translator};

fn translator_with(backend: &MockBackend, retry_count: u32) -> Translator {
    Translator::new(Arc::new(backend.clone()), "en", "es").with_options(TranslationOptions {
        concurrent_requests: 1,
        retry_count,
        retry_backoff_ms: 1,
    })
}

#[test]
fn test_translation_request_withBlankText_shouldNotBeCreated() {
    assert!(TranslationRequest::new("", "en", "es", BTreeSet::new()).is_none());
    assert!(TranslationRequest::new(" \t\n", "en", "es", BTreeSet::new()).is_none());
    assert!(TranslationRequest::new(" x ", "en", "es", BTreeSet::new()).is_some());
}

#[test]
fn test_translation_result_withEachVariant_shouldExposeText() {
    let translated = TranslationResult::Translated("Hola".to_string());
    let failed = TranslationResult::Failed("Hello".to_string());

    assert!(translated.is_translated());
    assert!(!failed.is_translated());
    assert_eq!(failed.text(), "Hello");
    assert_eq!(translated.into_text(), "Hola");
}

#[tokio::test]
async fn test_translate_withWorkingBackend_shouldReturnTranslation() {
    let backend = MockBackend::working();
    let translator = translator_with(&backend, 0);

    let request = translator.request("Good morning").unwrap();
    let result = translator.translate(&request).await;

    assert_eq!(result, TranslationResult::Translated("[es] Good morning".to_string()));
    assert_eq!(translator.stats().translated, 1);
    assert_eq!(translator.stats().failed, 0);
}

#[tokio::test]
async fn test_translate_withFailingBackend_shouldFallBackToOriginal() {
    let backend = MockBackend::failing();
    let translator = translator_with(&backend, 0);

    let request = translator.request("Keep me").unwrap();
    let result = translator.translate(&request).await;

    assert_eq!(result, TranslationResult::Failed("Keep me".to_string()));
    assert_eq!(translator.stats().failed, 1);
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_translate_withRetryableFailureAndRetries_shouldRecover() {
    // Every second call fails with a 503
    let backend = MockBackend::intermittent(2);
    let translator = translator_with(&backend, 2);

    let first = translator.translate(&translator.request("one").unwrap()).await;
    let second = translator.translate(&translator.request("two").unwrap()).await;

    assert!(first.is_translated());
    assert_eq!(second, TranslationResult::Translated("[es] two".to_string()));
    assert_eq!(backend.call_count(), 3);
    assert_eq!(translator.stats().translated, 2);
}

#[tokio::test]
async fn test_translate_withRetryableFailureAndNoRetries_shouldFallBack() {
    let backend = MockBackend::intermittent(1);
    let translator = translator_with(&backend, 0);

    let result = translator.translate(&translator.request("once").unwrap()).await;

    assert_eq!(result, TranslationResult::Failed("once".to_string()));
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_translate_withMalformedResponse_shouldNotRetry() {
    let backend = MockBackend::empty();
    let translator = translator_with(&backend, 3);

    let result = translator.translate(&translator.request("text").unwrap()).await;

    assert!(!result.is_translated());
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn test_translate_withGlossaryRefs_shouldPassThemToBackend() {
    let backend = MockBackend::working();
    let refs: BTreeSet<String> = ["excel-translator-terminology".to_string()].into_iter().collect();
    let translator = Translator::new(Arc::new(backend.clone()), "auto", "de").with_glossary_refs(refs.clone());

    translator.translate(&translator.request("Revenue").unwrap()).await;

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].source_language, "auto");
    assert_eq!(requests[0].target_language, "de");
    assert_eq!(requests[0].glossary_refs, refs);
}

#[tokio::test]
async fn test_stats_withClonedTranslator_shouldShareCounters() {
    let backend = MockBackend::working();
    let translator = translator_with(&backend, 0);
    let cloned = translator.clone();

    cloned.translate(&cloned.request("a").unwrap()).await;
    translator.translate(&translator.request("b").unwrap()).await;

    assert_eq!(translator.stats().total(), 2);
    assert_eq!(translator.stats().to_string(), "2 translated, 0 kept original");
}
