/*!
 * Tests for the application controller: single file and folder runs,
 * glossary import and input checks
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;

use office_translator::app_config::TERMINOLOGY_NAME;
use office_translator::errors::AppError;
use office_translator::providers::mock::MockBackend;
use office_translator::{Config, Controller};

use crate::common;

fn controller(backend: &MockBackend) -> Controller {
    common::init_logging();
    Controller::with_config(Config::default()).with_backend(Arc::new(backend.clone()))
}

#[tokio::test]
async fn test_run_withSingleWorkbook_shouldWriteOneOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_sample_workbook(temp_dir.path(), "report.xlsx")?;
    let backend = MockBackend::working();

    let summary = controller(&backend).run(&input, None).await?;

    assert!(summary.is_success());
    assert_eq!(summary.outputs, vec![temp_dir.path().join("report-es.xlsx")]);
    assert_eq!(summary.stats.translated, 4);
    assert_eq!(summary.stats.failed, 0);
    assert!(backend.requests().iter().all(|r| r.source_language == "en" && r.target_language == "es"));
    Ok(())
}

#[tokio::test]
async fn test_run_withFolder_shouldTranslateEachDocumentAndContinuePastFailures() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    fs::create_dir(root.join("decks"))?;
    common::create_sample_workbook(root, "report.xlsx")?;
    common::create_sample_presentation(&root.join("decks"), "deck.pptx")?;
    common::create_test_file(root, "broken.xlsx", b"garbage")?;
    common::create_test_file(root, "old-es.xlsx", b"previous output")?;
    common::create_test_file(root, "readme.txt", b"ignored")?;
    let backend = MockBackend::working();

    let summary = controller(&backend).run(root, None).await?;

    assert!(!summary.is_success());
    assert_eq!(summary.failed_documents, vec![root.join("broken.xlsx")]);
    assert_eq!(
        summary.outputs,
        vec![root.join("decks").join("deck-es.pptx"), root.join("report-es.xlsx")]
    );
    assert!(common::read_presentation(&root.join("decks").join("deck-es.pptx")).is_ok());
    assert!(!root.join("broken-es.xlsx").exists());
    assert!(!root.join("old-es-es.xlsx").exists());
    assert_eq!(summary.stats.translated, 11);
    Ok(())
}

#[tokio::test]
async fn test_run_withTerminology_shouldImportGlossaryAndReferenceIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_sample_presentation(temp_dir.path(), "deck.pptx")?;
    let csv = common::create_test_file(temp_dir.path(), "terms.csv", b"en,es\nRevenue,Ingresos\n")?;
    let backend = MockBackend::working();

    controller(&backend).run(&input, Some(csv.as_path())).await?;

    assert_eq!(backend.terminologies(), vec![(TERMINOLOGY_NAME.to_string(), 23)]);
    let requests = backend.requests();
    assert!(!requests.is_empty());
    assert!(requests.iter().all(|r| r.glossary_refs.contains(TERMINOLOGY_NAME)));
    Ok(())
}

#[tokio::test]
async fn test_run_withConfiguredTerminologyName_shouldUseIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_sample_workbook(temp_dir.path(), "report.xlsx")?;
    let csv = common::create_test_file(temp_dir.path(), "terms.csv", b"en,es\n")?;
    let backend = MockBackend::working();
    let mut config = Config::default();
    config.backend.translate.terminology_name = "quarterly-terms".to_string();

    Controller::with_config(config)
        .with_backend(Arc::new(backend.clone()))
        .run(&input, Some(csv.as_path()))
        .await?;

    assert_eq!(backend.terminologies(), vec![("quarterly-terms".to_string(), 6)]);
    Ok(())
}

#[tokio::test]
async fn test_run_withTerminologyOnPromptBackend_shouldFailBeforeTranslating() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_sample_workbook(temp_dir.path(), "report.xlsx")?;
    let csv = common::create_test_file(temp_dir.path(), "terms.csv", b"en,es\n")?;
    let backend = MockBackend::working().without_terminology();

    let result = controller(&backend).run(&input, Some(csv.as_path())).await;

    assert!(matches!(result, Err(AppError::Configuration(_))));
    assert_eq!(backend.call_count(), 0);
    assert!(!temp_dir.path().join("report-es.xlsx").exists());
    Ok(())
}

#[tokio::test]
async fn test_run_withMissingTerminologyFile_shouldBeConfigurationError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_sample_workbook(temp_dir.path(), "report.xlsx")?;
    let backend = MockBackend::working();

    let result = controller(&backend)
        .run(&input, Some(temp_dir.path().join("missing.csv").as_path()))
        .await;

    assert!(matches!(result, Err(AppError::Configuration(_))));
    assert_eq!(backend.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_run_withEmptyFolder_shouldBeConfigurationError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "notes.txt", b"nothing to do")?;
    let backend = MockBackend::working();

    let result = controller(&backend).run(temp_dir.path(), None).await;

    assert!(matches!(result, Err(AppError::Configuration(_))));
    Ok(())
}

#[tokio::test]
async fn test_run_withBadInputPaths_shouldReportUserErrors() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let backend = MockBackend::working();
    let controller = controller(&backend);

    let unsupported = controller.run(&temp_dir.path().join("letter.docx"), None).await;
    assert!(matches!(unsupported, Err(AppError::UnsupportedFormat(_))));

    let missing = controller.run(&temp_dir.path().join("absent.xlsx"), None).await;
    assert!(matches!(missing, Err(AppError::Configuration(_))));

    assert!(unsupported.unwrap_err().is_user_error());
    assert_eq!(backend.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_run_withConfigFileSettings_shouldApplyThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_sample_workbook(temp_dir.path(), "report.xlsx")?;
    let config_path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        br#"{"source_language": "auto", "target_language": "fr", "translation": {"concurrent_requests": 3}}"#,
    )?;
    let config = Config::load(&config_path, true)?;
    config.validate()?;
    let backend = MockBackend::working();

    let summary = Controller::with_config(config)
        .with_backend(Arc::new(backend.clone()))
        .run(&input, None)
        .await?;

    assert_eq!(summary.outputs, vec![temp_dir.path().join("report-fr.xlsx")]);
    assert!(backend.requests().iter().all(|r| r.source_language == "auto" && r.target_language == "fr"));
    Ok(())
}
