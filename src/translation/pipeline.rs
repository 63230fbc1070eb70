/*!
 * Document translation pipeline.
 *
 * The pipeline picks the walker for the input's document type, derives the
 * output path and runs read → walk → write:
 *
 * `Idle → Reading → Walking → Writing → Done`, with `Failed` reachable from
 * `Reading` and `Writing`. Walking cannot fail; per-leaf translation failures
 * are absorbed by the translation port.
 */

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error};
use parking_lot::Mutex;

use super::core::Translator;
use super::walker::{DocumentWalker, PresentationWalker, ProgressCallback, SpreadsheetWalker};
use crate::codec::{DocumentCodec, OoxmlCodec};
use crate::document::{Document, DocumentKind};
use crate::errors::AppError;
use crate::providers::TranslationBackend;

/// Lifecycle of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Reading,
    Walking,
    Writing,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Reading => "reading",
            Self::Walking => "walking",
            Self::Writing => "writing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Output path for `input` translated into `target_language`
///
/// `-{target_language}` is inserted immediately before the extension, in
/// the same directory: `report.xlsx` becomes `report-es.xlsx`.
pub fn output_path(input: &Path, target_language: &str) -> Result<PathBuf, AppError> {
    let unsupported = || AppError::UnsupportedFormat(input.display().to_string());

    let stem = input.file_stem().and_then(|s| s.to_str()).ok_or_else(unsupported)?;
    let extension = input.extension().and_then(|e| e.to_str()).ok_or_else(unsupported)?;

    Ok(input.with_file_name(format!("{}-{}.{}", stem, target_language, extension)))
}

/// Document type of `input`, or `UnsupportedFormat`
pub fn detect_kind(input: &Path) -> Result<DocumentKind, AppError> {
    DocumentKind::from_path(input).ok_or_else(|| {
        let shown = match input.extension().and_then(|e| e.to_str()) {
            Some(extension) => format!(".{}", extension.to_ascii_lowercase()),
            None => input.display().to_string(),
        };
        AppError::UnsupportedFormat(shown)
    })
}

/// Translates office documents end to end
pub struct DocumentPipeline {
    translator: Translator,
    codec: Arc<dyn DocumentCodec>,
    progress: Option<ProgressCallback>,
    state: Mutex<PipelineState>,
}

impl DocumentPipeline {
    /// Pipeline over the OOXML codec
    pub fn new(translator: Translator) -> Self {
        Self {
            translator,
            codec: Arc::new(OoxmlCodec::new()),
            progress: None,
            state: Mutex::new(PipelineState::Idle),
        }
    }

    /// Replace the document codec
    pub fn with_codec(mut self, codec: Arc<dyn DocumentCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Report `(completed, total)` sheets or slides while walking
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock()
    }

    fn transition(&self, next: PipelineState) {
        let mut state = self.state.lock();
        debug!("Pipeline state: {} -> {}", *state, next);
        *state = next;
    }

    /// Build the translated copy of a document
    pub async fn walk(&self, document: &Document) -> Document {
        match document {
            Document::Workbook(workbook) => {
                let mut walker = SpreadsheetWalker::new(self.translator.clone());
                if let Some(progress) = &self.progress {
                    walker = walker.with_progress(Arc::clone(progress));
                }
                Document::Workbook(walker.walk(workbook).await)
            }
            Document::Presentation(presentation) => {
                let mut walker = PresentationWalker::new(self.translator.clone());
                if let Some(progress) = &self.progress {
                    walker = walker.with_progress(Arc::clone(progress));
                }
                Document::Presentation(walker.walk(presentation).await)
            }
        }
    }

    /// Translate the document at `input` and return the output path
    pub async fn translate_document(&self, input: &Path) -> Result<PathBuf, AppError> {
        let kind = detect_kind(input)?;
        let output = output_path(input, self.translator.target_language())?;
        debug!("Translating {} file {:?} to {:?}", kind, input, output);

        self.transition(PipelineState::Reading);
        let source = match self.codec.open(input) {
            Ok(document) => document,
            Err(e) => {
                error!("Failed to read {:?}: {}", input, e);
                self.transition(PipelineState::Failed);
                return Err(e.into());
            }
        };

        self.transition(PipelineState::Walking);
        let translated = self.walk(&source).await;
        drop(source);

        self.transition(PipelineState::Writing);
        if let Err(e) = self.codec.save(&translated, &output) {
            error!("Failed to write {:?}: {}", output, e);
            self.transition(PipelineState::Failed);
            return Err(e.into());
        }

        self.transition(PipelineState::Done);
        Ok(output)
    }

    /// One-shot translation of `input` from `source_language` to `target_language`
    pub async fn translate_document_between(
        backend: Arc<dyn TranslationBackend>,
        input: &Path,
        source_language: &str,
        target_language: &str,
    ) -> Result<PathBuf, AppError> {
        let translator = Translator::new(backend, source_language, target_language);
        Self::new(translator).translate_document(input).await
    }
}
