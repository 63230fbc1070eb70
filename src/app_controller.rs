use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{BackendKind, Config};
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::providers::amazon_translate::AmazonTranslate;
use crate::providers::aws_auth::AwsCredentials;
use crate::providers::bedrock::{Bedrock, BedrockOptions};
use crate::providers::TranslationBackend;
use crate::translation::pipeline::detect_kind;
use crate::translation::{DocumentPipeline, ProgressCallback, TranslationStats, Translator};

// @module: Application controller for document translation

/// Environment variable holding the default AWS region
pub const REGION_ENV: &str = "AWS_REGION";

/// Pick the AWS region: command line, then environment, then config file
///
/// Blank values are ignored.
pub fn resolve_region(
    cli_region: Option<&str>,
    env_region: Option<&str>,
    config_region: Option<&str>,
) -> Result<String, AppError> {
    [cli_region, env_region, config_region]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|region| !region.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::Configuration(format!(
                "AWS region is required: pass --region, set {} or backend.region in the config file",
                REGION_ENV
            ))
        })
}

/// Outcome of one controller run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    // @field: Written output files, in input order
    pub outputs: Vec<PathBuf>,
    // @field: Documents that could not be translated (folder mode)
    pub failed_documents: Vec<PathBuf>,
    // @field: Leaf counts over the whole run
    pub stats: TranslationStats,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed_documents.is_empty()
    }
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Region given on the command line
    region_override: Option<String>,
    // @field: Backend used instead of the configured AWS service
    backend: Option<Arc<dyn TranslationBackend>>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            region_override: None,
            backend: None,
        }
    }

    /// Region taking precedence over `AWS_REGION` and the config file
    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region_override = region;
        self
    }

    /// Translate through `backend` instead of building one from the config
    pub fn with_backend(mut self, backend: Arc<dyn TranslationBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the configured translation backend
    ///
    /// Region and credentials are resolved here, so a missing value is
    /// reported before any document is touched.
    pub fn create_backend(&self) -> Result<Arc<dyn TranslationBackend>, AppError> {
        if let Some(backend) = &self.backend {
            return Ok(Arc::clone(backend));
        }

        let env_region = std::env::var(REGION_ENV).ok();
        let region = resolve_region(
            self.region_override.as_deref(),
            env_region.as_deref(),
            self.config.backend.region.as_deref(),
        )?;
        let credentials = AwsCredentials::from_env()?;
        let timeout_secs = self.config.translation.timeout_secs;

        let backend: Arc<dyn TranslationBackend> = match self.config.backend.kind {
            BackendKind::Translate => Arc::new(AmazonTranslate::new(credentials, &region, timeout_secs)?),
            BackendKind::Bedrock => {
                let bedrock = &self.config.backend.bedrock;
                let options = BedrockOptions {
                    model_id: bedrock.model_id.clone(),
                    max_tokens: bedrock.max_tokens,
                    temperature: bedrock.temperature,
                    prompt_template: bedrock.prompt_template.clone(),
                };
                Arc::new(Bedrock::new(credentials, &region, options, timeout_secs)?)
            }
        };
        info!("Using {} in {}", self.config.backend.kind.display_name(), region);
        Ok(backend)
    }

    /// Build the translator for this run, importing the glossary first if one is given
    pub async fn prepare_translator(
        &self,
        backend: Arc<dyn TranslationBackend>,
        terminology: Option<&Path>,
    ) -> Result<Translator, AppError> {
        let mut glossary_refs = BTreeSet::new();

        if let Some(csv_path) = terminology {
            if !backend.supports_terminology() {
                return Err(AppError::Configuration(format!(
                    "--terminology is only supported by the {} backend, not {}",
                    BackendKind::Translate.display_name(),
                    backend.name()
                )));
            }
            let csv = FileManager::read_bytes(csv_path).map_err(|e| AppError::Configuration(format!("{:#}", e)))?;
            let name = &self.config.backend.translate.terminology_name;

            info!("Importing terminology {:?} as '{}'", csv_path, name);
            backend.import_terminology(name, &csv).await?;
            glossary_refs.insert(name.clone());
        }

        Ok(Translator::new(backend, &self.config.source_language, &self.config.target_language)
            .with_glossary_refs(glossary_refs)
            .with_options(self.config.translation.options()))
    }

    /// Translate a single document or every document in a directory
    pub async fn run(&self, input: &Path, terminology: Option<&Path>) -> Result<RunSummary, AppError> {
        let start_time = Instant::now();

        let documents = self.collect_documents(input)?;
        let backend = self.create_backend()?;
        let translator = self.prepare_translator(backend, terminology).await?;

        info!(
            "Translating {} document(s) from {} to {} with {}",
            documents.len(),
            translator.source_language(),
            translator.target_language(),
            translator.backend_name()
        );

        let summary = if FileManager::dir_exists(input) {
            self.run_folder(&translator, &documents).await
        } else {
            let output = self.translate_one(&translator, input, &MultiProgress::new()).await?;
            RunSummary {
                outputs: vec![output],
                failed_documents: Vec::new(),
                stats: translator.stats(),
            }
        };

        info!(
            "Translation finished in {}: {}",
            Self::format_duration(start_time.elapsed()),
            summary.stats
        );
        Ok(summary)
    }

    /// Documents named by `input`, checked before any backend call
    fn collect_documents(&self, input: &Path) -> Result<Vec<PathBuf>, AppError> {
        if FileManager::dir_exists(input) {
            let documents = FileManager::find_documents(input, &self.config.target_language)
                .map_err(|e| AppError::Configuration(format!("{:#}", e)))?;
            if documents.is_empty() {
                return Err(AppError::Configuration(format!(
                    "No .xlsx or .pptx files found in directory: {:?}",
                    input
                )));
            }
            return Ok(documents);
        }

        detect_kind(input)?;
        if !FileManager::file_exists(input) {
            return Err(AppError::Configuration(format!("Input file does not exist: {:?}", input)));
        }
        Ok(vec![input.to_path_buf()])
    }

    /// Translate every document, continuing past failed ones
    async fn run_folder(&self, translator: &Translator, documents: &[PathBuf]) -> RunSummary {
        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(documents.len() as u64));
        folder_pb.set_style(Self::bar_style("files"));

        let mut summary = RunSummary::default();
        for document in documents {
            let file_name = document
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            match self.translate_one(translator, document, &multi_progress).await {
                Ok(output) => summary.outputs.push(output),
                Err(e) => {
                    error!("Failed to translate {:?}: {}", document, e);
                    summary.failed_documents.push(document.clone());
                }
            }
            folder_pb.inc(1);
        }
        folder_pb.finish_and_clear();

        if !summary.failed_documents.is_empty() {
            warn!(
                "{} of {} documents could not be translated",
                summary.failed_documents.len(),
                documents.len()
            );
        }
        summary.stats = translator.stats();
        summary
    }

    /// Run the pipeline on one document with a progress bar over its sheets or slides
    async fn translate_one(
        &self,
        translator: &Translator,
        input: &Path,
        multi_progress: &MultiProgress,
    ) -> Result<PathBuf, AppError> {
        let progress_bar = multi_progress.add(ProgressBar::new(0));
        progress_bar.set_style(Self::bar_style("parts"));
        progress_bar.set_message("Translating");

        let pb = progress_bar.clone();
        let progress: ProgressCallback = Arc::new(move |completed: usize, total: usize| {
            pb.set_length(total as u64);
            pb.set_position(completed as u64);
        });

        let pipeline = DocumentPipeline::new(translator.clone()).with_progress(progress);
        let result = pipeline.translate_document(input).await;
        progress_bar.finish_and_clear();

        let output = result?;
        info!("Success: {}", output.display());
        Ok(output)
    }

    fn bar_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
                unit
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
