// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::{generate, Shell};
use log::{LevelFilter, Level, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use office_translator::app_config::{BackendKind, Config, LogLevel};
use office_translator::app_controller::{Controller, RunSummary};
use office_translator::errors::AppError;

/// Default configuration file, optional when not given explicitly
const DEFAULT_CONFIG_PATH: &str = "conf.json";

/// CLI Wrapper for BackendKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliBackend {
    Translate,
    Bedrock,
}

impl From<CliBackend> for BackendKind {
    fn from(cli_backend: CliBackend) -> Self {
        match cli_backend {
            CliBackend::Translate => BackendKind::Translate,
            CliBackend::Bedrock => BackendKind::Bedrock,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// Office Translator - structure-preserving translation of Excel and PowerPoint files
///
/// Translates every text cell of a workbook, or every text box, group and
/// table of a presentation, through Amazon Translate or Amazon Bedrock and
/// writes `{name}-{target}.{ext}` next to the input.
#[derive(Parser, Debug)]
#[command(name = "office-translator")]
#[command(version)]
#[command(about = "Translate .xlsx and .pptx files while keeping their layout")]
#[command(long_about = "Translates the text of Excel workbooks and PowerPoint presentations while
keeping cell formatting, column widths, slide layout, groups and tables intact.

EXAMPLES:
    office-translator en es report.xlsx                         # English to Spanish
    office-translator auto fr deck.pptx --region eu-west-1      # Detect the source language
    office-translator en de report.xlsx --terminology terms.csv # Apply a glossary
    office-translator en ja ./docs --backend bedrock            # Translate a whole folder
    office-translator --completions bash > office-translator.bash

CREDENTIALS:
    AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY and optionally AWS_SESSION_TOKEN
    are read from the environment. The region comes from --region, AWS_REGION
    or backend.region in the configuration file, in that order.")]
struct CommandLineOptions {
    /// Source language code (e.g., 'en', 'fr', or 'auto')
    #[arg(value_name = "SOURCE_LANGUAGE_CODE", required_unless_present = "completions")]
    source_language: Option<String>,

    /// Target language code (e.g., 'es', 'de', 'zh-TW')
    #[arg(value_name = "TARGET_LANGUAGE_CODE", required_unless_present = "completions")]
    target_language: Option<String>,

    /// Input .xlsx/.pptx file or directory to process
    #[arg(value_name = "INPUT_PATH", required_unless_present = "completions")]
    input_path: Option<PathBuf>,

    /// Glossary CSV to import before translating (Amazon Translate only)
    #[arg(long, value_name = "CSV")]
    terminology: Option<PathBuf>,

    /// AWS region
    #[arg(long)]
    region: Option<String>,

    /// Translation backend to use
    #[arg(short, long, value_enum)]
    backend: Option<CliBackend>,

    /// Bedrock model id
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Maximum concurrent requests within one sheet or slide
    #[arg(long)]
    concurrency: Option<usize>,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

// @struct: Custom logger implementation
// Filtering goes through log::max_level so the level can change after the config is loaded
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Load the config file and apply command line overrides
fn load_config(options: &CommandLineOptions) -> Result<Config> {
    let explicit = options.config.is_some();
    let config_path = options
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = Config::load(&config_path, explicit)?;

    if let Some(source_language) = &options.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &options.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(backend) = &options.backend {
        config.backend.kind = backend.clone().into();
    }
    if let Some(model) = &options.model {
        config.backend.bedrock.model_id = model.clone();
    }
    if let Some(concurrency) = options.concurrency {
        config.translation.concurrent_requests = concurrency;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run_translate(options: CommandLineOptions) -> Result<RunSummary> {
    let config = load_config(&options).map_err(|e| AppError::Configuration(format!("{:#}", e)))?;
    log::set_max_level(config.log_level.to_level_filter());

    let input_path = options
        .input_path
        .clone()
        .ok_or_else(|| AppError::Configuration("INPUT_PATH is required".to_string()))?;

    let controller = Controller::with_config(config).with_region(options.region.clone());
    let summary = controller.run(&input_path, options.terminology.as_deref()).await?;
    Ok(summary)
}

/// Exit code and message for a failed run
fn report_error(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<AppError>() {
        Some(app_error) if !app_error.is_user_error() => {
            eprintln!("An unexpected error occurred: {}", app_error);
            ExitCode::from(2)
        }
        Some(app_error) => {
            eprintln!("Error: {}", app_error);
            ExitCode::from(1)
        }
        None => {
            eprintln!("An unexpected error occurred: {:#}", error);
            ExitCode::from(2)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let options = CommandLineOptions::parse();

    if let Some(shell) = options.completions {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "office-translator", &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    let initial_level = options
        .log_level
        .clone()
        .map(|level| LogLevel::from(level).to_level_filter())
        .unwrap_or(LevelFilter::Info);
    if let Err(e) = CustomLogger::init(initial_level) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    match run_translate(options).await {
        Ok(summary) => {
            for output in &summary.outputs {
                println!("Translation completed. Output saved to {}", output.display());
            }
            if summary.is_success() {
                ExitCode::SUCCESS
            } else {
                eprintln!(
                    "An unexpected error occurred: {} document(s) could not be translated",
                    summary.failed_documents.len()
                );
                ExitCode::from(2)
            }
        }
        Err(e) => report_error(&e),
    }
}
