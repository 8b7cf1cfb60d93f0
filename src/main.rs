// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{error, info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use srtranslate::app_config::{self, Config, TranslationProvider};
use srtranslate::app_controller::Controller;
use srtranslate::errors::AppError;
use srtranslate::subtitle_processor::MalformedBlockPolicy;
use srtranslate::translation::FailurePolicy;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    #[value(alias = "llama.cpp")]
    Llamacpp,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::Llamacpp => TranslationProvider::LlamaCpp,
        }
    }
}

/// CLI Wrapper for FailurePolicy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliFailurePolicy {
    Abort,
    KeepOriginal,
}

impl From<CliFailurePolicy> for FailurePolicy {
    fn from(cli_policy: CliFailurePolicy) -> Self {
        match cli_policy {
            CliFailurePolicy::Abort => FailurePolicy::Abort,
            CliFailurePolicy::KeepOriginal => FailurePolicy::KeepOriginal,
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

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// SRTranslate - translate SRT subtitles with a local language model
#[derive(Parser, Debug)]
#[command(name = "srtranslate")]
#[command(version)]
#[command(about = "Translate SRT subtitle files with a local inference engine")]
#[command(long_about = "SRTranslate sends every subtitle of an SRT file to a local language model
(Ollama or a llama.cpp server) and writes a renumbered, translated SRT file.

EXAMPLES:
    srtranslate --source English --target French --input movie.srt
    srtranslate --source en --target de --input in.srt --output out.de.srt --provider llamacpp
    srtranslate --source en --target es --input in.srt --on-error keep-original --retries 2

EXIT CODES:
    0 success, 1 unexpected error, 2 usage error, 3 subtitle parse failure,
    4 translation failure, 5 file error, 6 invalid configuration")]
struct CommandLineOptions {
    /// Source language, passed to the model as given
    #[arg(long)]
    source: String,

    /// Target language, passed to the model as given
    #[arg(long)]
    target: String,

    /// Input SRT file
    #[arg(long, value_name = "FILE")]
    input: PathBuf,

    /// Output SRT file
    #[arg(long, value_name = "FILE", default_value = "out.srt")]
    output: PathBuf,

    /// Model id (Hugging Face repository or engine model tag)
    #[arg(long)]
    model: Option<String>,

    /// GGUF weights file inside the model repository
    #[arg(long = "model-file", alias = "model_file")]
    model_file: Option<String>,

    /// Inference engine
    #[arg(long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Engine URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Timeout for a single translation in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Token budget per translation
    #[arg(long)]
    max_tokens: Option<u32>,

    /// What to do when an entry cannot be translated
    #[arg(long, value_enum)]
    on_error: Option<CliFailurePolicy>,

    /// Extra attempts per entry before the failure policy applies
    #[arg(long)]
    retries: Option<u32>,

    /// Abort on malformed subtitle blocks instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Check timestamp syntax
    #[arg(long)]
    validate_timestamps: bool,

    /// Translation requests in flight at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
// Filtering follows `log::max_level()`, which is raised or lowered once the
// configured level is known.
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
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
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
                "{}{} {:<5} {}\x1B[0m",
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

/// Merge the config file (if any) with command line overrides
fn build_config(options: &CommandLineOptions) -> Result<Config, AppError> {
    let mut config = match &options.config {
        Some(path) => Config::from_file(path).map_err(|e| AppError::Config(format!("{:#}", e)))?,
        None => Config::default(),
    };

    config.source_language = options.source.clone();
    config.target_language = options.target.clone();

    let translation = &mut config.translation;
    if let Some(provider) = &options.provider {
        translation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        translation.model = model.clone();
    }
    if let Some(model_file) = &options.model_file {
        translation.model_file = model_file.clone();
    }
    if let Some(endpoint) = &options.endpoint {
        translation.endpoint = endpoint.clone();
    }
    if let Some(timeout_secs) = options.timeout_secs {
        translation.timeout_secs = timeout_secs;
    }
    if let Some(max_tokens) = options.max_tokens {
        translation.max_tokens = max_tokens;
    }

    let pipeline = &mut config.pipeline;
    if let Some(policy) = &options.on_error {
        pipeline.failure_policy = policy.clone().into();
    }
    if let Some(retries) = options.retries {
        pipeline.entry_retries = retries;
    }
    if options.strict {
        pipeline.malformed_blocks = MalformedBlockPolicy::Abort;
    }
    if options.validate_timestamps {
        pipeline.validate_timestamps = true;
    }
    if let Some(concurrency) = options.concurrency {
        pipeline.concurrent_requests = concurrency;
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    Ok(config)
}

async fn run(options: CommandLineOptions) -> Result<(), AppError> {
    let config = build_config(&options)?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;
    let summary = controller.run(&options.input, &options.output).await?;

    if summary.skipped_blocks > 0 || summary.kept_original > 0 {
        info!(
            "Done: {} block(s) skipped, {} entries left untranslated",
            summary.skipped_blocks, summary.kept_original
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    // clap exits with code 2 on usage errors
    let options = CommandLineOptions::parse();

    if let Err(e) = run(options).await {
        error!("{}", e);
        log::logger().flush();
        std::process::exit(e.exit_code());
    }
}
