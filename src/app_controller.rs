use log::{debug, info, warn};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::{Config, TranslationProvider};
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::providers::llamacpp::LlamaCpp;
use crate::providers::ollama::Ollama;
use crate::providers::Provider;
use crate::translation::concurrency::ProviderProfile;
use crate::translation::core::{TranslationOptions, TranslationService, Translator};
use crate::translation::pipeline::{Pipeline, PipelineOptions};

// @module: Application controller for subtitle translation

/// Outcome of one translated file
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Where the translation was written
    pub output_path: PathBuf,
    /// Entries in the output document
    pub entries: usize,
    /// Blocks dropped by the parser
    pub skipped_blocks: usize,
    /// Entries left in the source language
    pub kept_original: usize,
    /// Retried translation calls
    pub retries: u32,
    /// Wall time of the run
    pub elapsed: Duration,
}

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate `input_file` into `output_file` with the configured engine.
    ///
    /// The engine is probed before any work is done. Engines that can unload
    /// their model are released afterwards, whether the run succeeded or not.
    pub async fn run(&self, input_file: &Path, output_file: &Path) -> Result<RunSummary, AppError> {
        let translation = &self.config.translation;
        let endpoint = translation.get_endpoint();
        let model = translation.resolved_model();
        let options = TranslationOptions {
            template: translation.prompt(),
            max_tokens: translation.max_tokens,
            temperature: translation.temperature,
            timeout: translation.timeout(),
        };

        info!("{} at {} - model {}", translation.provider.display_name(), endpoint, model);

        match translation.provider {
            TranslationProvider::Ollama => {
                let provider = Ollama::new_with_config(
                    &endpoint,
                    model,
                    translation.timeout(),
                    translation.retry_count,
                    translation.retry_backoff_ms,
                )
                .map_err(|e| AppError::Config(e.to_string()))?;
                self.run_with_service(TranslationService::new(provider, options), input_file, output_file).await
            }
            TranslationProvider::LlamaCpp => {
                let provider = LlamaCpp::new_with_config(
                    &endpoint,
                    model,
                    translation.timeout(),
                    translation.retry_count,
                    translation.retry_backoff_ms,
                )
                .map_err(|e| AppError::Config(e.to_string()))?;
                self.run_with_service(TranslationService::new(provider, options), input_file, output_file).await
            }
        }
    }

    /// Probe, run and release one engine
    async fn run_with_service<P: Provider>(
        &self,
        service: TranslationService<P>,
        input_file: &Path,
        output_file: &Path,
    ) -> Result<RunSummary, AppError> {
        // Fail on a missing input before touching the engine
        if !FileManager::file_exists(input_file) {
            return Err(AppError::File(format!("Input file does not exist: {}", input_file.display())));
        }

        service.ensure_ready().await?;

        let profile = ProviderProfile::for_provider(self.config.translation.provider);
        let mut options = self.config.pipeline_options();
        options.concurrent_requests = profile.effective_concurrent_requests(options.concurrent_requests);

        let result = self.translate_file(&service, options, input_file, output_file).await;
        if profile.supports_release {
            service.release().await;
        }
        result
    }

    /// Translate a file with any translator, using the configured pipeline options
    pub async fn run_with_translator<T: Translator + ?Sized>(
        &self,
        translator: &T,
        input_file: &Path,
        output_file: &Path,
    ) -> Result<RunSummary, AppError> {
        self.translate_file(translator, self.config.pipeline_options(), input_file, output_file).await
    }

    async fn translate_file<T: Translator + ?Sized>(
        &self,
        translator: &T,
        options: PipelineOptions,
        input_file: &Path,
        output_file: &Path,
    ) -> Result<RunSummary, AppError> {
        let start_time = Instant::now();

        let content = FileManager::read_to_string(input_file)?;
        debug!("Read {} bytes from {}", content.len(), input_file.display());

        let progress_bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} entries ({percent}%) {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("=> "));

        let pipeline = Pipeline::new(translator, options);
        let pb = progress_bar.clone();
        let output = pipeline
            .run(&content, &self.config.source_language, &self.config.target_language, move |completed, total| {
                pb.set_length(total as u64);
                pb.set_position(completed as u64);
            })
            .await;

        progress_bar.finish_and_clear();
        let output = output?;

        FileManager::write_atomic(output_file, &output.text)?;

        let report = &output.report;
        if !report.skipped.is_empty() {
            warn!("Dropped {} malformed block(s)", report.skipped.len());
        }
        if !report.kept_original.is_empty() {
            warn!("{} entries were left untranslated", report.kept_original.len());
        }

        let summary = RunSummary {
            output_path: output_file.to_path_buf(),
            entries: output.entries.len(),
            skipped_blocks: report.skipped.len(),
            kept_original: report.kept_original.len(),
            retries: report.retries,
            elapsed: start_time.elapsed(),
        };

        info!(
            "Translated {} entries in {}: {}",
            summary.entries,
            Self::format_duration(summary.elapsed),
            summary.output_path.display()
        );

        Ok(summary)
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: Duration) -> String {
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
