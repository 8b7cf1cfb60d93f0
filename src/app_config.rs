use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::errors::AppError;
use crate::providers::ollama::Ollama;
use crate::subtitle_processor::{MalformedBlockPolicy, ParseOptions};
use crate::translation::pipeline::{FailurePolicy, PipelineOptions};
use crate::translation::prompts::PromptTemplate;

/// Application configuration module
/// This module handles the application configuration including loading
/// and validating configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Source language, passed to the prompt as given
    #[serde(default)]
    pub source_language: String,

    /// Target language, passed to the prompt as given
    #[serde(default)]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Pipeline config
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Inference engine type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: llama.cpp server
    #[serde(alias = "llama.cpp", alias = "llama_cpp")]
    LlamaCpp,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::LlamaCpp => "llama.cpp",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::LlamaCpp => "llamacpp".to_string(),
        }
    }

    // @returns: Endpoint the engine listens on out of the box
    pub fn default_endpoint(&self) -> String {
        match self {
            Self::Ollama => default_ollama_endpoint(),
            Self::LlamaCpp => default_llamacpp_endpoint(),
        }
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "llamacpp" | "llama.cpp" | "llama_cpp" => Ok(Self::LlamaCpp),
            _ => Err(anyhow::anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    /// Inference engine to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Model id (Hugging Face repository or engine model tag)
    #[serde(default = "default_model")]
    pub model: String,

    /// GGUF weights file inside the model repository
    #[serde(default = "default_model_file")]
    pub model_file: String,

    /// Engine URL, empty for the provider default
    #[serde(default)]
    pub endpoint: String,

    /// Upper bound for one translation call in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Token budget per translation
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// HTTP-level retries for server errors and dropped connections
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for HTTP retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Prompt template
    /// Placeholders: {source_language}, {target_language}, {text}
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            model: default_model(),
            model_file: default_model_file(),
            endpoint: String::new(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            prompt_template: default_prompt_template(),
        }
    }
}

impl TranslationConfig {
    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if !self.endpoint.trim().is_empty() {
            return self.endpoint.trim().to_string();
        }
        self.provider.default_endpoint()
    }

    /// Model identifier sent to the engine
    pub fn resolved_model(&self) -> String {
        match self.provider {
            TranslationProvider::Ollama => Ollama::resolve_model(&self.model, Some(&self.model_file)),
            TranslationProvider::LlamaCpp => self.model.trim().to_string(),
        }
    }

    /// Per-call timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Prompt template in use
    pub fn prompt(&self) -> PromptTemplate {
        PromptTemplate::new(&self.prompt_template)
    }
}

/// Pipeline configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PipelineConfig {
    /// What happens when an entry cannot be translated
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Extra attempts per entry
    #[serde(default)]
    pub entry_retries: u32,

    /// What happens with blocks whose timing line is unusable
    #[serde(default)]
    pub malformed_blocks: MalformedBlockPolicy,

    /// Check timestamp syntax
    #[serde(default)]
    pub validate_timestamps: bool,

    /// Maximum number of translation calls in flight
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            entry_retries: 0,
            malformed_blocks: MalformedBlockPolicy::default(),
            validate_timestamps: false,
            concurrent_requests: default_concurrent_requests(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_model() -> String {
    "TheBloke/OpenHermes-2.5-Mistral-7B-GGUF".to_string()
}

fn default_model_file() -> String {
    "openhermes-2.5-mistral-7b.Q2_K.gguf".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_llamacpp_endpoint() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_tokens() -> u32 {
    32
}

fn default_temperature() -> f32 {
    0.3
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_prompt_template() -> String {
    PromptTemplate::SUBTITLE_TRANSLATOR.to_string()
}

fn default_concurrent_requests() -> usize {
    1
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<(), AppError> {
        if self.source_language.trim().is_empty() {
            return Err(AppError::Config("Source language is required".to_string()));
        }
        if self.target_language.trim().is_empty() {
            return Err(AppError::Config("Target language is required".to_string()));
        }

        let translation = &self.translation;
        if translation.model.trim().is_empty() && translation.provider == TranslationProvider::Ollama {
            return Err(AppError::Config("A model is required for Ollama".to_string()));
        }

        if !translation.endpoint.trim().is_empty() {
            let url = Url::parse(translation.endpoint.trim())
                .map_err(|e| AppError::Config(format!("Invalid endpoint {}: {}", translation.endpoint, e)))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(AppError::Config(format!(
                    "Endpoint must be an http(s) URL: {}",
                    translation.endpoint
                )));
            }
        }

        if translation.timeout_secs == 0 {
            return Err(AppError::Config("timeout_secs must be greater than 0".to_string()));
        }
        if translation.max_tokens == 0 {
            return Err(AppError::Config("max_tokens must be greater than 0".to_string()));
        }
        if !translation.prompt().has_text_placeholder() {
            return Err(AppError::Config("prompt_template must contain {text}".to_string()));
        }
        if self.pipeline.concurrent_requests == 0 {
            return Err(AppError::Config("concurrent_requests must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Pipeline options derived from this configuration
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            parse: ParseOptions {
                malformed_blocks: self.pipeline.malformed_blocks,
                validate_timestamps: self.pipeline.validate_timestamps,
            },
            failure_policy: self.pipeline.failure_policy,
            entry_retries: self.pipeline.entry_retries,
            concurrent_requests: self.pipeline.concurrent_requests,
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: String::new(),
            target_language: String::new(),
            translation: TranslationConfig::default(),
            pipeline: PipelineConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
