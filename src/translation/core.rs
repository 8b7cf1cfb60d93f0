/*!
 * Core translation functionality.
 *
 * `Translator` is the port the pipeline depends on. `TranslationService`
 * implements it on top of any inference `Provider`: it renders the prompt,
 * enforces the per-call timeout and reduces the completion to one
 * translation.
 */

use async_trait::async_trait;
use log::{debug, warn};
use std::time::Duration;

use crate::errors::{ProviderError, TranslationError};
use crate::providers::{GenerationParams, Provider};
use crate::translation::prompts::{clean_completion, PromptTemplate};

/// Capability to translate one piece of subtitle text
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_language` to `target_language`
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError>;
}

/// Adapts a plain closure into a `Translator`
pub struct FnTranslator<F> {
    func: F,
}

impl<F> FnTranslator<F>
where
    F: Fn(&str, &str, &str) -> Result<String, TranslationError> + Send + Sync,
{
    /// Wrap a `(text, source, target) -> translation` closure
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> Translator for FnTranslator<F>
where
    F: Fn(&str, &str, &str) -> Result<String, TranslationError> + Send + Sync,
{
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        (self.func)(text, source_language, target_language)
    }
}

/// Settings for a `TranslationService`
#[derive(Debug, Clone)]
pub struct TranslationOptions {
    /// Prompt sent for every entry
    pub template: PromptTemplate,
    /// Token budget per translation
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Upper bound for a single engine call
    pub timeout: Duration,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            template: PromptTemplate::default(),
            max_tokens: 32,
            temperature: 0.3,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Translation adapter over an inference provider
#[derive(Debug)]
pub struct TranslationService<P: Provider> {
    provider: P,
    options: TranslationOptions,
    params: GenerationParams,
}

impl<P: Provider> TranslationService<P> {
    /// Create a service around an already constructed provider
    pub fn new(provider: P, options: TranslationOptions) -> Self {
        let params = GenerationParams {
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            stop: options.template.stop_sequences(),
        };
        Self {
            provider,
            options,
            params,
        }
    }

    /// The underlying provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Check that the engine is reachable and can serve the model
    pub async fn ensure_ready(&self) -> Result<(), TranslationError> {
        match tokio::time::timeout(self.options.timeout, self.provider.test_connection()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TranslationError::InferenceUnavailable(e.to_string())),
            Err(_) => Err(TranslationError::InferenceUnavailable(format!(
                "no answer from the engine within {:?}",
                self.options.timeout
            ))),
        }
    }

    /// Let the engine free the model; failures are only logged
    pub async fn release(&self) {
        match tokio::time::timeout(self.options.timeout, self.provider.release()).await {
            Ok(Ok(())) => debug!("Inference engine released"),
            Ok(Err(e)) => warn!("Failed to release inference engine: {}", e),
            Err(_) => warn!("Timed out releasing inference engine"),
        }
    }
}

/// Map provider failures onto the translation error taxonomy
fn map_provider_error(error: ProviderError, timeout: Duration) -> TranslationError {
    match error {
        ProviderError::ConnectionError(message) | ProviderError::ModelNotFound(message) => {
            TranslationError::InferenceUnavailable(message)
        }
        ProviderError::ApiError { status_code: 503, message } => TranslationError::InferenceUnavailable(message),
        ProviderError::Timeout(_) => TranslationError::InferenceTimeout(timeout),
        other => TranslationError::Provider(other),
    }
}

#[async_trait]
impl<P: Provider> Translator for TranslationService<P> {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        let prompt = self.options.template.render(text, source_language, target_language);
        let request = self.provider.build_request(&prompt, &self.params);

        let response = tokio::time::timeout(self.options.timeout, self.provider.complete(request))
            .await
            .map_err(|_| TranslationError::InferenceTimeout(self.options.timeout))?
            .map_err(|e| map_provider_error(e, self.options.timeout))?;

        let raw = P::extract_text(&response);
        let translation = clean_completion(&raw);
        if translation.is_empty() {
            debug!("Empty completion for {:?} (raw: {:?})", text, raw);
            return Err(TranslationError::EmptyOutput);
        }

        Ok(translation)
    }
}
