/*!
 * Provider implementations for local inference engines.
 *
 * This module contains client implementations for the engines a translation
 * can run on:
 * - Ollama: local model server
 * - llama.cpp: the `llama-server` HTTP completion endpoint
 * - Mock: scripted engine for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Sampling parameters shared by every provider
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Maximum number of tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Generation stops at the first of these sequences
    pub stop: Vec<String>,
}

/// Common trait for all inference providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably behind the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Build a raw completion request for a rendered prompt
    fn build_request(&self, prompt: &str, params: &GenerationParams) -> Self::Request;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the engine is up and can serve the model
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Ask the engine to free the model; engines that cannot do this ignore it
    async fn release(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Turn an endpoint base URL and an API path into a request URL
pub(crate) fn endpoint_url(base: &url::Url, path: &str) -> Result<url::Url, ProviderError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path)
        .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint URL {}: {}", base, e)))
}

/// Shorten a response body for log and error messages
pub(crate) fn preview(text: &str) -> String {
    if text.chars().count() > 500 {
        text.chars().take(500).collect()
    } else {
        text.to_string()
    }
}

/// Map a reqwest failure to the matching provider error
pub(crate) fn classify_request_error(engine: &str, error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(format!("{} did not answer in time: {}", engine, error))
    } else if error.is_connect() {
        ProviderError::ConnectionError(format!("Failed to connect to {}: {}", engine, error))
    } else {
        ProviderError::RequestFailed(format!("Failed to send request to {}: {}", engine, error))
    }
}

pub mod llamacpp;
pub mod mock;
pub mod ollama;
