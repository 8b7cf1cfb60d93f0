/*!
 * Client for the llama.cpp `llama-server` completion API.
 *
 * The server loads exactly one GGUF model at start-up, so the model id sent
 * along with requests is informational only.
 */

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::{classify_request_error, endpoint_url, preview, GenerationParams, Provider};

/// llama.cpp server client
#[derive(Debug)]
pub struct LlamaCpp {
    /// Base URL of the server
    base_url: Url,
    /// Model id reported in requests
    model: String,
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

/// Request body for `POST /completion`
#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Raw prompt
    pub prompt: String,
    /// Maximum number of tokens to predict
    pub n_predict: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Stop sequences
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub stop: Vec<String>,
    /// Always false, the adapter wants a single JSON body
    pub stream: bool,
    /// Reuse the KV cache for the shared prompt prefix
    pub cache_prompt: bool,
    /// Model id, ignored by single-model servers
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub model: Option<String>,
}

/// Response body of `POST /completion`
#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated text
    #[serde(default)]
    pub content: String,
    /// Generation ended on EOS
    #[serde(default)]
    pub stopped_eos: bool,
    /// Generation ended on a stop sequence
    #[serde(default)]
    pub stopped_word: bool,
    /// Generation ended on `n_predict`
    #[serde(default)]
    pub stopped_limit: bool,
    /// Number of generated tokens
    #[serde(default)]
    pub tokens_predicted: u64,
    /// Model path reported by the server
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerErrorBody {
    error: ServerError,
}

#[derive(Debug, Deserialize)]
struct ServerError {
    #[serde(default)]
    message: String,
}

impl LlamaCpp {
    /// Create a client for a llama.cpp server
    pub fn new_with_config(
        endpoint: &str,
        model: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ProviderError> {
        let base_url = Url::parse(endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid llama.cpp endpoint {}: {}", endpoint, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .http1_only()
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            model: model.into(),
            client,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Run a completion with retries on server errors and dropped connections
    pub async fn completion(&self, request: &CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let url = endpoint_url(&self.base_url, "completion")?;

        let mut attempt = 0;
        loop {
            let error = match self.client.post(url.clone()).json(request).send().await {
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await
                        .map_err(|e| ProviderError::ParseError(format!("Failed to read llama.cpp response: {}", e)))?;

                    if status.is_success() {
                        return serde_json::from_str::<CompletionResponse>(&body).map_err(|e| {
                            error!("Failed to parse llama.cpp response: {}. Raw response (first 500 chars): {}", e, preview(&body));
                            ProviderError::ParseError(format!("Invalid llama.cpp response: {}", e))
                        });
                    }

                    let error = status_error(status, &body);
                    if !status.is_server_error() {
                        return Err(error);
                    }
                    error
                }
                Err(e) => {
                    let error = classify_request_error("llama.cpp server", e);
                    if matches!(error, ProviderError::Timeout(_)) {
                        return Err(error);
                    }
                    error
                }
            };

            attempt += 1;
            if attempt > self.max_retries {
                return Err(error);
            }

            error!("llama.cpp request failed: {} - attempt {}/{}", error, attempt, self.max_retries + 1);
            let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1).min(16));
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }
    }

    /// Query `GET /health`; the server answers 503 while the model loads
    pub async fn health(&self) -> Result<(), ProviderError> {
        let url = endpoint_url(&self.base_url, "health")?;
        let response = self.client.get(url)
            .send()
            .await
            .map_err(|e| classify_request_error("llama.cpp server", e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }
}

/// Map an unsuccessful status to a provider error
fn status_error(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ServerErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| preview(body));

    match status {
        StatusCode::SERVICE_UNAVAILABLE => ProviderError::ConnectionError(format!("llama.cpp server not ready: {}", message)),
        StatusCode::NOT_FOUND => ProviderError::ModelNotFound(message),
        _ => ProviderError::ApiError { status_code: status.as_u16(), message },
    }
}

#[async_trait]
impl Provider for LlamaCpp {
    type Request = CompletionRequest;
    type Response = CompletionResponse;

    fn build_request(&self, prompt: &str, params: &GenerationParams) -> Self::Request {
        CompletionRequest {
            prompt: prompt.to_string(),
            n_predict: params.max_tokens,
            temperature: params.temperature,
            stop: params.stop.clone(),
            stream: false,
            cache_prompt: true,
            model: Some(self.model.clone()).filter(|m| !m.is_empty()),
        }
    }

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let response = self.completion(&request).await?;
        debug!(
            "llama.cpp generated {} tokens (eos: {}, stop word: {}, limit: {})",
            response.tokens_predicted, response.stopped_eos, response.stopped_word, response.stopped_limit
        );
        Ok(response)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.health().await
    }

    fn extract_text(response: &Self::Response) -> String {
        response.content.clone()
    }
}
