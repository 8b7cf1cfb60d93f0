use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::{classify_request_error, endpoint_url, preview, GenerationParams, Provider};

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: Url,
    /// Model tag used for every request
    model: String,
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    /// Send the prompt as-is, without the model's chat template
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<bool>,
    /// How long to keep the model loaded in memory
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<serde_json::Value>,
}

/// Generation options for the Ollama API
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    /// Stop sequences
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    #[serde(default)]
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Why generation ended ("stop", "length", "unload")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
    /// Number of prompt tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

/// Builder methods for GenerationRequest
impl GenerationRequest {
    /// Create a new raw, non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            options: None,
            stream: Some(false),
            raw: Some(true),
            keep_alive: None,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    /// Limit the number of generated tokens
    pub fn num_predict(mut self, num_predict: u32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).num_predict = Some(num_predict);
        self
    }

    /// Set the stop sequences
    pub fn stop(mut self, stop: Vec<String>) -> Self {
        if !stop.is_empty() {
            self.options.get_or_insert_with(GenerationOptions::default).stop = Some(stop);
        }
        self
    }

    /// Ask Ollama to unload the model once this request is served
    pub fn unload(mut self) -> Self {
        self.keep_alive = Some(serde_json::Value::from(0));
        self
    }
}

/// Parse a generate response body
///
/// A single JSON object is expected; if the server streamed anyway the
/// `response` pieces of every JSON line are concatenated.
pub fn parse_generation_body(body: &str) -> Result<GenerationResponse, ProviderError> {
    match serde_json::from_str::<GenerationResponse>(body) {
        Ok(response) => Ok(response),
        Err(e) => {
            let mut parsed_any = false;
            let mut merged = GenerationResponse {
                model: String::new(),
                response: String::new(),
                done: false,
                done_reason: None,
                prompt_eval_count: None,
                eval_count: None,
            };

            for line in body.lines().filter(|line| !line.trim().is_empty()) {
                let Ok(chunk) = serde_json::from_str::<GenerationResponse>(line) else {
                    continue;
                };
                parsed_any = true;
                merged.response.push_str(&chunk.response);
                if chunk.done {
                    merged.model = chunk.model;
                    merged.done = true;
                    merged.done_reason = chunk.done_reason;
                    merged.prompt_eval_count = chunk.prompt_eval_count;
                    merged.eval_count = chunk.eval_count;
                }
            }

            if parsed_any {
                Ok(merged)
            } else {
                error!("Failed to parse Ollama API response: {}. Raw response (first 500 chars): {}", e, preview(body));
                Err(ProviderError::ParseError(format!("Invalid Ollama response: {}", e)))
            }
        }
    }
}

/// Ollama client implementation
impl Ollama {
    /// Create a new Ollama client with default retry settings
    pub fn new(endpoint: &str, model: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new_with_config(endpoint, model, Duration::from_secs(120), 3, 1000)
    }

    /// Create a new Ollama client with configuration
    ///
    /// Ollama speaks HTTP/1.1 and runs on the local machine, so the client
    /// keeps a small pool of idle connections.
    pub fn new_with_config(
        endpoint: &str,
        model: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ProviderError> {
        let base_url = Url::parse(endpoint)
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid Ollama endpoint {}: {}", endpoint, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .http1_only()
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
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

    /// Resolve the Ollama model tag for a model id and optional weights file
    ///
    /// A Hugging Face repository id (`owner/repo`) combined with a GGUF file
    /// name such as `model.Q2_K.gguf` becomes `hf.co/owner/repo:Q2_K`, which
    /// Ollama pulls straight from the hub. Anything else is used as given.
    pub fn resolve_model(model: &str, model_file: Option<&str>) -> String {
        let model = model.trim();
        let Some(file) = model_file.map(str::trim).filter(|f| !f.is_empty()) else {
            return model.to_string();
        };

        let is_hub_repo = model.matches('/').count() == 1 && !model.contains(':') && !model.starts_with("hf.co/");
        if !is_hub_repo {
            return model.to_string();
        }

        let stem = file.strip_suffix(".gguf").unwrap_or(file);
        let quant = stem.rsplit('.').next().unwrap_or(stem);
        format!("hf.co/{}:{}", model, quant)
    }

    /// Generate text from the Ollama API with retry logic
    ///
    /// Server errors and dropped connections are retried with exponential
    /// backoff; client errors and timeouts are returned immediately.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = endpoint_url(&self.base_url, "api/generate")?;

        let mut attempt = 0;
        loop {
            let error = match self.client.post(url.clone()).json(request).send().await {
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await
                        .map_err(|e| ProviderError::ParseError(format!("Failed to read Ollama response: {}", e)))?;

                    if status.is_success() {
                        return parse_generation_body(&body);
                    }

                    let message = api_error_message(&body);
                    if status == StatusCode::NOT_FOUND {
                        return Err(ProviderError::ModelNotFound(format!("{} ({})", request.model, message)));
                    }
                    if !status.is_server_error() {
                        error!("Ollama API error ({}): {}", status, message);
                        return Err(ProviderError::ApiError { status_code: status.as_u16(), message });
                    }
                    ProviderError::ApiError { status_code: status.as_u16(), message }
                }
                Err(e) => {
                    let error = classify_request_error("Ollama", e);
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

            error!("Ollama request failed: {} - attempt {}/{}", error, attempt, self.max_retries + 1);
            let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1).min(16));
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }
    }

    /// Get the Ollama API version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = endpoint_url(&self.base_url, "api/version")?;
        let response: serde_json::Value = self.client.get(url)
            .send()
            .await
            .map_err(|e| classify_request_error("Ollama", e))?
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Ollama version response: {}", e)))?;

        response["version"].as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::ParseError("Invalid version format in response".to_string()))
    }

    /// Check that the configured model is available locally
    pub async fn show_model(&self) -> Result<(), ProviderError> {
        let url = endpoint_url(&self.base_url, "api/show")?;
        let response = self.client.post(url)
            .json(&serde_json::json!({ "model": self.model }))
            .send()
            .await
            .map_err(|e| classify_request_error("Ollama", e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = api_error_message(&response.text().await.unwrap_or_default());
        if status == StatusCode::NOT_FOUND {
            Err(ProviderError::ModelNotFound(format!("{} ({})", self.model, message)))
        } else {
            Err(ProviderError::ApiError { status_code: status.as_u16(), message })
        }
    }
}

/// Pull the `error` field out of an Ollama error body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| preview(body))
}

#[async_trait]
impl Provider for Ollama {
    type Request = GenerationRequest;
    type Response = GenerationResponse;

    fn build_request(&self, prompt: &str, params: &GenerationParams) -> Self::Request {
        GenerationRequest::new(self.model.clone(), prompt)
            .temperature(params.temperature)
            .num_predict(params.max_tokens)
            .stop(params.stop.clone())
    }

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let response = self.generate(&request).await?;
        debug!(
            "Ollama generated {} tokens ({:?})",
            response.eval_count.unwrap_or_default(),
            response.done_reason
        );
        Ok(response)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let version = self.version().await?;
        debug!("Connected to Ollama {} at {}", version, self.base_url);
        self.show_model().await
    }

    async fn release(&self) -> Result<(), ProviderError> {
        let request = GenerationRequest::new(self.model.clone(), "").unload();
        self.generate(&request).await.map(|_| ())
    }

    fn extract_text(response: &Self::Response) -> String {
        response.response.clone()
    }
}
