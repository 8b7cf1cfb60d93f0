/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock engine that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds with a completion
 * - `MockProvider::failing()` - Always fails with an API error
 * - `MockProvider::unavailable()` - Behaves like an engine that is not running
 * - `MockProvider::empty()` - Stops before generating anything
 * - `MockProvider::slow(ms)` - Answers after a delay
 * - `MockProvider::fail_on(n)` - Returns an empty completion for the n-th request only
 *
 * Like a real engine, the mock cuts its completion at the first stop sequence.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{GenerationParams, Provider};

/// Mock request for testing
#[derive(Debug, Clone)]
pub struct MockRequest {
    /// The rendered prompt
    pub prompt: String,
    /// Token budget
    pub max_tokens: u32,
    /// Stop sequences
    pub stop: Vec<String>,
}

/// Mock response for testing
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// The generated text
    pub text: String,
}

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Always fails with an API error
    Failing,
    /// Connection refused
    Unavailable,
    /// Returns an empty completion
    Empty,
    /// Returns an empty completion for the given 1-based request number
    FailOn { request: usize },
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter
    request_count: Arc<AtomicUsize>,
    /// Every request received, in order
    requests: Arc<Mutex<Vec<MockRequest>>>,
    /// Custom completion generator (optional)
    custom_response: Option<fn(&MockRequest) -> String>,
    /// Whether `release` has been called
    released: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that refuses connections
    pub fn unavailable() -> Self {
        Self::new(MockBehavior::Unavailable)
    }

    /// Create a mock that returns empty completions
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock whose n-th request (1-based) comes back empty
    pub fn fail_on(request: usize) -> Self {
        Self::new(MockBehavior::FailOn { request })
    }

    /// Create a mock that sleeps before answering
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Set a custom completion generator
    pub fn with_custom_response(mut self, generator: fn(&MockRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of completion requests served so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copy of every request received
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    /// Number of times the model was released
    pub fn release_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn generate(&self, request: &MockRequest) -> String {
        match self.custom_response {
            Some(generator) => generator(request),
            None => " [TRANSLATED]".to_string(),
        }
    }

    /// Cut a completion at the first stop sequence, as engines do
    fn apply_stop(text: String, stop: &[String]) -> String {
        let cut = stop
            .iter()
            .filter(|s| !s.is_empty())
            .filter_map(|s| text.find(s.as_str()))
            .min();
        match cut {
            Some(pos) => text[..pos].to_string(),
            None => text,
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            requests: Arc::clone(&self.requests),
            custom_response: self.custom_response,
            released: Arc::clone(&self.released),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = MockRequest;
    type Response = MockResponse;

    fn build_request(&self, prompt: &str, params: &GenerationParams) -> Self::Request {
        MockRequest {
            prompt: prompt.to_string(),
            max_tokens: params.max_tokens,
            stop: params.stop.clone(),
        }
    }

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().push(request.clone());

        let text = match self.behavior {
            MockBehavior::Working => self.generate(&request),
            MockBehavior::Failing => {
                return Err(ProviderError::ApiError {
                    message: "Simulated provider failure".to_string(),
                    status_code: 500,
                })
            }
            MockBehavior::Unavailable => {
                return Err(ProviderError::ConnectionError("Simulated connection refused".to_string()))
            }
            MockBehavior::Empty => String::new(),
            MockBehavior::FailOn { request: failing } if failing == count => String::new(),
            MockBehavior::FailOn { .. } => self.generate(&request),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                self.generate(&request)
            }
        };

        Ok(MockResponse {
            text: Self::apply_stop(text, &request.stop),
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Unavailable => Err(ProviderError::ConnectionError("Simulated connection refused".to_string())),
            _ => Ok(()),
        }
    }

    async fn release(&self) -> Result<(), ProviderError> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn extract_text(response: &Self::Response) -> String {
        response.text.clone()
    }
}
