/*!
 * Provider-specific concurrency tuning.
 *
 * Local engines differ in how many completions they can serve at once. Ollama
 * queues parallel requests per loaded model, while a llama.cpp server started
 * without extra slots handles one request at a time.
 */

use log::warn;

use crate::app_config::TranslationProvider;

/// Provider-specific concurrency profile with tuned defaults
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderProfile {
    /// Maximum concurrent requests worth sending
    pub max_concurrent_requests: usize,
    /// Whether the engine can unload the model on request
    pub supports_release: bool,
}

impl ProviderProfile {
    /// Get the profile for a given provider
    pub fn for_provider(provider: TranslationProvider) -> Self {
        match provider {
            TranslationProvider::Ollama => Self {
                max_concurrent_requests: 4,
                supports_release: true,
            },
            TranslationProvider::LlamaCpp => Self {
                max_concurrent_requests: 1,
                supports_release: false,
            },
        }
    }

    /// Clamp a requested concurrency to what the engine can serve
    pub fn effective_concurrent_requests(&self, requested: usize) -> usize {
        let requested = requested.max(1);
        if requested > self.max_concurrent_requests {
            warn!(
                "Requested {} concurrent requests, engine serves at most {}",
                requested, self.max_concurrent_requests
            );
            return self.max_concurrent_requests;
        }
        requested
    }
}
