/*!
 * Subtitle translation on top of local inference engines.
 *
 * This module is split into several submodules:
 *
 * - `core`: the `Translator` port and the provider-backed `TranslationService`
 * - `prompts`: prompt template and completion clean-up
 * - `pipeline`: parse, translate every entry, serialize
 * - `concurrency`: per-engine limits on parallel requests
 */

// Re-export main types for easier usage
pub use self::core::{FnTranslator, TranslationOptions, TranslationService, Translator};
pub use self::pipeline::{
    FailurePolicy, Pipeline, PipelineOptions, PipelineOutput, PipelineReport, PipelineStage,
};
pub use self::prompts::PromptTemplate;

// Submodules
pub mod concurrency;
pub mod core;
pub mod pipeline;
pub mod prompts;
