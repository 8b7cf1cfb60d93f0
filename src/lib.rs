/*!
 * # SRTranslate - SRT subtitle translation with local language models
 *
 * A Rust library that translates SRT subtitle files entry by entry with a
 * locally running inference engine.
 *
 * ## Features
 *
 * - Lenient SRT parsing with observable recovery of malformed blocks
 * - Translation through Ollama or a llama.cpp server
 * - Order-preserving pipeline with configurable failure policy and retries
 * - Renumbered, atomically written SRT output
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `subtitle_processor`: SRT parsing and serialization
 * - `translation`: the translation port and pipeline:
 *   - `translation::core`: `Translator` trait and the provider-backed service
 *   - `translation::pipeline`: parse, translate, serialize
 *   - `translation::prompts`: prompt template and completion clean-up
 *   - `translation::concurrency`: per-engine request limits
 * - `providers`: HTTP clients for inference engines:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::llamacpp`: llama.cpp server client
 *   - `providers::mock`: scripted engine for tests
 * - `app_config`: Configuration management
 * - `app_controller`: File-level workflow and engine lifetime
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod subtitle_processor;
pub mod translation;
pub mod app_controller;
pub mod providers;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use subtitle_processor::{parse, parse_srt_string, serialize, SubtitleCollection, SubtitleEntry};
pub use translation::pipeline::run;
pub use translation::{Pipeline, PipelineOptions, TranslationService, Translator};
pub use errors::{AppError, PipelineError, ProviderError, SubtitleError, TranslationError};
