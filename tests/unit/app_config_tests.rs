/*!
 * Tests for app configuration functionality
 */

use anyhow::Result;
use srtranslate::app_config::{Config, LogLevel, TranslationProvider};
use srtranslate::errors::AppError;
use srtranslate::subtitle_processor::MalformedBlockPolicy;
use srtranslate::translation::FailurePolicy;
use crate::common;

fn valid_config() -> Config {
    Config {
        source_language: "English".to_string(),
        target_language: "French".to_string(),
        ..Config::default()
    }
}

#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.translation.model, "TheBloke/OpenHermes-2.5-Mistral-7B-GGUF");
    assert_eq!(config.translation.model_file, "openhermes-2.5-mistral-7b.Q2_K.gguf");
    assert_eq!(config.translation.timeout_secs, 120);
    assert_eq!(config.translation.max_tokens, 32);
    assert_eq!(config.pipeline.failure_policy, FailurePolicy::Abort);
    assert_eq!(config.pipeline.malformed_blocks, MalformedBlockPolicy::Skip);
    assert_eq!(config.pipeline.entry_retries, 0);
    assert_eq!(config.log_level, LogLevel::Info);
}

#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    assert!(valid_config().validate().is_ok());

    let mut no_source = valid_config();
    no_source.source_language.clear();
    assert!(matches!(no_source.validate(), Err(AppError::Config(_))));

    let mut zero_timeout = valid_config();
    zero_timeout.translation.timeout_secs = 0;
    assert!(matches!(zero_timeout.validate(), Err(AppError::Config(_))));

    let mut zero_tokens = valid_config();
    zero_tokens.translation.max_tokens = 0;
    assert!(matches!(zero_tokens.validate(), Err(AppError::Config(_))));

    let mut bad_endpoint = valid_config();
    bad_endpoint.translation.endpoint = "localhost 11434".to_string();
    assert!(matches!(bad_endpoint.validate(), Err(AppError::Config(_))));

    let mut no_concurrency = valid_config();
    no_concurrency.pipeline.concurrent_requests = 0;
    assert!(matches!(no_concurrency.validate(), Err(AppError::Config(_))));
}

#[test]
fn test_fromFile_withJsonConfig_shouldLoadAndFillDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        r#"{
            "source_language": "en",
            "target_language": "ja",
            "translation": { "provider": "llamacpp", "endpoint": "http://127.0.0.1:9000", "max_tokens": 64 },
            "pipeline": { "failure_policy": "keep-original", "entry_retries": 2, "malformed_blocks": "abort" },
            "log_level": "debug"
        }"#,
    )?;

    let config = Config::from_file(&path)?;

    assert_eq!(config.target_language, "ja");
    assert_eq!(config.translation.provider, TranslationProvider::LlamaCpp);
    assert_eq!(config.translation.get_endpoint(), "http://127.0.0.1:9000");
    assert_eq!(config.translation.max_tokens, 64);
    assert_eq!(config.translation.timeout_secs, 120);
    assert_eq!(config.pipeline.failure_policy, FailurePolicy::KeepOriginal);
    assert_eq!(config.pipeline.malformed_blocks, MalformedBlockPolicy::Abort);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_fromFile_withInvalidJson_shouldFailWithPath() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "broken.json", "{ not json")?;

    let error = Config::from_file(&path).unwrap_err();
    assert!(format!("{:#}", error).contains("broken.json"));
    Ok(())
}

#[test]
fn test_pipelineOptions_shouldMirrorConfig() {
    let mut config = valid_config();
    config.pipeline.entry_retries = 3;
    config.pipeline.validate_timestamps = true;
    config.pipeline.concurrent_requests = 2;

    let options = config.pipeline_options();

    assert_eq!(options.entry_retries, 3);
    assert!(options.parse.validate_timestamps);
    assert_eq!(options.concurrent_requests, 2);
}

#[test]
fn test_resolvedModel_forLlamaCpp_shouldUseModelVerbatim() {
    let mut config = valid_config();
    config.translation.provider = TranslationProvider::LlamaCpp;
    assert_eq!(config.translation.resolved_model(), "TheBloke/OpenHermes-2.5-Mistral-7B-GGUF");
}

#[test]
fn test_translationProvider_fromStr_shouldAcceptAliases() {
    assert_eq!("ollama".parse::<TranslationProvider>().unwrap(), TranslationProvider::Ollama);
    assert_eq!("llama.cpp".parse::<TranslationProvider>().unwrap(), TranslationProvider::LlamaCpp);
    assert!("openai".parse::<TranslationProvider>().is_err());
}
