/*!
 * Application lifecycle tests against real provider wiring
 */

use anyhow::Result;
use srtranslate::app_config::{Config, TranslationProvider};
use srtranslate::app_controller::Controller;
use srtranslate::errors::{AppError, TranslationError};
use crate::common;

fn config_for(provider: TranslationProvider, endpoint: &str) -> Config {
    let mut config = Config {
        source_language: "English".to_string(),
        target_language: "German".to_string(),
        ..Config::default()
    };
    config.translation.provider = provider;
    config.translation.endpoint = endpoint.to_string();
    config.translation.timeout_secs = 5;
    config.translation.retry_count = 0;
    config
}

/// Missing input is reported before the engine is contacted
#[tokio::test]
async fn test_run_withMissingInput_shouldFailWithFileError() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let controller = Controller::with_config(config_for(TranslationProvider::Ollama, "http://127.0.0.1:1"))?;

    let result = controller.run(&dir.path().join("nope.srt"), &dir.path().join("out.srt")).await;

    assert!(matches!(result, Err(AppError::File(_))));
    Ok(())
}

/// An engine that is not running is an inference failure
#[tokio::test]
async fn test_run_withUnreachableEngine_shouldFailWithUnavailable() -> Result<()> {
    common::init_logging();
    let dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(dir.path(), "in.srt")?;
    let output = dir.path().join("out.srt");

    for provider in [TranslationProvider::Ollama, TranslationProvider::LlamaCpp] {
        let controller = Controller::with_config(config_for(provider, "http://127.0.0.1:1"))?;

        let result = controller.run(&input, &output).await;

        match result {
            Err(error @ AppError::Translation(TranslationError::InferenceUnavailable(_))) => {
                assert_eq!(error.exit_code(), 4)
            }
            other => panic!("unexpected result for {}: {:?}", provider, other.map(|s| s.entries)),
        }
        assert!(!output.exists());
    }
    Ok(())
}

/// Invalid configuration is rejected up front
#[test]
fn test_withConfig_withInvalidEndpoint_shouldFailWithConfigExitCode() {
    let result = Controller::with_config(config_for(TranslationProvider::Ollama, "not a url"));
    match result {
        Err(error) => assert_eq!(error.exit_code(), 6),
        Ok(_) => panic!("invalid endpoint was accepted"),
    }
}
