/*!
 * Tests for error types, conversions and exit codes
 */

use std::time::Duration;
use srtranslate::errors::{AppError, PipelineError, ProviderError, SubtitleError, TranslationError};

#[test]
fn test_providerError_apiError_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 500,
        message: "model crashed".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("500"));
    assert!(display.contains("model crashed"));
}

#[test]
fn test_subtitleError_malformedTiming_shouldNameBlock() {
    let error = SubtitleError::MalformedTiming {
        block_number: 4,
        content: "4\nbad\ntext".to_string(),
    };
    let display = error.to_string();
    assert!(display.contains("block 4"));
    assert!(display.contains("bad"));
}

#[test]
fn test_translationError_fromProviderError_shouldWrap() {
    let error: TranslationError = ProviderError::ParseError("not json".to_string()).into();
    assert!(matches!(error, TranslationError::Provider(ProviderError::ParseError(_))));
}

#[test]
fn test_pipelineError_entryFailed_shouldUseOneBasedIndex() {
    let error = PipelineError::EntryFailed {
        index: 1,
        original_text: "Hello".to_string(),
        source: TranslationError::EmptyOutput,
    };
    let display = error.to_string();
    assert!(display.contains("#2"));
    assert!(display.contains("\"Hello\""));
    assert!(display.contains("no output"));
    assert!(std::error::Error::source(&error).is_some());
}

#[test]
fn test_appError_exitCode_shouldFollowErrorKind() {
    let parse = AppError::Pipeline(PipelineError::Parse(SubtitleError::InvalidTimestamp {
        block_number: 1,
        value: String::new(),
    }));
    let entry = AppError::Pipeline(PipelineError::EntryFailed {
        index: 0,
        original_text: "x".to_string(),
        source: TranslationError::InferenceTimeout(Duration::from_secs(1)),
    });
    let unavailable = AppError::Translation(TranslationError::InferenceUnavailable("down".to_string()));

    assert_eq!(AppError::Unknown("?".to_string()).exit_code(), 1);
    assert_eq!(parse.exit_code(), 3);
    assert_eq!(entry.exit_code(), 4);
    assert_eq!(unavailable.exit_code(), 4);
    assert_eq!(AppError::File("missing".to_string()).exit_code(), 5);
    assert_eq!(AppError::Config("bad".to_string()).exit_code(), 6);
}

#[test]
fn test_appError_fromIoError_shouldBeFileError() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: AppError = io.into();
    assert_eq!(error.exit_code(), 5);
}
