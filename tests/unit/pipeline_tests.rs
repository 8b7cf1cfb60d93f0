/*!
 * Tests for the pipeline controller
 */

use srtranslate::errors::{PipelineError, TranslationError};
use srtranslate::providers::mock::MockProvider;
use srtranslate::translation::pipeline::run;
use srtranslate::translation::{
    FailurePolicy, FnTranslator, Pipeline, PipelineOptions, PipelineStage, TranslationOptions, TranslationService,
};
use crate::common;

/// The canonical single-entry example
#[tokio::test]
async fn test_run_withUppercaseTranslator_shouldProduceExpectedDocument() {
    let translator = common::uppercase_translator();

    let output = run("1\n00:00:01,000 --> 00:00:03,000\nHello world", "en", "fr", &translator).await.unwrap();

    assert_eq!(output, "1\n00:00:01,000 --> 00:00:03,000\nHELLO WORLD\n\n");
}

/// Languages reach the translator unchanged
#[tokio::test]
async fn test_run_shouldPassLanguagesThrough() {
    let translator = FnTranslator::new(|text: &str, source: &str, target: &str| Ok(format!("{}>{}:{}", source, target, text)));

    let output = run("1\n00:00:01,000 --> 00:00:03,000\nHi", "English", "zh-Hant", &translator).await.unwrap();

    assert!(output.contains("English>zh-Hant:Hi"));
}

/// Failure on the second of three entries aborts by default
#[tokio::test]
async fn test_run_withFailureOnSecondEntry_shouldAbort() {
    common::init_logging();
    let translator = common::failing_on_call(2);
    let pipeline = Pipeline::new(&translator, PipelineOptions::default());

    let result = pipeline.run(common::SAMPLE_SRT, "en", "fr", |_, _| {}).await;

    assert!(matches!(
        result,
        Err(PipelineError::EntryFailed { index: 1, source: TranslationError::EmptyOutput, .. })
    ));
    assert_eq!(pipeline.stage(), PipelineStage::Failed);
}

/// Retries absorb a single failure
#[tokio::test]
async fn test_run_withRetry_shouldRecoverFromSingleFailure() {
    let translator = common::failing_on_call(2);
    let options = PipelineOptions { entry_retries: 1, ..PipelineOptions::default() };

    let output = Pipeline::new(&translator, options).run(common::SAMPLE_SRT, "en", "fr", |_, _| {}).await.unwrap();

    assert_eq!(output.entries[1].text, "IT CONTAINS MULTIPLE ENTRIES\nOVER TWO LINES.");
    assert_eq!(output.report.retries, 1);
    assert!(output.report.kept_original.is_empty());
}

/// Keep-original leaves the failing entry untouched
#[tokio::test]
async fn test_run_withKeepOriginal_shouldFinish() {
    let translator = common::failing_on_call(3);
    let options = PipelineOptions { failure_policy: FailurePolicy::KeepOriginal, ..PipelineOptions::default() };

    let output = Pipeline::new(&translator, options).run(common::SAMPLE_SRT, "en", "fr", |_, _| {}).await.unwrap();

    assert_eq!(output.entries[2].text, "For testing purposes.");
    assert_eq!(output.report.kept_original, vec![2]);
    assert!(output.text.contains("THIS IS A TEST SUBTITLE."));
}

/// Malformed blocks are dropped and reported; output is renumbered
#[tokio::test]
async fn test_run_withMalformedBlock_shouldDropAndRenumber() {
    let input = "1\n00:00:01,000 --> 00:00:02,000\nfirst\n\n2\nno timing here\nlost\n\n3\n00:00:05,000 --> 00:00:06,000\nthird\n";
    let translator = common::uppercase_translator();

    let output = Pipeline::new(&translator, PipelineOptions::default()).run(input, "en", "fr", |_, _| {}).await.unwrap();

    assert_eq!(output.text, "1\n00:00:01,000 --> 00:00:02,000\nFIRST\n\n2\n00:00:05,000 --> 00:00:06,000\nTHIRD\n\n");
    assert_eq!(output.report.skipped.len(), 1);
    assert_eq!(output.report.skipped[0].block_number, 2);
}

/// Parallel requests through the mock engine keep input order
#[tokio::test]
async fn test_run_withMockEngineAndConcurrency_shouldKeepOrder() {
    let provider = MockProvider::working().with_custom_response(|request| {
        let text = request.prompt.rsplit(": ").next().unwrap_or_default();
        format!(" <{}>", text.trim_end_matches(" \nA:"))
    });
    let service = TranslationService::new(provider.clone(), TranslationOptions::default());
    let options = PipelineOptions { concurrent_requests: 4, ..PipelineOptions::default() };
    let input = (1..=8)
        .map(|i| format!("{}\n00:00:0{},000 --> 00:00:0{},500\nline {}", i, i, i, i))
        .collect::<Vec<_>>()
        .join("\n\n");

    let output = Pipeline::new(&service, options).run(&input, "en", "fr", |_, _| {}).await.unwrap();

    let texts: Vec<String> = output.entries.iter().map(|e| e.text.clone()).collect();
    let expected: Vec<String> = (1..=8).map(|i| format!("<line {}>", i)).collect();
    assert_eq!(texts, expected);
    assert_eq!(provider.request_count(), 8);
}
