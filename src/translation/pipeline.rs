/*!
 * Translation pipeline: parse, translate every entry, serialize.
 *
 * The pipeline only knows the `Translator` port. Entries are translated one
 * by one (or through a bounded, order-preserving buffer when more than one
 * request may be in flight) and the result is always re-joined in input
 * order before serialization.
 */

use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{PipelineError, TranslationError};
use crate::subtitle_processor::{self, ParseOptions, ParseReport, SkippedBlock, SubtitleEntry};
use crate::translation::core::Translator;

/// Where a pipeline run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Init,
    Parsing,
    /// Handling the entry with this 0-based index
    Translating(usize),
    Serializing,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Parsing => write!(f, "parsing"),
            Self::Translating(index) => write!(f, "translating #{}", index + 1),
            Self::Serializing => write!(f, "serializing"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// What to do with an entry whose translation keeps failing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the whole run, nothing is written
    #[default]
    Abort,
    /// Leave the entry in its source language and carry on
    #[serde(alias = "keep-original")]
    KeepOriginal,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::KeepOriginal => write!(f, "keep-original"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "keep-original" | "keep_original" => Ok(Self::KeepOriginal),
            _ => Err(format!("Invalid failure policy: {} (expected abort or keep-original)", s)),
        }
    }
}

/// Knobs of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOptions {
    pub parse: ParseOptions,
    pub failure_policy: FailurePolicy,
    /// Extra attempts per entry after the first failure
    pub entry_retries: u32,
    /// Translation calls allowed in flight at once
    pub concurrent_requests: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            failure_policy: FailurePolicy::default(),
            entry_retries: 0,
            concurrent_requests: 1,
        }
    }
}

/// Recovered anomalies of a successful run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    /// Blocks the parser dropped
    pub skipped: Vec<SkippedBlock>,
    /// 0-based indices of entries left untranslated
    pub kept_original: Vec<usize>,
    /// Total number of retried translation calls
    pub retries: u32,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The serialized SRT document
    pub text: String,
    /// Translated entries in output order
    pub entries: Vec<SubtitleEntry>,
    pub report: PipelineReport,
}

struct EntryOutcome {
    index: usize,
    original_text: String,
    result: Result<String, TranslationError>,
    retries: u32,
}

/// Translate one entry, retrying up to `retries` extra times
async fn translate_entry<T: Translator + ?Sized>(
    translator: &T,
    index: usize,
    text: String,
    source_language: &str,
    target_language: &str,
    retries: u32,
) -> EntryOutcome {
    // Blank captions have nothing to translate
    if text.trim().is_empty() {
        return EntryOutcome { index, result: Ok(text.clone()), original_text: text, retries: 0 };
    }

    let mut attempt = 0;
    loop {
        match translator.translate(&text, source_language, target_language).await {
            Ok(translation) => {
                return EntryOutcome { index, original_text: text, result: Ok(translation), retries: attempt };
            }
            Err(e) if attempt < retries => {
                attempt += 1;
                warn!("Entry #{} failed ({}), retry {}/{}", index + 1, e, attempt, retries);
            }
            Err(e) => {
                return EntryOutcome { index, original_text: text, result: Err(e), retries: attempt };
            }
        }
    }
}

/// Pipeline controller bound to one translator
pub struct Pipeline<'a, T: Translator + ?Sized> {
    translator: &'a T,
    options: PipelineOptions,
    stage: Mutex<PipelineStage>,
}

impl<'a, T: Translator + ?Sized> Pipeline<'a, T> {
    pub fn new(translator: &'a T, options: PipelineOptions) -> Self {
        Self {
            translator,
            options,
            stage: Mutex::new(PipelineStage::Init),
        }
    }

    /// Current stage of the run
    pub fn stage(&self) -> PipelineStage {
        *self.stage.lock()
    }

    fn set_stage(&self, stage: PipelineStage) {
        let mut current = self.stage.lock();
        if *current != stage {
            debug!("Pipeline stage: {} -> {}", *current, stage);
            *current = stage;
        }
    }

    fn fail(&self, error: PipelineError) -> PipelineError {
        self.set_stage(PipelineStage::Failed);
        error
    }

    /// Run the whole document through the translator.
    ///
    /// `progress` is called with `(completed, total)` after every entry.
    pub async fn run<F>(
        &self,
        input: &str,
        source_language: &str,
        target_language: &str,
        progress: F,
    ) -> Result<PipelineOutput, PipelineError>
    where
        F: Fn(usize, usize),
    {
        self.set_stage(PipelineStage::Parsing);
        let ParseReport { mut entries, skipped } =
            subtitle_processor::parse(input, self.options.parse).map_err(|e| self.fail(e.into()))?;

        let total = entries.len();
        let mut report = PipelineReport {
            skipped,
            ..PipelineReport::default()
        };
        info!("Translating {} entries from {} to {}", total, source_language, target_language);

        let retries = self.options.entry_retries;
        let translator = self.translator;
        let texts: Vec<String> = entries.iter().map(|entry| entry.text.clone()).collect();
        let mut outcomes = stream::iter(texts.into_iter().enumerate())
            .map(|(index, text)| {
                // Reports the most recently started entry
                self.set_stage(PipelineStage::Translating(index));
                translate_entry(translator, index, text, source_language, target_language, retries)
            })
            .buffered(self.options.concurrent_requests.max(1));

        while let Some(outcome) = outcomes.next().await {
            let index = outcome.index;
            report.retries += outcome.retries;

            match outcome.result {
                Ok(translation) => {
                    debug!("#{}: {:?} -> {:?}", index + 1, outcome.original_text, translation);
                    entries[index].text = translation;
                }
                Err(source) => match self.options.failure_policy {
                    FailurePolicy::Abort => {
                        error!("Translation of entry #{} failed: {}", index + 1, source);
                        return Err(self.fail(PipelineError::EntryFailed {
                            index,
                            original_text: outcome.original_text,
                            source,
                        }));
                    }
                    FailurePolicy::KeepOriginal => {
                        warn!("Keeping original text of entry #{}: {}", index + 1, source);
                        report.kept_original.push(index);
                    }
                },
            }

            progress(index + 1, total);
        }

        self.set_stage(PipelineStage::Serializing);
        let text = subtitle_processor::serialize(&entries);
        self.set_stage(PipelineStage::Done);

        Ok(PipelineOutput { text, entries, report })
    }
}

/// Translate an SRT document with default options
pub async fn run<T: Translator + ?Sized>(
    input: &str,
    source_language: &str,
    target_language: &str,
    translator: &T,
) -> Result<String, PipelineError> {
    let pipeline = Pipeline::new(translator, PipelineOptions::default());
    let output = pipeline.run(input, source_language, target_language, |_, _| {}).await?;
    Ok(output.text)
}
