use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, SubtitleError};
use crate::file_utils::FileManager;

// @module: SRT document model, parser and serializer

/// Separator between the start and end timestamps of a block
pub const TIMING_SEPARATOR: &str = " --> ";

/// Separator between blocks
const BLOCK_SEPARATOR: &str = "\n\n";

// @const: SRT timestamp regex (hours may exceed two digits)
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{2,}:[0-5][0-9]:[0-5][0-9],[0-9]{3}$").expect("timestamp pattern is valid")
});

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Start timestamp, copied verbatim from the input
    pub start: String,

    // @field: End timestamp, copied verbatim from the input
    pub end: String,

    // @field: Subtitle text, lines joined with '\n'
    pub text: String,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry
    pub fn new(start: impl Into<String>, end: impl Into<String>, text: impl Into<String>) -> Self {
        SubtitleEntry {
            start: start.into(),
            end: end.into(),
            text: text.into(),
        }
    }

    /// Write this entry as an SRT block with the given sequence number
    pub fn write_block(&self, seq_num: usize, out: &mut String) {
        out.push_str(&seq_num.to_string());
        out.push('\n');
        out.push_str(&self.start);
        out.push_str(TIMING_SEPARATOR);
        out.push_str(&self.end);
        out.push('\n');
        out.push_str(&self.text);
        out.push_str(BLOCK_SEPARATOR);
    }

    /// Parse an SRT timestamp (`HH:MM:SS,mmm`) to milliseconds
    ///
    /// Returns `None` for malformed input and for hour counts too large to
    /// represent in milliseconds.
    pub fn parse_timestamp(timestamp: &str) -> Option<u64> {
        if !TIMESTAMP_REGEX.is_match(timestamp) {
            return None;
        }

        let (clock, millis) = timestamp.split_once(',')?;
        let mut parts = clock.split(':');
        let hours: u64 = parts.next()?.parse().ok()?;
        let minutes: u64 = parts.next()?.parse().ok()?;
        let seconds: u64 = parts.next()?.parse().ok()?;
        let millis: u64 = millis.parse().ok()?;

        hours
            .checked_mul(3_600_000)?
            .checked_add(minutes * 60_000 + seconds * 1_000 + millis)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}{}{}", self.start, TIMING_SEPARATOR, self.end)?;
        write!(f, "{}", self.text)
    }
}

/// What the parser does with a block whose timing line is unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedBlockPolicy {
    /// Record the block as skipped, log it and keep going
    #[default]
    Skip,
    /// Fail the whole parse
    Abort,
}

/// Parser settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Policy for blocks with a malformed timing line or timestamp
    pub malformed_blocks: MalformedBlockPolicy,

    /// Check timestamp syntax instead of copying it through opaquely
    pub validate_timestamps: bool,
}

/// Why a block was left out of the parsed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than three lines (index, timing, text)
    TooFewLines,
    /// Timing line lacks a single `" --> "` separator
    MalformedTiming,
    /// A timestamp is empty or fails validation
    InvalidTimestamp,
}

/// A block dropped during parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBlock {
    /// 1-based position of the block in the input
    pub block_number: usize,
    /// Why it was dropped
    pub reason: SkipReason,
    /// Raw block content
    pub content: String,
}

/// Parser output: the entries plus everything that was dropped
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    /// Accepted entries, in input order
    pub entries: Vec<SubtitleEntry>,
    /// Dropped blocks, in input order
    pub skipped: Vec<SkippedBlock>,
}

/// Parse SRT text with default options (skip malformed blocks, opaque timestamps)
pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
    parse(content, ParseOptions::default()).map(|report| report.entries)
}

/// Parse SRT text into entries
///
/// The input is split on blank lines. A block needs an index line, a
/// `<start> --> <end>` line and at least one text line; the index is
/// discarded since output is renumbered.
pub fn parse(content: &str, options: ParseOptions) -> Result<ParseReport, SubtitleError> {
    let normalized = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let trimmed = normalized.trim();

    let mut report = ParseReport::default();
    if trimmed.is_empty() {
        debug!("Empty subtitle document");
        return Ok(report);
    }

    for (i, block) in trimmed.split(BLOCK_SEPARATOR).enumerate() {
        let block_number = i + 1;
        let lines: Vec<&str> = block.split('\n').collect();

        if lines.len() < 3 {
            warn!("Skipping block {}: expected at least 3 lines, found {}", block_number, lines.len());
            report.skipped.push(SkippedBlock {
                block_number,
                reason: SkipReason::TooFewLines,
                content: block.to_string(),
            });
            continue;
        }

        match parse_block(block_number, &lines, options) {
            Ok(entry) => report.entries.push(entry),
            Err(e) if options.malformed_blocks == MalformedBlockPolicy::Skip => {
                warn!("Skipping block {}: {}", block_number, e);
                let reason = match e {
                    SubtitleError::MalformedTiming { .. } => SkipReason::MalformedTiming,
                    SubtitleError::InvalidTimestamp { .. } => SkipReason::InvalidTimestamp,
                };
                report.skipped.push(SkippedBlock {
                    block_number,
                    reason,
                    content: block.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    debug!(
        "Parsed {} subtitle entries ({} blocks skipped)",
        report.entries.len(),
        report.skipped.len()
    );

    Ok(report)
}

fn parse_block(block_number: usize, lines: &[&str], options: ParseOptions) -> Result<SubtitleEntry, SubtitleError> {
    let malformed = || SubtitleError::MalformedTiming {
        block_number,
        content: lines.join("\n"),
    };

    let (start, end) = lines[1].split_once(TIMING_SEPARATOR).ok_or_else(malformed)?;
    if end.contains(TIMING_SEPARATOR) {
        return Err(malformed());
    }

    for value in [start, end] {
        let valid = if options.validate_timestamps {
            TIMESTAMP_REGEX.is_match(value)
        } else {
            !value.is_empty()
        };
        if !valid {
            return Err(SubtitleError::InvalidTimestamp {
                block_number,
                value: value.to_string(),
            });
        }
    }

    if options.validate_timestamps {
        if let (Some(start_ms), Some(end_ms)) = (SubtitleEntry::parse_timestamp(start), SubtitleEntry::parse_timestamp(end)) {
            if end_ms < start_ms {
                warn!("Block {} ends before it starts ({} --> {})", block_number, start, end);
            }
        }
    }

    Ok(SubtitleEntry::new(start, end, lines[2..].join("\n")))
}

/// Serialize entries to SRT text, numbering them from 1
pub fn serialize(entries: &[SubtitleEntry]) -> String {
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        entry.write_block(i + 1, &mut out);
    }
    out
}

/// Collection of subtitle entries with the file they came from
#[derive(Debug, Clone)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleCollection {
    /// Read and parse an SRT file with default options
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)?;
        Ok(SubtitleCollection {
            source_file: path.to_path_buf(),
            entries: parse_srt_string(&content)?,
        })
    }

    /// Render the collection as SRT text
    pub fn to_srt_string(&self) -> String {
        serialize(&self.entries)
    }

    /// Write subtitles to an SRT file, replacing it atomically
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<(), AppError> {
        FileManager::write_atomic(path, &self.to_srt_string())
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}
