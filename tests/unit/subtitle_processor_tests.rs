/*!
 * Tests for subtitle parsing and serialization
 */

use anyhow::Result;
use srtranslate::errors::SubtitleError;
use srtranslate::subtitle_processor::{
    parse, parse_srt_string, serialize, MalformedBlockPolicy, ParseOptions, SkipReason, SubtitleCollection,
    SubtitleEntry,
};
use crate::common;

/// Parsing the canonical single-entry document
#[test]
fn test_parseSrtString_withSingleEntry_shouldExtractFields() {
    let entries = parse_srt_string("1\n00:00:01,000 --> 00:00:03,000\nHello world").unwrap();
    assert_eq!(entries, vec![SubtitleEntry::new("00:00:01,000", "00:00:03,000", "Hello world")]);
}

/// Multi-line text is kept with embedded newlines
#[test]
fn test_parseSrtString_withMultiLineText_shouldJoinLines() {
    let entries = parse_srt_string(common::SAMPLE_SRT).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].text, "It contains multiple entries\nover two lines.");
}

/// Blocks with fewer than three lines are dropped and reported
#[test]
fn test_parse_withShortBlock_shouldSkipIt() {
    let input = "1\n00:00:01,000 --> 00:00:02,000\n\n2\n00:00:03,000 --> 00:00:04,000\nKept";
    let report = parse(input, ParseOptions::default()).unwrap();

    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].text, "Kept");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].block_number, 1);
    assert_eq!(report.skipped[0].reason, SkipReason::TooFewLines);
}

/// Missing separator is skipped by default
#[test]
fn test_parse_withMissingSeparator_shouldSkipByDefault() {
    let input = "1\n00:00:01,000 00:00:02,000\nBroken\n\n2\n00:00:03,000 --> 00:00:04,000\nFine";
    let report = parse(input, ParseOptions::default()).unwrap();

    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::MalformedTiming);
    assert!(report.skipped[0].content.contains("Broken"));
}

/// Missing separator fails under the abort policy
#[test]
fn test_parse_withMissingSeparatorAndAbortPolicy_shouldFail() {
    let input = "1\n00:00:01,000 --> 00:00:02,000\nFine\n\n2\n00:00:03,000 00:00:04,000\nBroken";
    let options = ParseOptions { malformed_blocks: MalformedBlockPolicy::Abort, validate_timestamps: false };

    match parse(input, options) {
        Err(SubtitleError::MalformedTiming { block_number, content }) => {
            assert_eq!(block_number, 2);
            assert!(content.contains("Broken"));
        }
        other => panic!("unexpected result: {:?}", other.map(|r| r.entries)),
    }
}

/// Timestamps are opaque unless validation is enabled
#[test]
fn test_parse_withNonStandardTimestamps_shouldPassThroughUnlessValidated() {
    let input = "1\n0:0:1.5 --> 0:0:2.5\nLoose";

    let lenient = parse(input, ParseOptions::default()).unwrap();
    assert_eq!(lenient.entries[0].start, "0:0:1.5");

    let strict = parse(input, ParseOptions { validate_timestamps: true, ..ParseOptions::default() }).unwrap();
    assert!(strict.entries.is_empty());
    assert_eq!(strict.skipped[0].reason, SkipReason::InvalidTimestamp);
}

/// End before start is not rejected
#[test]
fn test_parse_withEndBeforeStart_shouldKeepEntry() {
    let input = "1\n00:00:05,000 --> 00:00:01,000\nBackwards";
    let options = ParseOptions { validate_timestamps: true, ..ParseOptions::default() };
    let report = parse(input, options).unwrap();
    assert_eq!(report.entries.len(), 1);
}

/// Empty and whitespace-only input yield no entries
#[test]
fn test_parse_withEmptyInput_shouldReturnNoEntries() {
    assert!(parse_srt_string("").unwrap().is_empty());
    assert!(parse_srt_string(" \n\n \r\n").unwrap().is_empty());
}

/// Serialization renumbers from 1
#[test]
fn test_serialize_shouldRenumberFromOne() {
    let entries = parse_srt_string(common::SAMPLE_SRT).unwrap();
    let output = serialize(&entries);

    assert!(output.starts_with("1\n00:00:01,000 --> 00:00:04,000\n"));
    assert!(output.contains("\n\n2\n00:00:05,000 --> 00:00:09,000\n"));
    assert!(output.contains("\n\n3\n00:00:10,000 --> 00:00:14,000\n"));
    assert!(!output.contains("\n\n7\n"));
    assert!(output.ends_with("For testing purposes.\n\n"));
}

/// Duplicated input indices are replaced by a fresh 1..N sequence
#[test]
fn test_serialize_withDuplicatedIndices_shouldRenumberSequentially() {
    let input = "1\n00:00:01,000 --> 00:00:02,000\nFirst\n\n1\n00:00:03,000 --> 00:00:04,000\nSecond\n\n1\n00:00:05,000 --> 00:00:06,000\nThird\n";
    let entries = parse_srt_string(input).unwrap();
    assert_eq!(entries.len(), 3);

    assert_eq!(
        serialize(&entries),
        "1\n00:00:01,000 --> 00:00:02,000\nFirst\n\n2\n00:00:03,000 --> 00:00:04,000\nSecond\n\n3\n00:00:05,000 --> 00:00:06,000\nThird\n\n"
    );
}

/// Empty entry list serializes to the empty string
#[test]
fn test_serialize_withNoEntries_shouldBeEmpty() {
    assert_eq!(serialize(&[]), "");
}

/// Parse and serialize are stable after the first normalization
#[test]
fn test_roundTrip_shouldBeStableAfterFirstPass() {
    let input = "\u{feff}3\r\n00:00:01,000 --> 00:00:02,000\r\nOne\r\n\r\nbad block\r\n\r\n8\r\n00:00:03,000 --> 00:00:04,000\r\nTwo\r\nlines\r\n";
    let once = serialize(&parse_srt_string(input).unwrap());
    let twice = serialize(&parse_srt_string(&once).unwrap());
    assert_eq!(once, twice);
    assert_eq!(once, "1\n00:00:01,000 --> 00:00:02,000\nOne\n\n2\n00:00:03,000 --> 00:00:04,000\nTwo\nlines\n\n");
}

/// Collections load from and save to disk
#[test]
fn test_subtitleCollection_fromFileAndWrite_shouldRoundTrip() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(dir.path(), "in.srt")?;
    let output = dir.path().join("out.srt");

    let collection = SubtitleCollection::from_file(&input)?;
    assert_eq!(collection.entries.len(), 3);
    assert_eq!(collection.source_file, input);

    collection.write_to_srt(&output)?;
    let reloaded = SubtitleCollection::from_file(&output)?;
    assert_eq!(reloaded.entries, collection.entries);
    Ok(())
}

/// Timestamp conversion helper
#[test]
fn test_parseTimestamp_withValidAndInvalidValues() {
    assert_eq!(SubtitleEntry::parse_timestamp("01:23:45,678"), Some(5_025_678));
    assert_eq!(SubtitleEntry::parse_timestamp("100:00:00,000"), Some(360_000_000));
    assert_eq!(SubtitleEntry::parse_timestamp("00:61:00,000"), None);
    assert_eq!(SubtitleEntry::parse_timestamp("00:00:01.000"), None);
}
