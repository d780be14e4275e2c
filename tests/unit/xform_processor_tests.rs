/*!
 * Tests for XForm language filtering and SID stamping
 */

use anyhow::Result;
use xform_editions::reporting::{CapturingReporter, Reporter};
use xform_editions::xform_processor;

use crate::common;

/// Filtering for one language keeps exactly that translation, flagged default,
/// even though the source flags a different language as default
#[test]
fn test_filter_languages_withSingleLanguage_shouldKeepOnlyThatTranslationAsDefault() -> Result<()> {
    let xml = common::fixture_xform().into_bytes();
    let languages = vec!["english".to_string()];

    let filtered = xform_processor::filter_languages(&xml, &languages)?;

    let summary = common::translation_summary(&filtered)?;
    assert_eq!(summary, vec![("english".to_string(), true)]);
    Ok(())
}

/// Retained translations are the intersection of requested and present tags,
/// and only the first requested language carries the default flag
#[test]
fn test_filter_languages_withSubset_shouldRetainIntersectionWithFirstAsDefault() -> Result<()> {
    let xml = common::fixture_xform().into_bytes();
    let languages = vec![
        "german".to_string(),
        "french".to_string(),
        "norwegian".to_string(),
    ];

    let filtered = xform_processor::filter_languages(&xml, &languages)?;

    let summary = common::translation_summary(&filtered)?;
    assert_eq!(
        summary,
        vec![("french".to_string(), false), ("german".to_string(), true)]
    );
    Ok(())
}

/// When the first requested language is absent from the source, no retained
/// translation is marked default
#[test]
fn test_filter_languages_withAbsentFirstLanguage_shouldLeaveNoDefault() -> Result<()> {
    let xml = common::fixture_xform().into_bytes();
    let languages = vec!["norwegian".to_string(), "english".to_string()];

    let filtered = xform_processor::filter_languages(&xml, &languages)?;

    let summary = common::translation_summary(&filtered)?;
    assert_eq!(summary, vec![("english".to_string(), false)]);
    Ok(())
}

/// A translation element without a lang attribute is a document format
/// error, failing that site's build rather than silently dropping the node
#[test]
fn test_filter_languages_withLangLessTranslation_shouldFail() -> Result<()> {
    let xml = common::fixture_xform()
        .replace("<translation lang=\"german\">", "<translation>")
        .into_bytes();
    let languages = vec!["english".to_string()];

    let result = xform_processor::filter_languages(&xml, &languages);

    assert!(result.is_err());
    let message = result.unwrap_err().to_string();
    assert!(message.contains("lang"), "got: {}", message);
    Ok(())
}

/// Stamping appends "{site_code}-" to the SID default text
#[test]
fn test_stamp_sid_withSingleSid_shouldAppendSiteCode() -> Result<()> {
    let xml = common::fixture_xform().into_bytes();
    let reporter = CapturingReporter::new();

    let stamped = xform_processor::stamp_sid(&xml, "64001", &reporter)?;

    assert_eq!(common::sid_text(&stamped)?, Some("R1309-64001-".to_string()));
    assert_eq!(reporter.warnings(), 0);
    Ok(())
}

/// Stamping twice appends twice: the operation is cumulative, not idempotent
#[test]
fn test_stamp_sid_appliedTwice_shouldAppendTwice() -> Result<()> {
    let xml = common::fixture_xform().into_bytes();
    let reporter = CapturingReporter::new();

    let once = xform_processor::stamp_sid(&xml, "64001", &reporter)?;
    let twice = xform_processor::stamp_sid(&once, "64001", &reporter)?;

    assert_eq!(
        common::sid_text(&twice)?,
        Some("R1309-64001-64001-".to_string())
    );
    Ok(())
}

/// A document without a SID element is left untouched, with a warning
#[test]
fn test_stamp_sid_withNoSid_shouldWarnAndLeaveDocumentUnchanged() -> Result<()> {
    let xml = common::fixture_xform_without_sid().into_bytes();
    let reporter = CapturingReporter::new();

    let stamped = xform_processor::stamp_sid(&xml, "64001", &reporter)?;

    assert_eq!(stamped, xml);
    assert_eq!(reporter.warnings(), 1);
    let info = reporter.messages_at("INFO").join("\n");
    assert!(info.contains("SIDs found: 0"), "got: {}", info);
    assert!(info.contains("Appended: false"), "got: {}", info);
    Ok(())
}

/// An ambiguous SID match (more than one element) is also left unstamped
#[test]
fn test_stamp_sid_withTwoSids_shouldWarnAndLeaveDocumentUnchanged() -> Result<()> {
    let xml = common::fixture_xform_with_two_sids().into_bytes();
    let reporter = CapturingReporter::new();

    let stamped = xform_processor::stamp_sid(&xml, "64001", &reporter)?;

    assert_eq!(stamped, xml);
    assert_eq!(reporter.warnings(), 1);
    let info = reporter.messages_at("INFO").join("\n");
    assert!(info.contains("SIDs found: 2"), "got: {}", info);
    Ok(())
}

/// The combined transform filters translations and stamps the SID in one go
#[test]
fn test_transform_shouldFilterAndStamp() -> Result<()> {
    let xml = common::fixture_xform().into_bytes();
    let languages = vec!["english".to_string()];
    let reporter = CapturingReporter::new();

    let transformed = xform_processor::transform(&xml, &languages, "64001", &reporter)?;

    assert_eq!(
        common::translation_summary(&transformed)?,
        vec![("english".to_string(), true)]
    );
    assert_eq!(
        common::sid_text(&transformed)?,
        Some("R1309-64001-".to_string())
    );
    Ok(())
}

/// Non-translation content (instance data, body) survives filtering verbatim
#[test]
fn test_filter_languages_shouldPreserveInstanceContent() -> Result<()> {
    let xml = common::fixture_xform().into_bytes();
    let languages = vec!["english".to_string()];

    let filtered = xform_processor::filter_languages(&xml, &languages)?;

    assert_eq!(common::sid_text(&filtered)?, Some("R1309-".to_string()));
    let text = String::from_utf8(filtered)?;
    assert!(text.contains("Behaviour questionnaire"));
    assert!(!text.contains("Bonjour"));
    Ok(())
}
