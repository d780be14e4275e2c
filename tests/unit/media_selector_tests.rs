/*!
 * Tests for language-suffix media selection
 */

use std::path::Path;

use anyhow::Result;
use xform_editions::media_selector;
use xform_editions::reporting::{CapturingReporter, Reporter};

use crate::common;

/// Only files whose stem ends with a requested language are selected
#[test]
fn test_select_withOneLanguage_shouldKeepOnlyMatchingFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let media_dir = common::create_media_tree(
        temp_dir.path(),
        "R1309_BEHAVE-media",
        &["q1_english.png", "q1_french.png"],
    )?;
    let languages = vec!["english".to_string()];
    let reporter = CapturingReporter::new();

    let jobs = media_selector::select(&media_dir, &languages, &reporter)?;

    assert_eq!(jobs.len(), 1);
    assert!(jobs[0].source.ends_with("q1_english.png"));
    assert_eq!(reporter.warnings(), 0);
    Ok(())
}

/// Archive paths are relative to the media directory's parent, so the
/// media folder name itself is preserved in the archive
#[test]
fn test_select_shouldKeepMediaFolderNameInArchivePath() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let media_dir = common::create_media_tree(
        temp_dir.path(),
        "R1309_BEHAVE-media",
        &["q1_english.png"],
    )?;
    let languages = vec!["english".to_string()];
    let reporter = CapturingReporter::new();

    let jobs = media_selector::select(&media_dir, &languages, &reporter)?;

    assert_eq!(
        jobs[0].archive_path,
        Path::new("R1309_BEHAVE-media").join("q1_english.png")
    );
    Ok(())
}

/// The walk is recursive and subdirectory structure survives in archive paths
#[test]
fn test_select_withNestedDirectories_shouldPreserveStructure() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let media_dir = common::create_media_tree(
        temp_dir.path(),
        "R1309_BEHAVE-media",
        &["q1_english.png", "audio/q2_english.mp3", "audio/q2_german.mp3"],
    )?;
    let languages = vec!["english".to_string()];
    let reporter = CapturingReporter::new();

    let mut jobs = media_selector::select(&media_dir, &languages, &reporter)?;
    jobs.sort_by(|a, b| a.archive_path.cmp(&b.archive_path));

    assert_eq!(jobs.len(), 2);
    assert_eq!(
        jobs[0].archive_path,
        Path::new("R1309_BEHAVE-media").join("audio").join("q2_english.mp3")
    );
    assert_eq!(
        jobs[1].archive_path,
        Path::new("R1309_BEHAVE-media").join("q1_english.png")
    );
    Ok(())
}

/// Files for several requested languages are all selected
#[test]
fn test_select_withMultipleLanguages_shouldKeepAllMatching() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let media_dir = common::create_media_tree(
        temp_dir.path(),
        "R1309_BEHAVE-media",
        &["q1_english.png", "q1_french.png", "q1_german.png"],
    )?;
    let languages = vec!["english".to_string(), "french".to_string()];
    let reporter = CapturingReporter::new();

    let jobs = media_selector::select(&media_dir, &languages, &reporter)?;

    assert_eq!(jobs.len(), 2);
    assert!(jobs
        .iter()
        .all(|job| !job.source.to_string_lossy().contains("german")));
    Ok(())
}

/// Non-matching files are excluded without any warning
#[test]
fn test_select_withNoMatches_shouldReturnEmptySilently() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let media_dir = common::create_media_tree(
        temp_dir.path(),
        "R1309_BEHAVE-media",
        &["q1_french.png"],
    )?;
    let languages = vec!["english".to_string()];
    let reporter = CapturingReporter::new();

    let jobs = media_selector::select(&media_dir, &languages, &reporter)?;

    assert!(jobs.is_empty());
    assert_eq!(reporter.warnings(), 0);
    Ok(())
}

/// A missing media directory yields an empty selection and one warning
#[test]
fn test_select_withMissingDirectory_shouldWarnAndReturnEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let media_dir = temp_dir.path().join("no-such-media");
    let languages = vec!["english".to_string()];
    let reporter = CapturingReporter::new();

    let jobs = media_selector::select(&media_dir, &languages, &reporter)?;

    assert!(jobs.is_empty());
    assert_eq!(reporter.warnings(), 1);
    Ok(())
}
