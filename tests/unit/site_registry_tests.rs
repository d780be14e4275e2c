/*!
 * Tests for site-languages registry parsing
 */

use anyhow::Result;
use rust_xlsxwriter::Workbook;
use xform_editions::reporting::{CapturingReporter, Reporter};
use xform_editions::site_registry::SiteRegistry;

use crate::common;

/// Registry rows map site codes to ordered language lists
#[test]
fn test_read_withValidRows_shouldMapSitesToLanguages() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::write_registry(
        temp_dir.path(),
        "site_languages.xlsx",
        &[("english", 61221.0), ("English/Spanish", 11101.0)],
    )?;
    let reporter = CapturingReporter::new();

    let registry = SiteRegistry::read(&path, &reporter)?;

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get("61221"), Some(&["english".to_string()][..]));
    assert_eq!(
        registry.get("11101"),
        Some(&["english".to_string(), "spanish".to_string()][..])
    );
    Ok(())
}

/// Whitespace around language tokens is trimmed
#[test]
fn test_read_withSpacesInLanguageList_shouldTrimTokens() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::write_registry(
        temp_dir.path(),
        "site_languages.xlsx",
        &[(" english / french ", 64001.0)],
    )?;
    let reporter = CapturingReporter::new();

    let registry = SiteRegistry::read(&path, &reporter)?;

    assert_eq!(
        registry.get("64001"),
        Some(&["english".to_string(), "french".to_string()][..])
    );
    Ok(())
}

/// Numeric site codes arrive from XLSX as floats and lose the decimal noise
#[test]
fn test_read_withFloatSiteCode_shouldCoerceToIntegerString() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::write_registry(
        temp_dir.path(),
        "site_languages.xlsx",
        &[("english", 64001.0)],
    )?;
    let reporter = CapturingReporter::new();

    let registry = SiteRegistry::read(&path, &reporter)?;

    assert!(registry.get("64001").is_some());
    assert!(registry.get("64001.0").is_none());
    Ok(())
}

/// A non-numeric site code cell is a fatal format error
#[test]
fn test_read_withNonNumericSiteCode_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("site_languages.xlsx");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "languages")?;
    worksheet.write_string(0, 2, "site_code")?;
    worksheet.write_string(1, 0, "english")?;
    worksheet.write_string(1, 2, "not-a-code")?;
    workbook.save(&path)?;
    let reporter = CapturingReporter::new();

    let result = SiteRegistry::read(&path, &reporter);

    assert!(result.is_err());
    let message = result.unwrap_err().to_string();
    assert!(message.contains("numeric site code"), "got: {}", message);
    Ok(())
}

/// A missing language list cell is a fatal format error
#[test]
fn test_read_withMissingLanguageColumn_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("site_languages.xlsx");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "languages")?;
    worksheet.write_string(0, 2, "site_code")?;
    worksheet.write_number(1, 2, 64001.0)?;
    workbook.save(&path)?;
    let reporter = CapturingReporter::new();

    let result = SiteRegistry::read(&path, &reporter);

    assert!(result.is_err());
    Ok(())
}

/// A duplicate site code keeps the later row and reports a warning
#[test]
fn test_read_withDuplicateSiteCode_shouldKeepLastRowAndWarn() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::write_registry(
        temp_dir.path(),
        "site_languages.xlsx",
        &[("english", 64001.0), ("french", 64001.0)],
    )?;
    let reporter = CapturingReporter::new();

    let registry = SiteRegistry::read(&path, &reporter)?;

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("64001"), Some(&["french".to_string()][..]));
    assert_eq!(reporter.warnings(), 1);
    Ok(())
}

/// A missing registry file surfaces as a registry error, not a panic
#[test]
fn test_read_withMissingFile_shouldFail() {
    let reporter = CapturingReporter::new();
    let result = SiteRegistry::read("no_such_registry.xlsx", &reporter);
    assert!(result.is_err());
}
