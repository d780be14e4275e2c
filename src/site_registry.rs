/*!
 * Site-languages registry parsing.
 *
 * The registry is an XLSX workbook mapping deployment sites to the ordered
 * list of languages each site should receive. Only the first sheet is read.
 * Column layout (header row skipped):
 * - column 0: '/'-separated language list, lower-cased, tokens trimmed
 * - column 2: numeric site code, coerced to an integer-valued string
 *   (so a cell holding 64001.0 becomes "64001")
 */

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};

use crate::errors::EditionsError;
use crate::reporting::Reporter;

/// One registry row: a site code and its ordered language list.
///
/// The first language in the list is the site's default language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteEntry {
    /// Canonical site code, e.g. "64001"
    pub site_code: String,
    /// Ordered, lower-cased language names, e.g. ["english", "french"]
    pub languages: Vec<String>,
}

/// Immutable site -> languages mapping, in sheet order
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: Vec<SiteEntry>,
}

impl SiteRegistry {
    /// Read the registry from the first sheet of an XLSX workbook.
    ///
    /// A duplicate site code replaces the earlier row (last wins) and is
    /// reported as a warning. Fully empty rows are skipped.
    pub fn read<P: AsRef<Path>>(
        path: P,
        reporter: &dyn Reporter,
    ) -> Result<SiteRegistry, EditionsError> {
        let path = path.as_ref();
        let mut workbook: Xlsx<_> = open_workbook(path)
            .map_err(|e| EditionsError::Registry(format!("{}: {}", path.display(), e)))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| EditionsError::Registry(format!("{}: workbook has no sheets", path.display())))??;

        let mut registry = SiteRegistry::default();
        for row in range.rows().skip(1) {
            if row.iter().all(|cell| matches!(cell, Data::Empty)) {
                continue;
            }
            let languages = parse_languages(row.first())?;
            let site_code = parse_site_code(row.get(2))?;
            if registry.get(&site_code).is_some() {
                reporter.warn(&format!(
                    "Duplicate registry row for site {0}, keeping the later row.",
                    site_code
                ));
                registry.sites.retain(|entry| entry.site_code != site_code);
            }
            registry.sites.push(SiteEntry {
                site_code,
                languages,
            });
        }
        Ok(registry)
    }

    /// Languages for a site code, if present
    pub fn get(&self, site_code: &str) -> Option<&[String]> {
        self.sites
            .iter()
            .find(|entry| entry.site_code == site_code)
            .map(|entry| entry.languages.as_slice())
    }

    /// Iterate entries in sheet order
    pub fn iter(&self) -> impl Iterator<Item = &SiteEntry> {
        self.sites.iter()
    }

    /// Number of distinct sites
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Split, lower-case and trim the language list cell.
fn parse_languages(cell: Option<&Data>) -> Result<Vec<String>, EditionsError> {
    let text = match cell {
        Some(Data::String(s)) if !s.trim().is_empty() => s,
        _ => {
            return Err(EditionsError::input_format(
                "Site languages",
                "a '/'-separated language list in column 1",
                &describe_cell(cell),
            ))
        }
    };
    Ok(text
        .to_lowercase()
        .split('/')
        .map(|token| token.trim().to_string())
        .collect())
}

/// Coerce the site code cell to an integer-valued string.
///
/// XLSX numeric cells come back as floats, so "64001" in the sheet arrives
/// as 64001.0; any fractional noise is dropped. String cells holding a
/// numeric value are accepted the same way.
fn parse_site_code(cell: Option<&Data>) -> Result<String, EditionsError> {
    let value = match cell {
        Some(Data::Float(f)) => Some(*f),
        Some(Data::Int(i)) => Some(*i as f64),
        Some(Data::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match value {
        Some(v) if v.is_finite() => Ok(format!("{}", v.trunc() as i64)),
        _ => Err(EditionsError::input_format(
            "Site languages",
            "a numeric site code in column 3",
            &describe_cell(cell),
        )),
    }
}

fn describe_cell(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => "an empty cell".to_string(),
        Some(value) => format!("'{}'", value),
    }
}
