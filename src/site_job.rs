/*!
 * Per-site build job assembly.
 *
 * A `ZipJob` is everything the archive writer needs for one site: the
 * selected media pairs, the transformed document bytes under the document's
 * original file name, and optionally a collect.settings entry. Nested mode
 * prefixes media and document paths with `odk/forms/` so the archive can be
 * extracted at the root of a device's storage; the settings entry always
 * lives under `odk/`, independent of nesting.
 */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::media_selector::{self, MediaJob};
use crate::reporting::Reporter;
use crate::xform_processor;

/// Archive namespace used by nested mode for media and the document
const NEST_PREFIX: [&str; 2] = ["odk", "forms"];
/// Archive namespace for the settings entry
const SETTINGS_PREFIX: &str = "odk";

/// Everything to be written into one site's archive
#[derive(Debug, Clone)]
pub struct ZipJob {
    /// Site code, also the archive's base name
    pub site_code: String,
    /// Selected media files for the site's languages
    pub media: Vec<MediaJob>,
    /// Archive path and transformed bytes of the document
    pub document: (PathBuf, Vec<u8>),
    /// Optional collect.settings entry
    pub settings: Option<MediaJob>,
}

/// Prepare the zip job for a single site.
///
/// The media directory is derived from the document path by convention:
/// `{stem}-media` in the same directory as the document. The document is
/// read and transformed fresh for every site, so jobs share no mutable
/// state and can be built in parallel.
pub fn build_site_job(
    xform_path: &Path,
    site_code: &str,
    languages: &[String],
    nested: bool,
    collect_settings: Option<&Path>,
    reporter: &dyn Reporter,
) -> Result<ZipJob> {
    reporter.info(&format!(
        "Preparing files for site: {0}, languages: {1:?}",
        site_code, languages
    ));

    let document_name = xform_path
        .file_name()
        .ok_or_else(|| anyhow!("XForm path has no file name: {}", xform_path.display()))?;
    let media_dir = media_dir_for(xform_path)?;
    let mut media = media_selector::select(&media_dir, languages, reporter)?;

    let xml = fs::read(xform_path)
        .with_context(|| format!("Failed to read XForm: {}", xform_path.display()))?;
    let document_bytes = xform_processor::transform(&xml, languages, site_code, reporter)?;

    let mut document_path = PathBuf::from(document_name);
    if nested {
        let prefix: PathBuf = NEST_PREFIX.iter().collect();
        for job in &mut media {
            job.archive_path = prefix.join(&job.archive_path);
        }
        document_path = prefix.join(document_path);
    }

    let settings = match collect_settings {
        Some(settings_path) => {
            let base = settings_path.file_name().ok_or_else(|| {
                anyhow!("Settings path has no file name: {}", settings_path.display())
            })?;
            Some(MediaJob {
                source: settings_path.to_path_buf(),
                archive_path: Path::new(SETTINGS_PREFIX).join(base),
            })
        }
        None => None,
    };

    reporter.info("Finished preparing site.");

    Ok(ZipJob {
        site_code: site_code.to_string(),
        media,
        document: (document_path, document_bytes),
        settings,
    })
}

/// Media directory for a document, by the `{stem}-media` sibling convention.
fn media_dir_for(xform_path: &Path) -> Result<PathBuf> {
    let stem = xform_path
        .file_stem()
        .ok_or_else(|| anyhow!("XForm path has no file stem: {}", xform_path.display()))?;
    let parent = xform_path.parent().unwrap_or_else(|| Path::new(""));
    Ok(parent.join(format!("{}-media", stem.to_string_lossy())))
}
