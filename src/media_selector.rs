/*!
 * Media selection for site editions.
 *
 * Media file names encode their language as a suffix of the stem, e.g.
 * `q1_english.png`. Selection keeps every file under the media directory
 * whose stem ends with one of the site's languages; everything else is
 * excluded silently. Archive paths are kept relative to the media
 * directory's parent so the `{form}-media/` folder name survives inside
 * the zip.
 */

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::file_utils::FileManager;
use crate::reporting::Reporter;

/// One selected media file: where it lives and where it goes in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaJob {
    /// Absolute path of the source file
    pub source: PathBuf,
    /// Path of the member inside the archive
    pub archive_path: PathBuf,
}

/// Select media files matching any of the site's languages.
///
/// A missing media directory is not an error: it yields an empty selection
/// and a warning, since a form may legitimately ship without media.
pub fn select<P: AsRef<Path>>(
    media_dir: P,
    languages: &[String],
    reporter: &dyn Reporter,
) -> Result<Vec<MediaJob>> {
    let media_dir = media_dir.as_ref();
    if !FileManager::dir_exists(media_dir) {
        reporter.warn(&format!(
            "Media directory not found, no media will be included: {}",
            media_dir.display()
        ));
        return Ok(Vec::new());
    }
    let archive_root = media_dir.parent().unwrap_or(media_dir);

    let mut jobs = Vec::new();
    for entry in WalkDir::new(media_dir).follow_links(true) {
        let entry = entry.context("Failed to read media directory entry")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if !stem_matches_language(path, languages) {
            continue;
        }
        let archive_path = path
            .strip_prefix(archive_root)
            .with_context(|| format!("Media path escaped the media root: {}", path.display()))?
            .to_path_buf();
        jobs.push(MediaJob {
            source: path.to_path_buf(),
            archive_path,
        });
    }
    Ok(jobs)
}

/// True when the file's stem (name minus extension) ends with any of the
/// given language tokens.
fn stem_matches_language(path: &Path, languages: &[String]) -> bool {
    let stem = match path.file_stem() {
        Some(stem) => stem.to_string_lossy(),
        None => return false,
    };
    languages.iter().any(|lang| stem.ends_with(lang.as_str()))
}
