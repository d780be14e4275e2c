/*!
 * Per-site archive writing with duplicate-member protection.
 *
 * Each site's output is a single `{site_code}.zip`. Archives grow
 * monotonically: an existing archive is opened in append mode and a
 * normalized-path set of its members is built first, so re-running the same
 * job produces skip warnings instead of duplicate members, and distinct
 * documents built into the same output directory merge their non-colliding
 * members into one archive per site.
 *
 * Compression happens in-process through the zip crate; the dedup/merge
 * contract is independent of the backend.
 */

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::EditionsError;
use crate::file_utils::FileManager;
use crate::reporting::Reporter;
use crate::site_job::ZipJob;

/// Counts of members written and skipped for one archive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveOutcome {
    /// Members appended during this run
    pub written: usize,
    /// Members skipped because their path was already present
    pub skipped: usize,
}

/// Write one site's job into `{output_dir}/{site_code}.zip`.
///
/// Duplicate members and unreadable media files are reported and skipped;
/// only container-level failures (cannot open, create or append to the
/// archive) are returned as errors.
pub fn write_archive(
    output_dir: &Path,
    job: &ZipJob,
    reporter: &dyn Reporter,
) -> Result<ArchiveOutcome> {
    FileManager::ensure_dir(output_dir)?;
    let zip_path = output_dir.join(format!("{}.zip", job.site_code));

    let mut existing = HashSet::new();
    let mut writer = if FileManager::file_exists(&zip_path) {
        existing = read_member_paths(&zip_path)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&zip_path)
            .with_context(|| format!("Failed to open archive for append: {}", zip_path.display()))?;
        ZipWriter::new_append(file)
            .map_err(EditionsError::from)
            .with_context(|| format!("Failed to append to archive: {}", zip_path.display()))?
    } else {
        let file = File::create(&zip_path)
            .with_context(|| format!("Failed to create archive: {}", zip_path.display()))?;
        ZipWriter::new(file)
    };
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut outcome = ArchiveOutcome::default();
    for media in &job.media {
        let target = normalize_archive_path(&media.archive_path);
        if !existing.insert(target.clone()) {
            reporter.warn(&format!("Skipped duplicating file: {}", target));
            outcome.skipped += 1;
            continue;
        }
        let bytes = match std::fs::read(&media.source) {
            Ok(bytes) => bytes,
            Err(e) => {
                reporter.warn(&format!(
                    "Skipped unreadable media file {}: {}",
                    media.source.display(),
                    e
                ));
                existing.remove(&target);
                continue;
            }
        };
        writer.start_file(target, options).map_err(EditionsError::from)?;
        writer.write_all(&bytes)?;
        outcome.written += 1;
    }

    let (document_path, document_bytes) = &job.document;
    let target = normalize_archive_path(document_path);
    if !existing.insert(target.clone()) {
        reporter.warn(&format!("Skipped duplicating file: {}", target));
        outcome.skipped += 1;
    } else {
        writer.start_file(target, options).map_err(EditionsError::from)?;
        writer.write_all(document_bytes)?;
        outcome.written += 1;
    }

    if let Some(settings) = &job.settings {
        let target = normalize_archive_path(&settings.archive_path);
        if !existing.insert(target.clone()) {
            reporter.warn(&format!("Skipped duplicating file: {}", target));
            outcome.skipped += 1;
        } else {
            match std::fs::read(&settings.source) {
                Ok(bytes) => {
                    writer.start_file(target, options).map_err(EditionsError::from)?;
                    writer.write_all(&bytes)?;
                    outcome.written += 1;
                }
                Err(e) => {
                    reporter.warn(&format!(
                        "Skipped unreadable settings file {}: {}",
                        settings.source.display(),
                        e
                    ));
                }
            }
        }
    }

    writer
        .finish()
        .map_err(EditionsError::from)
        .with_context(|| format!("Failed to finish archive: {}", zip_path.display()))?;
    Ok(outcome)
}

/// Drive a batch of jobs sequentially against one output directory.
///
/// Site-level failures are reported and do not stop the remaining sites.
/// Returns the aggregate outcome and the number of failed sites.
pub fn run(
    output_dir: &Path,
    jobs: &[ZipJob],
    reporter: &dyn Reporter,
) -> (ArchiveOutcome, usize) {
    let mut total = ArchiveOutcome::default();
    let mut failures = 0usize;
    for job in jobs {
        match write_archive(output_dir, job, reporter) {
            Ok(outcome) => {
                total.written += outcome.written;
                total.skipped += outcome.skipped;
            }
            Err(e) => {
                reporter.error(&format!("Site {}: {:#}", job.site_code, e));
                failures += 1;
            }
        }
    }
    (total, failures)
}

/// Member-path set of an existing archive, normalized for dedup checks.
fn read_member_paths(zip_path: &Path) -> Result<HashSet<String>> {
    let file = File::open(zip_path)
        .with_context(|| format!("Failed to open existing archive: {}", zip_path.display()))?;
    let archive = ZipArchive::new(file)
        .map_err(EditionsError::from)
        .with_context(|| format!("Failed to read existing archive: {}", zip_path.display()))?;
    Ok(archive.file_names().map(normalize_archive_path).collect())
}

/// Normalize an archive member path: forward slashes only, no empty or `.`
/// segments, `..` resolved against preceding segments.
pub fn normalize_archive_path<P: AsRef<Path>>(path: P) -> String {
    let raw = path.as_ref().to_string_lossy();
    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
