use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::archive_writer::{self, ArchiveOutcome};
use crate::errors::EditionsError;
use crate::file_utils::FileManager;
use crate::reporting::Reporter;
use crate::site_job::{self, ZipJob};
use crate::site_registry::SiteRegistry;

// @module: Application controller for building language editions

/// Expected base name of the optional settings file
const COLLECT_SETTINGS_NAME: &str = "collect.settings";
/// Output directory name, always a sibling of the input document
const OUTPUT_DIR_NAME: &str = "editions";

/// Totals reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Sites listed in the registry
    pub sites_total: usize,
    /// Archives written (or merged into) this run
    pub archives_written: usize,
    /// Sites skipped because their job build or archive write failed
    pub sites_failed: usize,
    /// Archive members appended across all sites
    pub members_written: usize,
    /// Archive members skipped as duplicates across all sites
    pub members_skipped: usize,
    /// Warnings reported during the run
    pub warnings: usize,
}

/// Main application controller for the editions builder
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Injected reporting channel, shared with worker tasks
    reporter: Arc<dyn Reporter>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config, reporter: Arc<dyn Reporter>) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config, reporter })
    }

    /// Run the main workflow: registry load, per-site job builds, archive writes.
    ///
    /// Top-level input validation failures abort before any site is
    /// processed. Per-site failures are reported and do not stop the
    /// remaining sites.
    pub async fn run(
        &self,
        xform_path: PathBuf,
        sitelangs_path: PathBuf,
        nested: bool,
        collect_settings: Option<PathBuf>,
    ) -> Result<RunSummary> {
        self.validate_inputs(&xform_path, &sitelangs_path, collect_settings.as_deref())?;
        // The reporter is shared across runs; count only this run's warnings.
        let warnings_at_start = self.reporter.warnings();
        let xform_path = xform_path
            .canonicalize()
            .with_context(|| format!("Failed to resolve XForm path: {}", xform_path.display()))?;

        let registry = SiteRegistry::read(&sitelangs_path, &*self.reporter)?;
        let output_dir = xform_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(OUTPUT_DIR_NAME);
        let sites_total = registry.len();
        self.reporter.info(&format!(
            "Building {0} site edition(s) into {1}",
            sites_total,
            output_dir.display()
        ));

        let (jobs, build_failures) = self
            .build_jobs(&xform_path, &registry, nested, collect_settings.as_deref())
            .await;

        let progress = self.site_progress_bar(jobs.len());
        let (outcome, write_failures) = self.write_archives(&output_dir, jobs, &progress).await;
        if let Some(bar) = progress {
            bar.finish_and_clear();
        }

        let sites_failed = build_failures + write_failures;
        let summary = RunSummary {
            sites_total,
            archives_written: sites_total - sites_failed,
            sites_failed,
            members_written: outcome.written,
            members_skipped: outcome.skipped,
            warnings: self.reporter.warnings().saturating_sub(warnings_at_start),
        };
        self.reporter.info(&format!(
            "Finished: {0} archive(s) produced, {1} site(s) failed, {2} member(s) written, {3} duplicate(s) skipped, {4} warning(s).",
            summary.archives_written,
            summary.sites_failed,
            summary.members_written,
            summary.members_skipped,
            summary.warnings
        ));
        Ok(summary)
    }

    /// Validate the top-level inputs before any site work starts.
    fn validate_inputs(
        &self,
        xform_path: &Path,
        sitelangs_path: &Path,
        collect_settings: Option<&Path>,
    ) -> Result<(), EditionsError> {
        if !FileManager::extension_matches(xform_path, "xml") {
            return Err(EditionsError::input_format(
                "XForm",
                ".XML extension",
                &FileManager::describe_extension(xform_path),
            ));
        }
        if !FileManager::file_exists(xform_path) {
            return Err(EditionsError::input_format(
                "XForm",
                "an existing file",
                &format!("missing path '{}'", xform_path.display()),
            ));
        }
        if !FileManager::extension_matches(sitelangs_path, "xlsx") {
            return Err(EditionsError::input_format(
                "Site languages",
                ".XLSX extension",
                &FileManager::describe_extension(sitelangs_path),
            ));
        }
        if !FileManager::file_exists(sitelangs_path) {
            return Err(EditionsError::input_format(
                "Site languages",
                "an existing file",
                &format!("missing path '{}'", sitelangs_path.display()),
            ));
        }
        if let Some(settings_path) = collect_settings {
            let base = settings_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            if base != COLLECT_SETTINGS_NAME {
                return Err(EditionsError::input_format(
                    "Collect Settings",
                    "collect.settings file",
                    &base,
                ));
            }
            if !FileManager::file_exists(settings_path) {
                return Err(EditionsError::input_format(
                    "Collect Settings",
                    "an existing file",
                    &format!("missing path '{}'", settings_path.display()),
                ));
            }
        }
        Ok(())
    }

    /// Build one zip job per site on a bounded blocking pool.
    ///
    /// Job building is pure per site (fresh document parse, no shared
    /// mutable state), so sites run fully in parallel. Failed sites are
    /// reported and counted, never fatal.
    async fn build_jobs(
        &self,
        xform_path: &Path,
        registry: &SiteRegistry,
        nested: bool,
        collect_settings: Option<&Path>,
    ) -> (Vec<ZipJob>, usize) {
        let results: Vec<(String, Result<ZipJob>)> = stream::iter(registry.iter().cloned())
            .map(|entry| {
                let xform_path = xform_path.to_path_buf();
                let collect_settings = collect_settings.map(Path::to_path_buf);
                let reporter = Arc::clone(&self.reporter);
                async move {
                    let site_code = entry.site_code.clone();
                    let result = tokio::task::spawn_blocking(move || {
                        site_job::build_site_job(
                            &xform_path,
                            &entry.site_code,
                            &entry.languages,
                            nested,
                            collect_settings.as_deref(),
                            &*reporter,
                        )
                    })
                    .await
                    .unwrap_or_else(|e| Err(anyhow::anyhow!("Job build task panicked: {}", e)));
                    (site_code, result)
                }
            })
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        let mut jobs = Vec::with_capacity(results.len());
        let mut failures = 0usize;
        for (site_code, result) in results {
            match result {
                Ok(job) => jobs.push(job),
                Err(e) => {
                    self.reporter
                        .error(&format!("Site {}: {:#}", site_code, e));
                    failures += 1;
                }
            }
        }
        (jobs, failures)
    }

    /// Write archives, one task per site so each output file has exactly
    /// one active writer; distinct archives may be written concurrently.
    async fn write_archives(
        &self,
        output_dir: &Path,
        jobs: Vec<ZipJob>,
        progress: &Option<ProgressBar>,
    ) -> (ArchiveOutcome, usize) {
        self.reporter
            .info(&format!("Running {0} zip job(s).", jobs.len()));
        let results: Vec<(String, Result<ArchiveOutcome>)> = stream::iter(jobs)
            .map(|job| {
                let output_dir = output_dir.to_path_buf();
                let reporter = Arc::clone(&self.reporter);
                let bar = progress.clone();
                async move {
                    let site_code = job.site_code.clone();
                    let result = tokio::task::spawn_blocking(move || {
                        archive_writer::write_archive(&output_dir, &job, &*reporter)
                    })
                    .await
                    .unwrap_or_else(|e| Err(anyhow::anyhow!("Archive task panicked: {}", e)));
                    if let Some(bar) = bar {
                        bar.inc(1);
                    }
                    (site_code, result)
                }
            })
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        let mut total = ArchiveOutcome::default();
        let mut failures = 0usize;
        for (site_code, result) in results {
            match result {
                Ok(outcome) => {
                    total.written += outcome.written;
                    total.skipped += outcome.skipped;
                }
                Err(e) => {
                    self.reporter
                        .error(&format!("Site {}: {:#}", site_code, e));
                    failures += 1;
                }
            }
        }
        self.reporter.info("Zip jobs finished.");
        (total, failures)
    }

    /// Progress bar over sites, shown only when more than one site is configured.
    fn site_progress_bar(&self, sites: usize) -> Option<ProgressBar> {
        if sites <= 1 {
            return None;
        }
        let bar = ProgressBar::new(sites as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} sites ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message("Writing archives");
        Some(bar)
    }
}
