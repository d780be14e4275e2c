/*!
 * # xform-editions
 *
 * A Rust library for building per-site language editions of an XForm.
 *
 * ## Features
 *
 * - Parse a site -> languages registry from an XLSX workbook
 * - Prune XForm translations down to each site's languages, marking the
 *   first listed language as the default
 * - Stamp the form's SID with the site code so records are globally unique
 * - Select media files whose names encode a selected language
 * - Assemble one zip archive per site, with duplicate-member protection so
 *   archives can be merged and re-built incrementally
 * - Bounded parallelism across sites, with exactly one writer per archive
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `site_registry`: Site-languages registry parsing
 * - `xform_processor`: XForm language filtering and SID stamping
 * - `media_selector`: Language-suffix media selection
 * - `site_job`: Per-site build job assembly
 * - `archive_writer`: Zip writing with dedup/merge support
 * - `app_controller`: Main application controller
 * - `reporting`: Injected reporting interface
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod archive_writer;
pub mod errors;
pub mod file_utils;
pub mod media_selector;
pub mod reporting;
pub mod site_job;
pub mod site_registry;
pub mod xform_processor;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunSummary};
pub use archive_writer::ArchiveOutcome;
pub use errors::EditionsError;
pub use media_selector::MediaJob;
pub use reporting::{CapturingReporter, LogReporter, Reporter};
pub use site_job::ZipJob;
pub use site_registry::{SiteEntry, SiteRegistry};
