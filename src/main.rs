// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use xform_editions::app_config::{Config, LogLevel};
use xform_editions::app_controller::Controller;
use xform_editions::reporting::LogReporter;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// xform-editions - per-site language editions of an XForm
///
/// Splits one multi-language XForm (plus its media folder) into one zip
/// archive per deployment site, each containing only that site's languages
/// and a site-stamped record identifier.
#[derive(Parser, Debug)]
#[command(name = "xform-editions")]
#[command(version = "1.0.0")]
#[command(about = "Build per-site language editions of an XForm as mergeable zip archives")]
#[command(long_about = "xform-editions reads a site-languages registry and produces one zip archive
per site, containing the site's media files, the language-filtered XForm with
a site-stamped SID, and optionally a collect.settings file.

Archives land in an 'editions' directory next to the input XForm. Re-running
against existing archives skips already-present members, so editions built
from several forms merge into the same per-site archives.

EXAMPLES:
    xform-editions Q1309.xml site_languages.xlsx
    xform-editions --nested Q1309.xml site_languages.xlsx
    xform-editions --nested --collect-settings collect.settings Q1309.xml site_languages.xlsx
    xform-editions --log-level debug Q1309.xml site_languages.xlsx")]
struct CommandLineOptions {
    /// Path to the XForm XML file to split by language
    #[arg(value_name = "XFORM")]
    xform: PathBuf,

    /// Path to the XLSX file with sites and languages specified
    #[arg(value_name = "SITELANGS")]
    sitelangs: PathBuf,

    /// Nest output inside odk/forms/ so archives extract at the device storage root
    #[arg(long)]
    nested: bool,

    /// Path to a collect.settings file to include under odk/ in each archive
    #[arg(long)]
    collect_settings: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Maximum concurrent site builds (one writer per archive regardless)
    #[arg(long)]
    concurrency: Option<usize>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default.
    // The level is updated after the config is loaded if needed.
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    // Apply a command-line log level immediately so config loading logs obey it
    if let Some(cmd_log_level) = &cli.log_level {
        let level: LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.into());
    }

    // Load configuration if a config file is present, otherwise use defaults
    let mut config = if Path::new(&cli.config_path).exists() {
        let file = File::open(&cli.config_path)
            .context(format!("Failed to open config file: {}", cli.config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", cli.config_path))?
    } else {
        Config::default()
    };

    // Override config with CLI options if provided
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.clone().into());
    }

    let reporter = Arc::new(LogReporter::new());
    let controller = Controller::with_config(config, reporter)?;
    controller
        .run(cli.xform, cli.sitelangs, cli.nested, cli.collect_settings)
        .await?;
    Ok(())
}
