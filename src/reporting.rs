/*!
 * Injected reporting interface.
 *
 * Per-site and per-file conditions (missing SID, duplicate archive member,
 * unreadable media file) are not errors: they are reported through a
 * `Reporter` handed into each component, so tests can capture output
 * per-call without mutating global logger state.
 */

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{error, info, warn};

/// A single captured report entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// Severity label: "INFO", "WARN" or "ERROR"
    pub level: String,
    /// Message text
    pub message: String,
}

/// Reporting channel injected into each component.
///
/// Implementations must be shareable across the blocking worker tasks that
/// build site jobs and write archives.
pub trait Reporter: Send + Sync {
    /// Report an informational event
    fn info(&self, message: &str);

    /// Report a non-fatal warning (duplicate member, missing SID, skipped media file)
    fn warn(&self, message: &str);

    /// Report a per-site error that did not abort the run
    fn error(&self, message: &str);

    /// Number of warnings reported so far
    fn warnings(&self) -> usize;
}

/// Reporter that forwards to the `log` crate facade and counts warnings
#[derive(Debug, Default)]
pub struct LogReporter {
    warning_count: AtomicUsize,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for LogReporter {
    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn warn(&self, message: &str) {
        self.warning_count.fetch_add(1, Ordering::Relaxed);
        warn!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }

    fn warnings(&self) -> usize {
        self.warning_count.load(Ordering::Relaxed)
    }
}

/// Reporter that stores entries in memory for inspection in tests
#[derive(Debug, Default)]
pub struct CapturingReporter {
    entries: Mutex<Vec<ReportEntry>>,
}

impl CapturingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured entries
    pub fn entries(&self) -> Vec<ReportEntry> {
        self.entries.lock().expect("reporter lock poisoned").clone()
    }

    /// Captured messages at the given level
    pub fn messages_at(&self, level: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }

    fn push(&self, level: &str, message: &str) {
        self.entries
            .lock()
            .expect("reporter lock poisoned")
            .push(ReportEntry {
                level: level.to_string(),
                message: message.to_string(),
            });
    }
}

impl Reporter for CapturingReporter {
    fn info(&self, message: &str) {
        self.push("INFO", message);
    }

    fn warn(&self, message: &str) {
        self.push("WARN", message);
    }

    fn error(&self, message: &str) {
        self.push("ERROR", message);
    }

    fn warnings(&self) -> usize {
        self.entries()
            .iter()
            .filter(|e| e.level == "WARN")
            .count()
    }
}
