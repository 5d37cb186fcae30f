//! Retention sweep over the output directory
//!
//! Keeps the newest `keep` files by creation time and deletes the rest.
//! Sweeps may run concurrently with each other and with generation; a file
//! that disappears between listing and deletion is not an error.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::SystemTime;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Number of generated files kept by default (DOCX and PDF count separately)
pub const DEFAULT_RETAIN: usize = 40;

#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    dir: PathBuf,
    keep: usize,
}

/// What a sweep did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Regular files found in the directory
    pub scanned: usize,
    pub removed: Vec<PathBuf>,
    /// Deletions that failed for reasons other than the file being gone
    pub failed: usize,
}

impl RetentionSweeper {
    pub fn new(dir: impl Into<PathBuf>, keep: usize) -> Self {
        Self {
            dir: dir.into(),
            keep,
        }
    }

    pub fn keep(&self) -> usize {
        self.keep
    }

    /// Run one sweep on the current thread.
    ///
    /// Never fails: listing and deletion errors are logged and counted.
    pub fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), "Cleanup failed: {}", e);
                return report;
            }
        };

        let mut files: Vec<(SystemTime, PathBuf)> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() {
                    return None;
                }
                // birth time is not available on every platform/filesystem
                let stamp = metadata.created().or_else(|_| metadata.modified()).ok()?;
                Some((stamp, entry.path()))
            })
            .collect();
        report.scanned = files.len();

        // newest first
        files.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, path) in files.into_iter().skip(self.keep) {
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(file = %path.display(), "Removed old generated file");
                    report.removed.push(path);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(file = %path.display(), "Already removed");
                }
                Err(e) => {
                    warn!(file = %path.display(), "Cleanup failed: {}", e);
                    report.failed += 1;
                }
            }
        }

        if !report.removed.is_empty() {
            info!(
                removed = report.removed.len(),
                kept = self.keep,
                "Retention sweep finished"
            );
        }
        report
    }

    /// Dispatch a sweep onto the blocking pool without waiting for it.
    ///
    /// The handle may be dropped; the sweep still runs to completion.
    pub fn spawn(&self) -> JoinHandle<SweepReport> {
        let sweeper = self.clone();
        tokio::task::spawn_blocking(move || sweeper.sweep())
    }
}
