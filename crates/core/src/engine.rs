//! Sync orchestration: resolve, scan, then classify and copy each entry
//!
//! Entries are processed in sorted order. With more than one job, batches of
//! entries run on a rayon pool of `jobs` workers. Results are collected in
//! entry order, so output matches a sequential run.

use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::classify::{SyncDecision, classify};
use crate::config::SyncOptions;
use crate::error::{Result, SyncError};
use crate::event::{Reporter, SyncEvent};
use crate::resolve::{DestinationStatus, SyncTask};
use crate::scan::{FileEntry, Scanner};
use crate::transfer::copy_entry;

/// Entries handed to the pool between cancellation checks, per worker
const BATCH_PER_WORKER: usize = 8;

/// A per-file failure recorded during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub name: String,
    pub reason: String,
}

/// Aggregate outcome of a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Entries whose destination was absent
    pub new: usize,
    /// Entries whose destination was stale
    pub updated: usize,
    /// Entries with identical content on both sides
    pub identical: usize,
    /// Entries kept because the destination was not older
    pub destination_newer: usize,
    /// Successful transfers
    pub copied: usize,
    /// Bytes written by successful transfers
    pub bytes_copied: u64,
    pub failures: Vec<FileFailure>,
    pub cancelled: bool,
    /// Regular files found when the capacity cap dropped some
    pub truncated_from: Option<usize>,
}

impl SyncReport {
    /// No per-file failures and not cancelled
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    /// Entries that were classified
    #[must_use]
    pub fn classified(&self) -> usize {
        self.new + self.updated + self.identical + self.destination_newer
    }

    fn count(&mut self, decision: SyncDecision) {
        match decision {
            SyncDecision::New => self.new += 1,
            SyncDecision::UpdateFromSource => self.updated += 1,
            SyncDecision::Identical => self.identical += 1,
            SyncDecision::DestinationNewer => self.destination_newer += 1,
        }
    }

    fn fail(&mut self, entry: &FileEntry, err: &SyncError) -> String {
        let reason = match err {
            SyncError::Stat { source, .. } | SyncError::Copy { source, .. } => source.to_string(),
            other => other.to_string(),
        };
        self.failures.push(FileFailure {
            name: entry.name.to_string_lossy().into_owned(),
            reason: reason.clone(),
        });
        reason
    }
}

/// Result of processing one entry
#[derive(Debug)]
enum EntryOutcome {
    Skipped(SyncDecision),
    Copied(SyncDecision, u64),
    CopyFailed(SyncDecision, SyncError),
    StatFailed(SyncError),
}

fn process_entry(entry: &FileEntry) -> EntryOutcome {
    let _span = info_span!("entry", name = ?entry.name).entered();

    let decision = match classify(entry) {
        Ok(decision) => decision,
        Err(e) => return EntryOutcome::StatFailed(e),
    };
    debug!(?decision, "classified");

    if !decision.needs_copy() {
        return EntryOutcome::Skipped(decision);
    }

    match copy_entry(entry) {
        Ok(bytes) => EntryOutcome::Copied(decision, bytes),
        Err(e) => EntryOutcome::CopyFailed(decision, e),
    }
}

/// One-way synchronizer from a source directory into a destination directory
#[derive(Debug, Clone, Default)]
pub struct Syncer {
    options: SyncOptions,
}

impl Syncer {
    #[must_use]
    pub fn new(options: SyncOptions) -> Self {
        Self { options }
    }

    /// Run a full synchronization from `source` into `dest`.
    ///
    /// Per-file failures are reported and collected in the returned
    /// [`SyncReport`]; they never stop the run.
    ///
    /// # Errors
    /// Returns the fatal errors: [`SyncError::SourceNotFound`],
    /// [`SyncError::DestinationInvalid`] and [`SyncError::Scan`]
    pub fn run(
        &self,
        source: &Path,
        dest: &Path,
        reporter: &mut dyn Reporter,
    ) -> Result<SyncReport> {
        let (task, status) = SyncTask::resolve(source, dest)?;
        if status == DestinationStatus::Created {
            reporter.report(&SyncEvent::DestinationCreated {
                path: dest.to_path_buf(),
            });
        }

        match std::env::current_dir() {
            Ok(path) => reporter.report(&SyncEvent::WorkingDirectory { path }),
            Err(e) => warn!("cannot determine current directory: {e}"),
        }
        reporter.report(&SyncEvent::Synchronizing {
            source: task.source_root().to_path_buf(),
            destination: task.dest_root().to_path_buf(),
        });

        let report = self.sync(&task, reporter)?;
        if !report.cancelled {
            reporter.report(&SyncEvent::Complete);
        }
        Ok(report)
    }

    /// Scan and synchronize an already resolved task.
    ///
    /// # Errors
    /// Returns [`SyncError::Scan`] if the source root cannot be listed and
    /// [`SyncError::WorkerPool`] if the workers cannot be started
    pub fn sync(&self, task: &SyncTask, reporter: &mut dyn Reporter) -> Result<SyncReport> {
        let pool = self.worker_pool()?;
        let batch_size = pool
            .as_ref()
            .map_or(1, |pool| pool.current_num_threads() * BATCH_PER_WORKER);

        let outcome = Scanner::new(task)
            .max_files(self.options.max_files)
            .scan()?;
        info!(
            "found {} files in {}",
            outcome.entries.len(),
            task.source_root().display()
        );

        let mut report = SyncReport {
            truncated_from: outcome.truncated_from,
            ..SyncReport::default()
        };
        if let Some(found) = outcome.truncated_from {
            reporter.report(&SyncEvent::ScanTruncated {
                found,
                kept: outcome.entries.len(),
            });
        }

        let mut processed = 0;
        for batch in outcome.entries.chunks(batch_size) {
            if self.options.is_cancelled() {
                info!(
                    "cancelled with {} entries left",
                    outcome.entries.len() - processed
                );
                report.cancelled = true;
                reporter.report(&SyncEvent::Cancelled);
                break;
            }

            for (entry, result) in batch.iter().zip(process_batch(pool.as_ref(), batch)) {
                record(entry, result, &mut report, reporter);
            }
            processed += batch.len();
        }

        info!(
            copied = report.copied,
            identical = report.identical,
            destination_newer = report.destination_newer,
            failed = report.failures.len(),
            "sync finished"
        );
        Ok(report)
    }

    /// A dedicated pool for `jobs > 1`; a single job runs on the caller's thread
    fn worker_pool(&self) -> Result<Option<rayon::ThreadPool>> {
        let jobs = self.options.jobs.get();
        if jobs == 1 {
            return Ok(None);
        }

        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .thread_name(|i| format!("filesync-worker-{i}"))
            .build()
            .map(Some)
            .map_err(|source| SyncError::WorkerPool { jobs, source })
    }
}

fn process_batch(pool: Option<&rayon::ThreadPool>, batch: &[FileEntry]) -> Vec<EntryOutcome> {
    match pool {
        // `collect` on an indexed parallel iterator keeps entry order
        Some(pool) => pool.install(|| batch.par_iter().map(process_entry).collect()),
        None => batch.iter().map(process_entry).collect(),
    }
}

fn record(
    entry: &FileEntry,
    outcome: EntryOutcome,
    report: &mut SyncReport,
    reporter: &mut dyn Reporter,
) {
    let decided = |decision| SyncEvent::Decided {
        name: entry.name.clone(),
        decision,
    };

    let failure = match outcome {
        EntryOutcome::Skipped(decision) => {
            report.count(decision);
            reporter.report(&decided(decision));
            None
        }
        EntryOutcome::Copied(decision, bytes) => {
            report.count(decision);
            report.copied += 1;
            report.bytes_copied += bytes;
            reporter.report(&decided(decision));
            reporter.report(&SyncEvent::Copied {
                source: entry.source_path.clone(),
                destination: entry.dest_path.clone(),
            });
            None
        }
        EntryOutcome::CopyFailed(decision, err) => {
            report.count(decision);
            reporter.report(&decided(decision));
            Some(err)
        }
        EntryOutcome::StatFailed(err) => Some(err),
    };

    if let Some(err) = failure {
        warn!("{err}");
        let reason = report.fail(entry, &err);
        reporter.report(&SyncEvent::Failed {
            name: entry.name.clone(),
            reason,
        });
    }
}
