//! Run options for the sync engine

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::scan::DEFAULT_MAX_FILES;

/// Options controlling a synchronization run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Upper bound on tracked files; `None` disables the cap
    pub max_files: Option<usize>,
    /// Entries classified and copied at the same time
    pub jobs: NonZeroUsize,
    /// Checked between entries or parallel batches; set it to stop the run early
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_files: Some(DEFAULT_MAX_FILES),
            jobs: NonZeroUsize::MIN,
            cancel: None,
        }
    }
}

impl SyncOptions {
    /// Set the file cap; `0` means unlimited
    #[must_use]
    pub fn max_files(mut self, max_files: usize) -> Self {
        self.max_files = (max_files > 0).then_some(max_files);
        self
    }

    /// Set the number of concurrent workers
    #[must_use]
    pub fn jobs(mut self, jobs: NonZeroUsize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Attach a cancellation flag
    #[must_use]
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Whether the attached flag has been raised
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
