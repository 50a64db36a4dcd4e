//! Run context: per-run settings derived from a validated config.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::validation::validate_config;
use crate::errors::SyncError;
use crate::pipeline::paginator::first_page_count;
use crate::utils::cap_concurrency;
use crate::{SyncConfig, TargetCount};

/// Caller-side switches for [`run_sync`](crate::pipeline::run_sync).
#[derive(Clone, Debug, Default)]
pub struct SyncParams {
    /// List and reconcile only: no content fetch, no emit, no touch, no cache write.
    pub dry_run: bool,
    /// Show a progress bar over content waves.
    pub verbose: bool,
    /// Set (e.g. from a Ctrl+C handler) to stop before the next content wave.
    pub cancel_check: Option<Arc<AtomicBool>>,
}

impl SyncParams {
    /// True once the cancel flag has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_check
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }
}

/// Tuning derived from the config: target, first request size, effective wave width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunTuning {
    pub target: TargetCount,
    pub first_page_count: u32,
    pub page_size: u32,
    /// Configured concurrency capped by the FD limit.
    pub concurrency: usize,
}

impl RunTuning {
    /// Validate `config` and derive the run's tuning. No request is made.
    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        let target = validate_config(config)?;
        Ok(Self {
            target,
            first_page_count: first_page_count(target, config.page_size),
            page_size: config.page_size,
            concurrency: cap_concurrency(config.concurrency),
        })
    }
}
