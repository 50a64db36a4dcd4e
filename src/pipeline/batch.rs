//! Batch scheduler: run content fetches in waves of at most `k` concurrent requests.
//!
//! Wave `w` covers plan positions `[w*k, (w+1)*k)` and starts only after wave `w-1` has fully
//! completed. Results come back in plan order, one per position; a failed fetch occupies its own
//! slot and never affects its neighbours.

use log::{debug, warn};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::FetchError;

/// Knobs for [`run_batched_with`].
pub struct BatchParams<'a> {
    /// Wave width (`k`). Zero is treated as one.
    pub concurrency: usize,
    /// Called with the wave length after each wave completes.
    pub on_wave_progress: Option<&'a (dyn Fn(usize) + Send + Sync)>,
    /// When set, waves not yet started resolve to [`FetchError::Cancelled`].
    pub cancel_check: Option<Arc<AtomicBool>>,
}

impl BatchParams<'_> {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency,
            on_wave_progress: None,
            cancel_check: None,
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel_check
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }
}

/// Run `fetch` over `plan` in waves of `k`. Output position `i` is the outcome for `plan[i]`.
pub fn run_batched<T, R, F>(plan: &[T], k: usize, fetch: F) -> Vec<Result<R, FetchError>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R, FetchError> + Sync,
{
    run_batched_with(plan, &BatchParams::new(k), fetch)
}

/// [`run_batched`] with progress reporting and cancellation.
pub fn run_batched_with<T, R, F>(
    plan: &[T],
    params: &BatchParams<'_>,
    fetch: F,
) -> Vec<Result<R, FetchError>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R, FetchError> + Sync,
{
    if plan.is_empty() {
        return Vec::new();
    }
    let k = params.concurrency.max(1);
    let pool = match ThreadPoolBuilder::new()
        .num_threads(k)
        .thread_name(|i| format!("content-fetch-{i}"))
        .build()
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            warn!("could not start {} fetch threads ({}); fetching sequentially", k, e);
            None
        }
    };

    let mut results = Vec::with_capacity(plan.len());
    for (w, wave) in plan.chunks(k).enumerate() {
        if params.cancelled() {
            debug!("wave {} not started: cancelled", w);
            results.extend(wave.iter().map(|_| Err(FetchError::Cancelled)));
            continue;
        }
        let outcomes: Vec<Result<R, FetchError>> = match &pool {
            Some(pool) => pool.install(|| wave.par_iter().map(&fetch).collect()),
            None => wave.iter().map(&fetch).collect(),
        };
        let failed = outcomes.iter().filter(|r| r.is_err()).count();
        debug!(
            "wave {}: {} fetched, {} failed",
            w,
            outcomes.len() - failed,
            failed
        );
        results.extend(outcomes);
        if let Some(cb) = params.on_wave_progress {
            cb(wave.len());
        }
    }
    results
}
