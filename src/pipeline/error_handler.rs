use log::{info, warn};

use crate::RunSummary;
use crate::errors::{FetchError, SyncError};
use crate::utils::Colors;
use crate::utils::config::LIST_THRESHOLD;

/// Report a content fetch that produced no record. The campaign is dropped for this run and
/// will be retried next run, since its fingerprint was never cached.
pub fn report_fetch_failure(id: &str, err: FetchError) {
    match err {
        FetchError::Cancelled => {}
        source => warn!(
            "{}; dropped",
            SyncError::DetailFetchFailed {
                id: id.to_string(),
                source
            }
        ),
    }
}

/// One-line end-of-run tally.
pub fn log_summary(summary: &RunSummary, dry_run: bool) {
    let emitted = format!("{} emitted", summary.emitted);
    let skipped = format!("{} unchanged", summary.skipped);
    let dropped = format!("{} dropped", summary.dropped + summary.failed);
    if dry_run {
        info!(
            "{} listed: {} to fetch, {}, {}",
            summary.listed,
            summary.pending,
            Colors::colorize(Colors::SKIPPED, &skipped),
            Colors::colorize(Colors::DROPPED, &dropped),
        );
        return;
    }
    info!(
        "{} listed: {}, {}, {}",
        summary.listed,
        Colors::colorize(Colors::EMITTED, &emitted),
        Colors::colorize(Colors::SKIPPED, &skipped),
        Colors::colorize(Colors::DROPPED, &dropped),
    );
}

/// Dry-run listing of what would be fetched. Long lists collapse to a count.
pub fn log_pending_ids(ids: &[String]) {
    if ids.is_empty() {
        return;
    }
    if ids.len() > LIST_THRESHOLD {
        info!(
            "{} campaigns would be fetched (over {}, not listed)",
            ids.len(),
            LIST_THRESHOLD
        );
        return;
    }
    for id in ids {
        info!("  would fetch: {}", id);
    }
}
