use log::{debug, warn};
use std::time::Instant;

use crate::engine::client::{CampaignApi, ListRequest};
use crate::engine::db_ops::FingerprintStore;
use crate::engine::progress::{content_progress, progress_callback};
use crate::errors::{FetchError, SyncError};
use crate::pipeline::batch::{BatchParams, run_batched_with};
use crate::pipeline::context::{RunTuning, SyncParams};
use crate::pipeline::error_handler::{log_pending_ids, log_summary, report_fetch_failure};
use crate::pipeline::merge::merge_record;
use crate::pipeline::paginator::paginate;
use crate::pipeline::reconcile::classify;
use crate::pipeline::sink::OutputSink;
use crate::utils::config::CONTENT_PROGRESS_DESC;
use crate::{CacheEntry, Disposition, FetchPlan, ParsedItem, RawItem, RunSummary, SyncConfig};

/// Fetch the campaign list for `tuning.target`: one request, plus further pages when fetching all.
///
/// `params` is checked before every request; once cancelled, listing stops with
/// [`SyncError::Cancelled`].
pub fn list_campaigns<A>(
    api: &A,
    config: &SyncConfig,
    tuning: &RunTuning,
    params: &SyncParams,
) -> Result<Vec<RawItem>, SyncError>
where
    A: CampaignApi + ?Sized,
{
    let fetch_page = |count: u32, offset: u64| {
        if params.is_cancelled() {
            return Err(SyncError::Cancelled { emitted: 0 });
        }
        api.list_page(&ListRequest {
            fields: &config.campaign_fields,
            count,
            offset,
        })
        .map_err(SyncError::ListFetchFailed)
    };

    let first = fetch_page(tuning.first_page_count, 0)?;
    paginate(first, tuning.target, tuning.page_size, |offset| {
        fetch_page(tuning.page_size, offset)
    })
}

/// Classify every listed record in order. Unchanged records are touched right away (unless
/// `dry_run`); new or changed ones are returned as the fetch plan.
fn reconcile_all<S, O>(
    items: Vec<RawItem>,
    campaigns_url: &str,
    store: &S,
    sink: &mut O,
    dry_run: bool,
    summary: &mut RunSummary,
) -> Result<FetchPlan, SyncError>
where
    S: FingerprintStore + ?Sized,
    O: OutputSink + ?Sized,
{
    let mut plan = FetchPlan::with_capacity(items.len());
    for raw in items {
        match classify(ParsedItem::parse(raw), campaigns_url, |id| store.get(id)) {
            Disposition::Drop => summary.dropped += 1,
            Disposition::Skip { output_id } => {
                if !dry_run {
                    sink.touch(&output_id).map_err(SyncError::Sink)?;
                }
                summary.skipped += 1;
            }
            Disposition::Pending(pending) => plan.push(pending),
        }
    }
    summary.pending = plan.len();
    Ok(plan)
}

/// Run one sync: validate, list, reconcile, fetch content in waves, emit and cache.
///
/// A campaign's fingerprint is written only after its record was emitted, so a failed or
/// cancelled fetch is retried on the next run. Returns the run's tallies.
///
/// # Errors
///
/// [`SyncError::ConfigInvalid`] before any request; [`SyncError::ListFetchFailed`] if a list
/// page fails; [`SyncError::Sink`] if the sink rejects a write; [`SyncError::Cancelled`] when
/// `params.cancel_check` was raised. Cancelling while listing stops before anything is touched or
/// emitted; cancelling during the content phase keeps the records emitted so far.
pub fn run_sync<A, S, O>(
    config: &SyncConfig,
    api: &A,
    store: &mut S,
    sink: &mut O,
    params: &SyncParams,
) -> Result<RunSummary, SyncError>
where
    A: CampaignApi + ?Sized,
    S: FingerprintStore + ?Sized,
    O: OutputSink + ?Sized,
{
    let tuning = RunTuning::from_config(config)?;
    debug!("Run tuning: {:?}", tuning);

    let start = Instant::now();
    let items = list_campaigns(api, config, &tuning, params)?;
    debug!("listed {} campaigns in {:?}", items.len(), start.elapsed());
    if params.is_cancelled() {
        return Err(SyncError::Cancelled { emitted: 0 });
    }

    let mut summary = RunSummary {
        listed: items.len(),
        ..RunSummary::default()
    };
    let plan = reconcile_all(
        items,
        api.campaigns_url(),
        &*store,
        sink,
        params.dry_run,
        &mut summary,
    )?;

    if params.dry_run {
        let ids: Vec<String> = plan.iter().map(|p| p.campaign.output_id()).collect();
        log_pending_ids(&ids);
        log_summary(&summary, true);
        return Ok(summary);
    }

    let start = Instant::now();
    let bar = content_progress(params.verbose, plan.len(), CONTENT_PROGRESS_DESC);
    let on_wave = progress_callback(&bar);
    let batch = BatchParams {
        concurrency: tuning.concurrency,
        on_wave_progress: on_wave.as_deref(),
        cancel_check: params.cancel_check.clone(),
    };
    let results = run_batched_with(&plan, &batch, |pending| {
        api.fetch_detail(&pending.content_url, &config.content_fields)
            .map_err(FetchError::from)
    });
    drop(bar);
    debug!("content fetched in {:?}", start.elapsed());

    let mut cancelled = 0usize;
    for (pending, result) in plan.iter().zip(results) {
        match result {
            Ok(content) => {
                let record = merge_record(pending, content, &config.node_type);
                let output_id = record.id.clone();
                sink.emit(record).map_err(SyncError::Sink)?;
                summary.emitted += 1;
                let entry = CacheEntry {
                    id: output_id,
                    fingerprint: pending.fingerprint.clone(),
                };
                if let Err(e) = store.set(&entry) {
                    warn!(
                        "{} (caching {}); it will be fetched again next run",
                        SyncError::CacheUnavailable(e),
                        entry.id
                    );
                }
            }
            Err(FetchError::Cancelled) => {
                cancelled += 1;
                summary.failed += 1;
            }
            Err(e) => {
                report_fetch_failure(&pending.campaign.id, e);
                summary.failed += 1;
            }
        }
    }

    if let Err(e) = store.flush() {
        warn!("{}", SyncError::CacheUnavailable(e));
    }
    sink.finish().map_err(SyncError::Sink)?;
    log_summary(&summary, false);

    if cancelled > 0 {
        return Err(SyncError::Cancelled {
            emitted: summary.emitted,
        });
    }
    Ok(summary)
}
