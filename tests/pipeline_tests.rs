//! Pipeline tests against an in-process fake API: reconciliation, write-after-success, batching.

use chimpsync::engine::db_ops::{FingerprintStore, MemoryStore};
use chimpsync::engine::{CampaignApi, ListPage, ListRequest};
use chimpsync::errors::{ApiError, FetchError, StoreError, SyncError};
use chimpsync::pipeline::{
    BatchParams, JsonDirSink, MemorySink, SyncParams, run_batched, run_batched_with, run_sync,
};
use chimpsync::{CacheEntry, Fingerprint, ItemContent, RunSummary, SyncConfig};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const ROOT: &str = "https://fake.test/3.0";

struct FakeApi {
    campaigns: Vec<Value>,
    campaigns_url: String,
    fail_list: bool,
    fail_detail: HashSet<String>,
    list_calls: Mutex<Vec<(u32, u64)>>,
    detail_calls: Mutex<Vec<String>>,
    /// Raised by every list request, as a Ctrl-C arriving mid-listing would.
    cancel_on_list: Option<Arc<AtomicBool>>,
}

impl FakeApi {
    fn new(campaigns: Vec<Value>) -> Self {
        Self {
            campaigns,
            campaigns_url: format!("{ROOT}/campaigns"),
            fail_list: false,
            fail_detail: HashSet::new(),
            list_calls: Mutex::new(Vec::new()),
            detail_calls: Mutex::new(Vec::new()),
            cancel_on_list: None,
        }
    }

    fn list_calls(&self) -> Vec<(u32, u64)> {
        self.list_calls.lock().unwrap().clone()
    }

    fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.lock().unwrap().clone()
    }
}

impl CampaignApi for FakeApi {
    fn list_page(&self, req: &ListRequest<'_>) -> Result<ListPage, ApiError> {
        self.list_calls.lock().unwrap().push((req.count, req.offset));
        if let Some(flag) = &self.cancel_on_list {
            flag.store(true, Ordering::SeqCst);
        }
        if self.fail_list {
            return Err(ApiError::Status {
                url: self.campaigns_url.clone(),
                status: 503,
            });
        }
        let start = (req.offset as usize).min(self.campaigns.len());
        let end = (start + req.count as usize).min(self.campaigns.len());
        Ok(ListPage {
            items: Some(self.campaigns[start..end].to_vec()),
            total_items: self.campaigns.len() as u64,
        })
    }

    fn fetch_detail(&self, url: &str, _fields: &[String]) -> Result<ItemContent, ApiError> {
        self.detail_calls.lock().unwrap().push(url.to_string());
        let id = url
            .trim_end_matches("/content")
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        if self.fail_detail.contains(&id) {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: 500,
            });
        }
        let mut content = ItemContent::new();
        content.insert("html".to_string(), json!(format!("<p>{id}</p>")));
        Ok(content)
    }

    fn campaigns_url(&self) -> &str {
        &self.campaigns_url
    }
}

/// MemoryStore that counts writes and can fail reads.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    sets: usize,
    fail_get: bool,
}

impl FingerprintStore for CountingStore {
    fn get(&self, id: &str) -> Result<Option<Fingerprint>, StoreError> {
        if self.fail_get {
            return Err(StoreError::Io(std::io::Error::other("cache offline")));
        }
        self.inner.get(id)
    }

    fn set(&mut self, entry: &CacheEntry) -> Result<(), StoreError> {
        self.sets += 1;
        self.inner.set(entry)
    }
}

fn config(count: i64) -> SyncConfig {
    SyncConfig {
        root_url: ROOT.to_string(),
        key: "secret-us1".to_string(),
        count,
        page_size: 3,
        concurrency: 2,
        ..Default::default()
    }
}

fn campaigns(n: u32) -> Vec<Value> {
    (1..=n)
        .map(|i| json!({ "id": format!("c{i}"), "status": "sent", "settings": { "subject_line": format!("Issue {i}") } }))
        .collect()
}

fn run(
    config: &SyncConfig,
    api: &FakeApi,
    store: &mut CountingStore,
    sink: &mut MemorySink,
) -> Result<RunSummary, SyncError> {
    run_sync(config, api, store, sink, &SyncParams::default())
}

// --- run_sync ---

#[test]
fn test_invalid_root_url_makes_no_requests() {
    let api = FakeApi::new(campaigns(3));
    let mut store = CountingStore::default();
    let mut sink = MemorySink::new();
    let config = SyncConfig {
        root_url: "mailchimp.com/3.0".to_string(),
        ..config(3)
    };

    let res = run(&config, &api, &mut store, &mut sink);
    assert!(matches!(res, Err(SyncError::ConfigInvalid(_))));
    assert!(api.list_calls().is_empty());
    assert!(api.detail_calls().is_empty());
    assert!(sink.emitted.is_empty());
    assert!(!sink.finished);
}

#[test]
fn test_limit_within_page_size_is_one_request() {
    let api = FakeApi::new(campaigns(10));
    let mut store = CountingStore::default();
    let mut sink = MemorySink::new();

    let summary = run(&config(2), &api, &mut store, &mut sink).unwrap();
    assert_eq!(api.list_calls(), vec![(2, 0)]);
    assert_eq!(summary.listed, 2);
    assert_eq!(summary.emitted, 2);
    let ids: Vec<&str> = sink.emitted.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["mailchimp-campaign-c1", "mailchimp-campaign-c2"]);
    assert!(sink.finished);
}

#[test]
fn test_fetch_all_paginates_by_page_size() {
    let api = FakeApi::new(campaigns(7));
    let mut store = CountingStore::default();
    let mut sink = MemorySink::new();

    let summary = run(&config(0), &api, &mut store, &mut sink).unwrap();
    assert_eq!(api.list_calls(), vec![(3, 0), (3, 3), (3, 6)]);
    assert_eq!(summary.listed, 7);
    assert_eq!(summary.emitted, 7);
    assert_eq!(store.sets, 7);
    // Emit order follows list order regardless of wave completion order.
    let ids: Vec<String> = sink.emitted.iter().map(|r| r.campaign_id.clone()).collect();
    let expected: Vec<String> = (1..=7).map(|i| format!("c{i}")).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_second_run_is_idempotent() {
    let api = FakeApi::new(campaigns(5));
    let mut store = CountingStore::default();

    let mut first = MemorySink::new();
    run(&config(0), &api, &mut store, &mut first).unwrap();
    let detail_after_first = api.detail_calls().len();

    let mut second = MemorySink::new();
    let summary = run(&config(0), &api, &mut store, &mut second).unwrap();
    assert_eq!(summary.pending, 0);
    assert_eq!(summary.skipped, 5);
    assert!(second.emitted.is_empty());
    assert_eq!(second.touched.len(), 5);
    assert_eq!(api.detail_calls().len(), detail_after_first);
}

#[test]
fn test_unchanged_campaign_is_touched_only() {
    let api = FakeApi::new(vec![json!({ "id": 7, "settings": { "subject_line": "Hi" } })]);
    let mut store = CountingStore::default();
    run(&config(1), &api, &mut store, &mut MemorySink::new()).unwrap();
    assert_eq!(store.sets, 1);

    let detail_before = api.detail_calls().len();
    let mut sink = MemorySink::new();
    run(&config(1), &api, &mut store, &mut sink).unwrap();

    assert_eq!(sink.touched, vec!["mailchimp-campaign-7".to_string()]);
    assert!(sink.emitted.is_empty());
    assert_eq!(api.detail_calls().len(), detail_before);
    assert_eq!(store.sets, 1);
}

#[test]
fn test_changed_campaign_is_refetched() {
    let mut store = CountingStore::default();
    let api = FakeApi::new(vec![json!({ "id": "a", "status": "save" })]);
    run(&config(1), &api, &mut store, &mut MemorySink::new()).unwrap();

    let api = FakeApi::new(vec![json!({ "id": "a", "status": "sent" })]);
    let mut sink = MemorySink::new();
    let summary = run(&config(1), &api, &mut store, &mut sink).unwrap();
    assert_eq!(summary.emitted, 1);
    assert_eq!(sink.emitted[0].fields["status"], json!("sent"));
    assert_eq!(store.sets, 2);
}

#[test]
fn test_item_without_id_is_never_cached_or_emitted() {
    let api = FakeApi::new(vec![
        json!({ "id": "ok" }),
        json!({ "settings": { "subject_line": "Orphan" } }),
    ]);
    let mut store = CountingStore::default();
    let mut sink = MemorySink::new();

    let summary = run(&config(2), &api, &mut store, &mut sink).unwrap();
    assert_eq!(summary.dropped, 1);
    assert_eq!(summary.emitted, 1);
    assert_eq!(store.sets, 1);
    assert_eq!(store.inner.len(), 1);
    assert_eq!(api.detail_calls().len(), 1);
    assert_eq!(sink.emitted[0].campaign_id, "ok");
}

#[test]
fn test_detail_failure_drops_item_and_retries_next_run() {
    let mut api = FakeApi::new(campaigns(3));
    api.fail_detail.insert("c2".to_string());
    let mut store = CountingStore::default();
    let mut sink = MemorySink::new();

    let summary = run(&config(3), &api, &mut store, &mut sink).unwrap();
    assert_eq!(summary.emitted, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(store.inner.get("mailchimp-campaign-c2").unwrap(), None);

    api.fail_detail.clear();
    let mut sink = MemorySink::new();
    let summary = run(&config(3), &api, &mut store, &mut sink).unwrap();
    assert_eq!(summary.emitted, 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(sink.emitted[0].campaign_id, "c2");
}

#[test]
fn test_list_failure_is_fatal() {
    let mut api = FakeApi::new(campaigns(3));
    api.fail_list = true;
    let mut store = CountingStore::default();
    let mut sink = MemorySink::new();

    let res = run(&config(3), &api, &mut store, &mut sink);
    assert!(matches!(res, Err(SyncError::ListFetchFailed(_))));
    assert!(res.unwrap_err().is_fatal());
    assert!(sink.emitted.is_empty());
    assert_eq!(store.sets, 0);
}

#[test]
fn test_store_read_error_is_a_miss() {
    let api = FakeApi::new(campaigns(2));
    let mut store = CountingStore {
        fail_get: true,
        ..Default::default()
    };
    let mut sink = MemorySink::new();

    run(&config(2), &api, &mut store, &mut sink).unwrap();
    let summary = run(&config(2), &api, &mut store, &mut MemorySink::new()).unwrap();
    assert_eq!(summary.pending, 2);
    assert_eq!(summary.emitted, 2);
}

#[test]
fn test_dry_run_writes_nothing() {
    let api = FakeApi::new(campaigns(4));
    let mut store = CountingStore::default();
    let mut sink = MemorySink::new();
    let params = SyncParams {
        dry_run: true,
        ..Default::default()
    };

    let summary = run_sync(&config(4), &api, &mut store, &mut sink, &params).unwrap();
    assert_eq!(summary.pending, 4);
    assert_eq!(summary.emitted, 0);
    assert!(api.detail_calls().is_empty());
    assert!(sink.emitted.is_empty());
    assert!(sink.touched.is_empty());
    assert_eq!(store.sets, 0);
}

#[test]
fn test_cancel_before_listing_makes_no_requests() {
    let api = FakeApi::new(campaigns(4));
    let mut store = CountingStore::default();
    let mut sink = MemorySink::new();
    let params = SyncParams {
        cancel_check: Some(Arc::new(AtomicBool::new(true))),
        ..Default::default()
    };

    let res = run_sync(&config(4), &api, &mut store, &mut sink, &params);
    assert!(matches!(res, Err(SyncError::Cancelled { emitted: 0 })));
    assert!(api.list_calls().is_empty());
    assert!(api.detail_calls().is_empty());
    assert!(sink.touched.is_empty());
    assert_eq!(store.sets, 0);
    assert!(!sink.finished);
}

#[test]
fn test_cancel_while_paginating_stops_listing() {
    let cancel = Arc::new(AtomicBool::new(false));
    let mut api = FakeApi::new(campaigns(7));
    api.cancel_on_list = Some(Arc::clone(&cancel));
    let mut store = CountingStore::default();
    let mut sink = MemorySink::new();
    let params = SyncParams {
        cancel_check: Some(cancel),
        ..Default::default()
    };

    let res = run_sync(&config(0), &api, &mut store, &mut sink, &params);
    assert!(matches!(res, Err(SyncError::Cancelled { emitted: 0 })));
    assert_eq!(api.list_calls(), vec![(3, 0)]);
    assert!(api.detail_calls().is_empty());
    assert!(sink.touched.is_empty());
    assert!(sink.emitted.is_empty());
    assert_eq!(store.sets, 0);
}

#[test]
fn test_cancel_after_last_list_page_skips_reconcile() {
    let cancel = Arc::new(AtomicBool::new(false));
    let mut api = FakeApi::new(campaigns(2));
    api.cancel_on_list = Some(Arc::clone(&cancel));
    let mut store = CountingStore::default();
    // c1 is cached, so reconciling would touch it.
    run(&config(1), &FakeApi::new(campaigns(1)), &mut store, &mut MemorySink::new()).unwrap();
    let sets_before = store.sets;

    let mut sink = MemorySink::new();
    let params = SyncParams {
        cancel_check: Some(cancel),
        ..Default::default()
    };
    let res = run_sync(&config(2), &api, &mut store, &mut sink, &params);
    assert!(matches!(res, Err(SyncError::Cancelled { emitted: 0 })));
    assert_eq!(api.list_calls(), vec![(2, 0)]);
    assert!(api.detail_calls().is_empty());
    assert!(sink.touched.is_empty());
    assert_eq!(store.sets, sets_before);
    assert!(!sink.finished);
}

// --- JsonDirSink ---

#[test]
fn test_json_dir_sink_writes_records_and_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let api = FakeApi::new(campaigns(2));
    let mut store = MemoryStore::new();

    let mut sink = JsonDirSink::create(dir.path()).unwrap();
    run_sync(&config(2), &api, &mut store, &mut sink, &SyncParams::default()).unwrap();

    let path = dir.path().join("mailchimp-campaign-c1.json");
    let record: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(record["campaignId"], json!("c1"));
    assert_eq!(record["html"], json!("<p>c1</p>"));
    assert!(!dir.path().join("mailchimp-campaign-c1.json.tmp").exists());

    let manifest: Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["emitted"].as_array().unwrap().len(), 2);

    // Second run: both unchanged, so touched rather than rewritten.
    let mut sink = JsonDirSink::create(dir.path()).unwrap();
    let summary =
        run_sync(&config(2), &api, &mut store, &mut sink, &SyncParams::default()).unwrap();
    assert_eq!(summary.skipped, 2);
    let manifest: Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["touched"].as_array().unwrap().len(), 2);
    assert_eq!(manifest["emitted"].as_array().unwrap().len(), 0);
}

// --- batch scheduler ---

#[test]
fn test_batch_results_align_with_plan() {
    let plan = ["a", "b", "c", "d", "e"];
    // Earlier items sleep longer so completion order is reversed within each wave.
    let results = run_batched(&plan, 2, |item: &&str| {
        let delay = 5 * (5 - plan.iter().position(|p| p == item).unwrap_or(0) as u64);
        thread::sleep(Duration::from_millis(delay));
        Ok(item.to_uppercase())
    });
    let out: Vec<String> = results.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(out, vec!["A", "B", "C", "D", "E"]);
}

/// Wait until `target` calls are in flight at once, or give up after a second.
fn wait_for_in_flight(in_flight: &AtomicUsize, target: usize) {
    let deadline = Instant::now() + Duration::from_secs(1);
    while in_flight.load(Ordering::SeqCst) < target && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_batch_runs_full_wave_width_at_once() {
    let plan: Vec<u32> = (0..9).collect();
    let in_flight = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);
    let results = run_batched(&plan, 3, |i: &u32| {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        wait_for_in_flight(&in_flight, 3);
        thread::sleep(Duration::from_millis(5));
        in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(*i)
    });
    assert_eq!(results.len(), 9);
    assert_eq!(peak.load(Ordering::SeqCst), 3);
}

#[test]
fn test_batch_wave_starts_after_previous_wave_ends() {
    let plan: Vec<usize> = (0..5).collect();
    let spans: Mutex<Vec<Option<(Instant, Instant)>>> = Mutex::new(vec![None; plan.len()]);
    let results = run_batched(&plan, 2, |i: &usize| {
        let start = Instant::now();
        // Uneven durations so a wave's slow member would overlap the next wave if allowed.
        thread::sleep(Duration::from_millis(if i % 2 == 0 { 30 } else { 5 }));
        spans.lock().unwrap()[*i] = Some((start, Instant::now()));
        Ok(*i)
    });
    assert_eq!(results.len(), 5);

    let spans: Vec<(Instant, Instant)> = spans
        .into_inner()
        .unwrap()
        .into_iter()
        .map(|s| s.unwrap())
        .collect();
    let waves: Vec<&[(Instant, Instant)]> = spans.chunks(2).collect();
    for pair in waves.windows(2) {
        let prev_end = pair[0].iter().map(|(_, end)| *end).max().unwrap();
        let next_start = pair[1].iter().map(|(start, _)| *start).min().unwrap();
        assert!(next_start >= prev_end, "a wave started before the previous one finished");
    }
}

#[test]
fn test_batch_sequential_with_k_one() {
    let plan = [1, 2, 3];
    let seen = Mutex::new(Vec::new());
    let results = run_batched(&plan, 1, |i: &i32| {
        seen.lock().unwrap().push(*i);
        Ok(i * 10)
    });
    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    let out: Vec<i32> = results.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(out, vec![10, 20, 30]);
}

#[test]
fn test_batch_error_stays_at_its_position() {
    let plan = [1, 2, 3, 4];
    let results = run_batched(&plan, 2, |i: &i32| {
        if *i == 2 {
            Err(FetchError::Api(ApiError::Status {
                url: "https://fake.test/x".to_string(),
                status: 404,
            }))
        } else {
            Ok(*i)
        }
    });
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(FetchError::Api(_))));
    assert!(results[2].is_ok());
    assert!(results[3].is_ok());
}

#[test]
fn test_batch_empty_plan() {
    let plan: [u8; 0] = [];
    assert!(run_batched(&plan, 4, |_: &u8| Ok(())).is_empty());
}

#[test]
fn test_batch_cancel_stops_later_waves() {
    let plan = [1, 2, 3, 4, 5];
    let cancel = Arc::new(AtomicBool::new(false));
    let waves = Mutex::new(Vec::new());
    let on_wave = |n: usize| waves.lock().unwrap().push(n);
    let params = BatchParams {
        concurrency: 2,
        on_wave_progress: Some(&on_wave),
        cancel_check: Some(Arc::clone(&cancel)),
    };

    let results = run_batched_with(&plan, &params, |i: &i32| {
        cancel.store(true, Ordering::SeqCst);
        Ok(*i)
    });
    assert_eq!(results.len(), 5);
    assert!(results[0].is_ok() && results[1].is_ok());
    assert!(
        results[2..]
            .iter()
            .all(|r| matches!(r, Err(FetchError::Cancelled)))
    );
    assert_eq!(*waves.lock().unwrap(), vec![2]);
}
