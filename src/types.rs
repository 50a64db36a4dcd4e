//! Public and internal types for the chimpsync API and pipeline.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

use crate::utils::config::{Defaults, OUTPUT_ID_PREFIX};

/// A campaign record exactly as the list endpoint returned it.
pub type RawItem = Value;

/// Secondary per-campaign payload (e.g. `{ "html": "..." }`).
pub type ItemContent = Map<String, Value>;

/// A listed campaign whose `id` is known to be present.
#[derive(Clone, Debug, PartialEq)]
pub struct Campaign {
    /// Remote id, normalised to a string (the API may send numbers).
    pub id: String,
    /// All metadata fields as listed, `id` included.
    pub fields: Map<String, Value>,
}

impl Campaign {
    /// Stable output id for this campaign: `mailchimp-campaign-<id>`.
    pub fn output_id(&self) -> String {
        output_id_for(&self.id)
    }

    /// Display name for diagnostics (`settings.subject_line`), if any.
    pub fn subject(&self) -> Option<&str> {
        subject_of(&self.fields)
    }
}

pub fn output_id_for(id: &str) -> String {
    format!("{OUTPUT_ID_PREFIX}{id}")
}

fn subject_of(fields: &Map<String, Value>) -> Option<&str> {
    fields.get("settings")?.get("subject_line")?.as_str()
}

/// Result of the ingestion parse step. Downstream code never re-checks for a missing id.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedItem {
    Valid(Campaign),
    Malformed(RawItem),
}

impl ParsedItem {
    /// Validate one listed record. Strings and numbers are accepted as ids; absent, null, empty
    /// or any other shape marks the record malformed.
    pub fn parse(raw: RawItem) -> Self {
        let id = match raw.get("id") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return ParsedItem::Malformed(raw),
        };
        match raw {
            Value::Object(fields) => ParsedItem::Valid(Campaign { id, fields }),
            other => ParsedItem::Malformed(other),
        }
    }

    /// Display name for diagnostics, for either variant.
    pub fn subject(&self) -> Option<&str> {
        match self {
            ParsedItem::Valid(c) => c.subject(),
            ParsedItem::Malformed(Value::Object(fields)) => subject_of(fields),
            ParsedItem::Malformed(_) => None,
        }
    }
}

/// Canonical serialization of a campaign's metadata, compared for change detection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a fingerprint read back from the store.
    pub fn from_stored(s: impl Into<String>) -> Self {
        Fingerprint(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted last-seen state of one campaign, keyed by output id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    pub id: String,
    pub fingerprint: Fingerprint,
}

/// One content fetch awaiting execution. Carries its metadata so results merge by position.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingFetch {
    pub campaign: Campaign,
    pub fingerprint: Fingerprint,
    pub content_url: String,
}

/// Ordered pending fetches; position `i` matches content result `i`.
pub type FetchPlan = Vec<PendingFetch>;

/// Reconciler decision for one listed record.
#[derive(Clone, Debug, PartialEq)]
pub enum Disposition {
    /// Malformed record: reported and discarded.
    Drop,
    /// Unchanged since the last run: touch `output_id`, do not re-emit.
    Skip { output_id: String },
    /// New or changed: fetch content, then emit and cache.
    Pending(PendingFetch),
}

/// Sink-facing metadata attached to every output record.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalMeta {
    #[serde(rename = "type")]
    pub node_type: String,
    pub media_type: String,
    /// Fingerprint text the record was built from.
    pub content: String,
    /// blake3 hex digest of `content`, for the sink's own change detection.
    pub content_digest: String,
}

/// Metadata merged with content, ready for the output sink.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub campaign_id: String,
    /// Output id (`mailchimp-campaign-<id>`), not the remote id.
    pub id: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub internal: InternalMeta,
}

/// Target number of campaigns for a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetCount {
    All,
    Limit(u32),
}

/// Per-run tallies. `listed = dropped + skipped + pending`; `pending = emitted + failed`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub listed: usize,
    pub dropped: usize,
    pub skipped: usize,
    pub pending: usize,
    pub emitted: usize,
    pub failed: usize,
}

/// Connection and selection options for a sync. Validated by
/// [`validate_config`](crate::engine::validate_config) before any request is made.
#[derive(Clone)]
pub struct SyncConfig {
    /// API root, e.g. `https://us1.api.mailchimp.com/3.0`.
    pub root_url: String,
    /// API key (password half of basic auth).
    pub key: String,
    /// Username half of basic auth.
    pub auth_username: String,
    /// Field selection for list requests (`campaigns.`-prefixed).
    pub campaign_fields: Vec<String>,
    /// Field selection for content requests.
    pub content_fields: Vec<String>,
    /// Type tag on output records.
    pub node_type: String,
    /// Target count; 0 fetches all.
    pub count: i64,
    /// Items per list request when fetching all.
    pub page_size: u32,
    /// Wave width for content fetches.
    pub concurrency: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Optional list filter (e.g. `sent`).
    pub status: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            root_url: String::new(),
            key: String::new(),
            auth_username: Defaults::AUTH_USERNAME.to_string(),
            campaign_fields: Defaults::campaign_fields(),
            content_fields: Defaults::content_fields(),
            node_type: Defaults::NODE_TYPE.to_string(),
            count: Defaults::COUNT,
            page_size: Defaults::PAGE_SIZE,
            concurrency: Defaults::CONCURRENCY,
            timeout_secs: Defaults::TIMEOUT_SECS,
            status: None,
        }
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("root_url", &self.root_url)
            .field("key", &"<redacted>")
            .field("auth_username", &self.auth_username)
            .field("campaign_fields", &self.campaign_fields)
            .field("content_fields", &self.content_fields)
            .field("node_type", &self.node_type)
            .field("count", &self.count)
            .field("page_size", &self.page_size)
            .field("concurrency", &self.concurrency)
            .field("timeout_secs", &self.timeout_secs)
            .field("status", &self.status)
            .finish()
    }
}

/// Local options for a CLI run (where results go, how loud to be).
#[derive(Clone, Debug)]
pub struct RunOpts {
    /// Fingerprint cache path. When None, uses `output_dir.join(<package cache filename>)` (e.g. `.chimpsync`).
    pub cache_path: Option<PathBuf>,
    /// Directory receiving one JSON file per campaign.
    pub output_dir: PathBuf,
    /// List and reconcile only; fetch no content and write nothing.
    pub dry_run: bool,
    /// Debug logging and progress bar.
    pub verbose: bool,
}

impl Default for RunOpts {
    fn default() -> Self {
        Self {
            cache_path: None,
            output_dir: PathBuf::from(Defaults::OUTPUT_DIR),
            dry_run: false,
            verbose: false,
        }
    }
}
