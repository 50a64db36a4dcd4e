//! chimpsync: incremental Mailchimp campaign sync with content-aware change detection

pub mod engine;
pub mod errors;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

use log::debug;

use crate::engine::client::HttpApi;
use crate::engine::db_ops::FingerprintStore;
use crate::errors::SyncError;
use crate::pipeline::{OutputSink, SyncParams};

/// Result alias used by the public chimpsync API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: sync the campaigns selected by `config` into `sink`, using `store` to skip
/// campaigns whose metadata has not changed since the last run.
///
/// Builds an HTTP client from `config` and runs [`pipeline::run_sync`]. Bring your own
/// [`CampaignApi`](engine::CampaignApi) and call `run_sync` directly to talk to something else.
///
/// ```ignore
/// let config = chimpsync::SyncConfig {
///     root_url: "https://us1.api.mailchimp.com/3.0".into(),
///     key: key_from_somewhere,
///     ..Default::default()
/// };
/// let mut store = chimpsync::engine::MemoryStore::new();
/// let mut sink = chimpsync::pipeline::MemorySink::new();
/// let summary = chimpsync::sync_campaigns(&config, &mut store, &mut sink, &Default::default())?;
/// ```
pub fn sync_campaigns<S, O>(
    config: &SyncConfig,
    store: &mut S,
    sink: &mut O,
    params: &SyncParams,
) -> std::result::Result<RunSummary, SyncError>
where
    S: FingerprintStore + ?Sized,
    O: OutputSink + ?Sized,
{
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        config
    );
    engine::validate_config(config)?;
    let api = HttpApi::new(config).map_err(|e| SyncError::ConfigInvalid(format!("{e:#}")))?;
    pipeline::run_sync(config, &api, store, sink, params)
}
