//! CLI command handler: build config from defaults, `.chimpsync.toml` and flags, then sync.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::arg_parser::Cli;
use crate::engine::client::HttpApi;
use crate::engine::db_ops::{FingerprintStore, MemoryStore, open_store_or_memory};
use crate::engine::validation::{validate_config, validate_settings};
use crate::pipeline::{JsonDirSink, MemorySink, SyncParams, run_sync};
use crate::utils::config::PackagePaths;
use crate::utils::{apply_file_to_config, get_api_key, load_settings_toml, setup_logging};
use crate::{RunOpts, SyncConfig};

/// Overwrite `config`/`run` with flags that were given on the command line.
pub fn apply_cli_to_config(cli: &Cli, config: &mut SyncConfig, run: &mut RunOpts) {
    if let Some(ref v) = cli.root_url {
        config.root_url = v.clone();
    }
    if let Some(ref v) = cli.username {
        config.auth_username = v.clone();
    }
    if let Some(ref v) = cli.campaign_fields {
        config.campaign_fields = v.clone();
    }
    if let Some(ref v) = cli.content_fields {
        config.content_fields = v.clone();
    }
    if let Some(ref v) = cli.node_type {
        config.node_type = v.clone();
    }
    if let Some(v) = cli.count {
        config.count = v;
    }
    if let Some(v) = cli.page_size {
        config.page_size = v;
    }
    if let Some(v) = cli.concurrency {
        config.concurrency = v;
    }
    if let Some(v) = cli.timeout {
        config.timeout_secs = v;
    }
    if let Some(ref v) = cli.status {
        config.status = Some(v.clone());
    }
    if let Some(ref p) = cli.cache {
        run.cache_path = Some(p.clone());
    }
    if let Some(ref p) = cli.out {
        run.output_dir = p.clone();
    }
    if let Some(v) = cli.verbose {
        run.verbose = v;
    }
    run.dry_run = cli.dry_run;
}

/// Defaults, then `.chimpsync.toml` in `dir`, then flags. The API key is resolved separately.
pub fn resolve_settings(cli: &Cli, dir: &Path) -> (SyncConfig, RunOpts) {
    let mut config = SyncConfig::default();
    let mut run = RunOpts::default();
    if let Some(file) = load_settings_toml(dir) {
        apply_file_to_config(&file, &mut config, &mut run);
    }
    apply_cli_to_config(cli, &mut config, &mut run);
    (config, run)
}

/// Cache file location: `--cache`, else `.chimpsync` in the output dir.
pub fn cache_path_for(run: &RunOpts) -> PathBuf {
    run.cache_path
        .clone()
        .unwrap_or_else(|| run.output_dir.join(PackagePaths::get().cache_filename()))
}

fn install_cancel_handler() -> Option<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    match ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
        eprintln!("Cancelling after the current request...");
    }) {
        Ok(()) => Some(flag),
        Err(e) => {
            warn!("Could not install Ctrl+C handler: {}", e);
            None
        }
    }
}

/// Run one sync from the command line.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("resolve current directory")?;
    let (mut config, run) = resolve_settings(cli, &cwd);
    setup_logging(run.verbose);

    // Report bad settings before prompting for a key.
    validate_settings(&config)?;
    config.key = get_api_key(&cwd)?;
    validate_config(&config)?;
    debug!("{} CONFIG: {:#?}", PackagePaths::get().pkg_name().to_uppercase(), config);

    let api = HttpApi::new(&config)?;
    let params = SyncParams {
        dry_run: run.dry_run,
        verbose: run.verbose,
        cancel_check: install_cancel_handler(),
    };

    if run.dry_run {
        warn!("RUNNING IN DRY-RUN MODE. NO CONTENT WILL BE FETCHED AND NOTHING WILL BE WRITTEN.");
        // Read-only: an existing cache is consulted, a missing one is not created.
        let cache_path = cache_path_for(&run);
        let mut store: Box<dyn FingerprintStore> = if cache_path.is_file() {
            open_store_or_memory(&cache_path)
        } else {
            Box::new(MemoryStore::new())
        };
        let mut sink = MemorySink::new();
        run_sync(&config, &api, &mut store, &mut sink, &params)?;
        return Ok(());
    }

    let mut sink = JsonDirSink::create(&run.output_dir)?;
    let mut store = open_store_or_memory(&cache_path_for(&run));
    run_sync(&config, &api, &mut store, &mut sink, &params)?;
    debug!("records in {}", sink.dir().display());
    Ok(())
}
