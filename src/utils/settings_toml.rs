//! Load `.chimpsync.toml` from a directory (CLI only). Lib callers build [`SyncConfig`] themselves.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::utils::config::PackagePaths;
use crate::{RunOpts, SyncConfig};

#[derive(Debug, Default, Deserialize)]
pub struct SettingsToml {
    #[serde(default)]
    settings: SettingsSection,
}

/// Every option except the API key, which only comes from env/.env/prompt.
#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    root_url: Option<String>,
    auth_username: Option<String>,
    campaign_fields: Option<Vec<String>>,
    content_fields: Option<Vec<String>>,
    node_type: Option<String>,
    count: Option<i64>,
    page_size: Option<u32>,
    concurrency: Option<usize>,
    timeout: Option<u64>,
    status: Option<String>,
    cache_path: Option<String>,
    output_dir: Option<String>,
    verbose: Option<bool>,
}

/// Parse settings text. Unknown keys are ignored.
pub fn parse_settings_toml(s: &str) -> Result<SettingsToml, toml::de::Error> {
    toml::from_str(s)
}

/// Load `.chimpsync.toml` from `dir` if present. Returns None if file missing or unreadable.
pub fn load_settings_toml(dir: &Path) -> Option<SettingsToml> {
    let path = dir.join(PackagePaths::get().settings_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_settings_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

/// Overwrite a field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $target:expr, $file_field:ident => $target_field:ident) => {
        if let Some(ref v) = $section.$file_field {
            $target.$target_field = v.clone();
        }
    };
}

/// Apply file settings (only fields present in the file). Call before applying CLI flags.
pub fn apply_file_to_config(file: &SettingsToml, config: &mut SyncConfig, run: &mut RunOpts) {
    let s = &file.settings;
    apply_file_opt!(s, config, root_url => root_url);
    apply_file_opt!(s, config, auth_username => auth_username);
    apply_file_opt!(s, config, campaign_fields => campaign_fields);
    apply_file_opt!(s, config, content_fields => content_fields);
    apply_file_opt!(s, config, node_type => node_type);
    apply_file_opt!(s, config, count => count);
    apply_file_opt!(s, config, page_size => page_size);
    apply_file_opt!(s, config, concurrency => concurrency);
    apply_file_opt!(s, config, timeout => timeout_secs);
    if let Some(ref status) = s.status {
        config.status = Some(status.clone());
    }
    if let Some(ref p) = s.cache_path {
        run.cache_path = Some(PathBuf::from(p));
    }
    if let Some(ref p) = s.output_dir {
        run.output_dir = PathBuf::from(p);
    }
    apply_file_opt!(s, run, verbose => verbose);
}
