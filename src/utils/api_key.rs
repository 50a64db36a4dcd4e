//! API key loading: env var → .env in dir → secure prompt. The key is never read from the settings file.

use anyhow::{Context, Result};
use colored::Colorize;
use log::info;
use std::path::Path;

use crate::utils::config::PackagePaths;

fn non_empty_env(key: &str) -> Option<String> {
    let s = std::env::var(key).ok()?;
    let s = s.trim().to_string();
    (!s.is_empty()).then_some(s)
}

/// Look up the key in the environment, then in `dir/.env`. Does not prompt.
pub fn api_key_from_env(dir: &Path) -> Option<String> {
    let env_key = PackagePaths::get().api_key_env();
    if let Some(s) = non_empty_env(env_key) {
        return Some(s);
    }
    let env_path = dir.join(".env");
    if env_path.is_file() {
        let _ = dotenvy::from_path(&env_path);
        return non_empty_env(env_key);
    }
    None
}

/// Read the API key: env (`CHIMPSYNC_API_KEY`) → .env in `dir` → secure prompt.
pub fn get_api_key(dir: &Path) -> Result<String> {
    if let Some(s) = api_key_from_env(dir) {
        info!("API key found in environment");
        return Ok(s);
    }
    let label = format!("[{}]", env!("CARGO_PKG_NAME")).cyan().bold();
    let key = rpassword::prompt_password(format!("{} Mailchimp API key: ", label))
        .context("read API key")?;
    Ok(key.trim().to_string())
}
