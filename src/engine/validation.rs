//! Eager validation of a [`SyncConfig`]. Runs before any request; collects every problem at once.

use reqwest::Url;

use crate::errors::SyncError;
use crate::utils::config::ApiConsts;
use crate::{SyncConfig, TargetCount};

fn validate_root_url(root_url: &str, errors: &mut Vec<String>) {
    let lower = root_url.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        errors.push(format!(
            "root_url must be an absolute http(s) URL, got '{root_url}'"
        ));
        return;
    }
    match Url::parse(root_url) {
        Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => {}
        Ok(_) => errors.push(format!("root_url '{root_url}' has no host")),
        Err(e) => errors.push(format!("root_url '{root_url}' is not a valid URL: {e}")),
    }
}

fn validate_fields(fields: &[String], name: &str, errors: &mut Vec<String>) {
    for (i, f) in fields.iter().enumerate() {
        if f.trim().is_empty() {
            errors.push(format!("{name}[{i}] is empty"));
        } else if f.contains(',') {
            errors.push(format!("{name}[{i}] '{f}' must not contain ','"));
        }
    }
}

/// Resolve the configured count: `0` fetches all, a positive value is a limit.
pub fn resolve_target(count: i64) -> Result<TargetCount, String> {
    if count == ApiConsts::FETCH_ALL {
        return Ok(TargetCount::All);
    }
    if count < 1 {
        return Err(format!(
            "count must be >= 1, or {} to fetch all (got {count})",
            ApiConsts::FETCH_ALL
        ));
    }
    u32::try_from(count)
        .map(TargetCount::Limit)
        .map_err(|_| format!("count {count} is too large"))
}

fn check_settings(config: &SyncConfig, errors: &mut Vec<String>) -> Option<TargetCount> {
    validate_root_url(&config.root_url, errors);

    if config.auth_username.is_empty() || config.auth_username.chars().any(char::is_whitespace) {
        errors.push("auth_username must be a non-empty string without whitespace".to_string());
    }

    validate_fields(&config.campaign_fields, "campaign_fields", errors);
    validate_fields(&config.content_fields, "content_fields", errors);

    if config.node_type.trim().is_empty() {
        errors.push("node_type must not be empty".to_string());
    }

    let target = resolve_target(config.count).map_err(|e| errors.push(e)).ok();

    if config.page_size == 0 || config.page_size > ApiConsts::MAX_PAGE_SIZE {
        errors.push(format!(
            "page_size must be between 1 and {} (got {})",
            ApiConsts::MAX_PAGE_SIZE,
            config.page_size
        ));
    }

    if config.concurrency == 0 {
        errors.push("concurrency must be at least 1".to_string());
    }

    if config.timeout_secs == 0 {
        errors.push("timeout must be at least 1 second".to_string());
    }

    if config.status.as_deref().is_some_and(|s| s.trim().is_empty()) {
        errors.push("status filter must not be empty when set".to_string());
    }

    target
}

fn finish(target: Option<TargetCount>, errors: Vec<String>) -> Result<TargetCount, SyncError> {
    match target {
        Some(target) if errors.is_empty() => Ok(target),
        _ => Err(SyncError::ConfigInvalid(errors.join("; "))),
    }
}

/// Validate every option except the API key. The CLI runs this before prompting for the key.
///
/// # Errors
///
/// Returns [`SyncError::ConfigInvalid`] listing every failed check.
pub fn validate_settings(config: &SyncConfig) -> Result<TargetCount, SyncError> {
    let mut errors = Vec::new();
    let target = check_settings(config, &mut errors);
    finish(target, errors)
}

/// Validate `config`, key included, and return the resolved target count.
///
/// # Errors
///
/// Returns [`SyncError::ConfigInvalid`] listing every failed check.
pub fn validate_config(config: &SyncConfig) -> Result<TargetCount, SyncError> {
    let mut errors = Vec::new();
    let target = check_settings(config, &mut errors);
    if config.key.trim().is_empty() {
        errors.push("The API key is missing".to_string());
    }
    finish(target, errors)
}
