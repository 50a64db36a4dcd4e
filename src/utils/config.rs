//! Application configuration constants.
//! Defaults, wire constants and tuning in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    cache_filename: String,
    settings_filename: String,
    manifest_filename: String,
    api_key_env: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                cache_filename: format!(".{pkg}"),
                settings_filename: format!(".{pkg}.toml"),
                manifest_filename: "manifest.json".to_string(),
                api_key_env: format!("{}_API_KEY", pkg.to_uppercase()),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Fingerprint cache filename (SQLite), placed in the output dir unless overridden.
    pub fn cache_filename(&self) -> &str {
        &self.cache_filename
    }

    pub fn settings_filename(&self) -> &str {
        &self.settings_filename
    }

    pub fn manifest_filename(&self) -> &str {
        &self.manifest_filename
    }

    /// Environment variable holding the API key (e.g. `CHIMPSYNC_API_KEY`).
    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }
}

// ---- Defaults for SyncConfig ----

pub struct Defaults;

impl Defaults {
    pub const AUTH_USERNAME: &'static str = "chimpsync";
    pub const CAMPAIGN_FIELDS: [&'static str; 5] = [
        "campaigns.type",
        "campaigns.status",
        "campaigns.send_time",
        "campaigns.settings.subject_line",
        "campaigns.settings.preview_text",
    ];
    pub const CONTENT_FIELDS: [&'static str; 1] = ["html"];
    pub const NODE_TYPE: &'static str = "MailchimpCampaign";
    /// Target number of campaigns. 0 means fetch all.
    pub const COUNT: i64 = 30;
    pub const PAGE_SIZE: u32 = 30;
    pub const CONCURRENCY: usize = 8;
    pub const TIMEOUT_SECS: u64 = 30;
    pub const OUTPUT_DIR: &'static str = "campaigns";

    pub fn campaign_fields() -> Vec<String> {
        Self::CAMPAIGN_FIELDS.iter().map(|s| s.to_string()).collect()
    }

    pub fn content_fields() -> Vec<String> {
        Self::CONTENT_FIELDS.iter().map(|s| s.to_string()).collect()
    }
}

// ---- Remote API ----

pub struct ApiConsts;

impl ApiConsts {
    /// `count` value meaning "fetch all" in configuration.
    pub const FETCH_ALL: i64 = 0;
    /// Largest page the API will serve.
    pub const MAX_PAGE_SIZE: u32 = 1000;
    pub const CAMPAIGNS_PATH: &'static str = "campaigns";
    pub const CONTENT_PATH: &'static str = "content";
    /// Always requested on list pages so every item can be identified and paginated.
    pub const REQUIRED_LIST_FIELDS: [&'static str; 2] = ["campaigns.id", "total_items"];
    pub const SORT_FIELD: &'static str = "send_time";
    pub const SORT_DIR: &'static str = "DESC";
}

// ---- Output records ----

/// Namespace prefix for output ids: `mailchimp-campaign-<id>`.
pub const OUTPUT_ID_PREFIX: &str = "mailchimp-campaign-";

/// Media type tag on every output record.
pub const OUTPUT_MEDIA_TYPE: &str = "text/html";

// ---- Progress ----

/// Progress bar description for the content phase.
pub const CONTENT_PROGRESS_DESC: &str = "Fetching content";

// ---- Pending list output ----

/// In dry-run, list pending campaigns individually only up to this many.
pub const LIST_THRESHOLD: usize = 100;
