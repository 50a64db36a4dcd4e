use clap::Parser;
use std::path::PathBuf;

/// Incrementally sync Mailchimp campaigns into a directory of JSON records.
#[derive(Clone, Parser)]
#[command(name = "chimpsync")]
#[command(
    about = "Sync Mailchimp campaigns to JSON records; unchanged campaigns are skipped. Use --dry-run to see what would be fetched."
)]
pub struct Cli {
    /// API root, e.g. https://us1.api.mailchimp.com/3.0
    #[arg(long, value_name = "URL")]
    pub root_url: Option<String>,

    /// Basic-auth username sent with the API key.
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// List fields to request (campaigns.-prefixed). Replaces the default selection.
    #[arg(long, num_args = 0..)]
    pub campaign_fields: Option<Vec<String>>,

    /// Content fields to request. Pass with no values to request the full payload.
    #[arg(long, num_args = 0..)]
    pub content_fields: Option<Vec<String>>,

    /// Type tag written into every record.
    #[arg(long)]
    pub node_type: Option<String>,

    /// Number of campaigns to sync, newest first. 0 syncs all.
    #[arg(long, short = 'n', value_parser = clap::value_parser!(i64))]
    pub count: Option<i64>,

    /// Campaigns per list request when syncing all (1-1000).
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Content requests per wave.
    #[arg(long, short = 'k')]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long, short = 't', value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Only list campaigns with this status (e.g. sent).
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// Path to the fingerprint cache. Default: `.chimpsync` in the output directory.
    #[arg(long, short = 'c')]
    pub cache: Option<PathBuf>,

    /// Output directory for campaign records.
    #[arg(long, short = 'o', value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// List and compare with the cache only; fetch no content and write nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}
