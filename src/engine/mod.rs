//! Engine module: remote client, fingerprint store, hashing, validation, CLI plumbing

pub mod arg_parser;
pub mod cli;
pub mod client;
pub mod db_ops;
pub mod hashing;
pub mod progress;
pub mod validation;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use client::{CampaignApi, HttpApi, ListPage, ListRequest};
pub use db_ops::{FingerprintStore, MemoryStore, SqliteStore, open_db, open_db_in_memory};
pub use hashing::{canonical_json, content_digest, fingerprint_equals, fingerprint_of};
pub use validation::{resolve_target, validate_config, validate_settings};
