//! Pipeline components: pagination, reconciliation, content waves, merging, output.

pub mod batch;
pub mod context;
pub mod error_handler;
pub mod merge;
pub mod orchestrator;
pub mod paginator;
pub mod reconcile;
pub mod sink;

pub use batch::{BatchParams, run_batched, run_batched_with};
pub use context::{RunTuning, SyncParams};
pub use error_handler::{log_pending_ids, log_summary, report_fetch_failure};
pub use merge::merge_record;
pub use orchestrator::{list_campaigns, run_sync};
pub use paginator::{extra_page_offsets, first_page_count, paginate};
pub use reconcile::classify;
pub use sink::{JsonDirSink, MemorySink, OutputSink, file_stem_for};
