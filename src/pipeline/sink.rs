//! Output sinks: where emitted records and touch signals go.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::OutputRecord;
use crate::engine::hashing::content_digest;
use crate::utils::config::PackagePaths;
use crate::utils::tempfiles::write_atomic;

/// Receiver of a run's output. Calls arrive sequentially from the orchestrator.
pub trait OutputSink {
    /// Store a new or changed record.
    fn emit(&mut self, record: OutputRecord) -> Result<()>;

    /// Mark an unchanged record as still live.
    fn touch(&mut self, output_id: &str) -> Result<()>;

    /// Called once after the last emit/touch.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collects everything in memory. Used by tests and embedders.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub emitted: Vec<OutputRecord>,
    pub touched: Vec<String>,
    pub finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputSink for MemorySink {
    fn emit(&mut self, record: OutputRecord) -> Result<()> {
        self.emitted.push(record);
        Ok(())
    }

    fn touch(&mut self, output_id: &str) -> Result<()> {
        self.touched.push(output_id.to_string());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Ids that were live in this run, written to `manifest.json` by [`JsonDirSink::finish`].
#[derive(Debug, Default, Serialize)]
struct Manifest {
    emitted: Vec<String>,
    touched: Vec<String>,
}

/// One `<output_id>.json` file per campaign in a directory.
pub struct JsonDirSink {
    dir: PathBuf,
    manifest: Manifest,
}

/// Hex digits of the id digest appended to a sanitised stem.
const STEM_DIGEST_LEN: usize = 12;

/// Map an output id to a safe file stem.
///
/// Ids made only of `[A-Za-z0-9._-]` are used as is. Anything else becomes `_`, and the stem gets
/// a `-<digest>` suffix of the original id so two ids never share a file.
pub fn file_stem_for(output_id: &str) -> String {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if output_id.chars().all(is_safe) {
        return output_id.to_string();
    }
    let sanitised: String = output_id
        .chars()
        .map(|c| if is_safe(c) { c } else { '_' })
        .collect();
    let digest = content_digest(output_id.as_bytes());
    format!("{sanitised}-{}", &digest[..STEM_DIGEST_LEN])
}

impl JsonDirSink {
    /// Create `dir` if needed.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("create output directory {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            manifest: Manifest::default(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for `output_id`.
    pub fn record_path(&self, output_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem_for(output_id)))
    }
}

impl OutputSink for JsonDirSink {
    fn emit(&mut self, record: OutputRecord) -> Result<()> {
        let path = self.record_path(&record.id);
        let bytes = serde_json::to_vec_pretty(&record)
            .with_context(|| format!("serialize record {}", record.id))?;
        write_atomic(&path, &bytes)?;
        debug!("wrote {}", path.display());
        self.manifest.emitted.push(record.id);
        Ok(())
    }

    fn touch(&mut self, output_id: &str) -> Result<()> {
        let path = self.record_path(output_id);
        match fs::File::options().write(true).open(&path) {
            Ok(file) => file
                .set_modified(SystemTime::now())
                .with_context(|| format!("touch {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "{} is unchanged but {} is missing; clear the cache to re-fetch it",
                    output_id,
                    path.display()
                );
            }
            Err(e) => return Err(e).with_context(|| format!("open {}", path.display())),
        }
        self.manifest.touched.push(output_id.to_string());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let path = self.dir.join(PackagePaths::get().manifest_filename());
        let bytes = serde_json::to_vec_pretty(&self.manifest).context("serialize manifest")?;
        write_atomic(&path, &bytes)
    }
}
