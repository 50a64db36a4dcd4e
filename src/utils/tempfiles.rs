use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sibling temp path for `path` (`<name>.tmp`).
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("record");
    path.parent()
        .unwrap_or(Path::new("."))
        .join(format!("{name}.tmp"))
}

pub fn rename_temp_to_final(temp_path: &Path, final_path: &Path) -> Result<()> {
    fs::rename(temp_path, final_path).with_context(|| {
        format!(
            "atomic rename temp file to final path ({} -> {})",
            temp_path.display(),
            final_path.display()
        )
    })
}

/// Write `bytes` to `path` via a temp file and rename, so readers never see a half-written record.
/// If the temp file cannot be created for lack of permission, writes to `path` directly.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = temp_path_for(path);
    let mut file = match fs::File::create(&temp_path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return fs::write(path, bytes)
                .with_context(|| format!("write {}", path.display()));
        }
        Err(e) => {
            return Err(e).with_context(|| format!("create temp file {}", temp_path.display()));
        }
    };
    file.write_all(bytes)
        .with_context(|| format!("write temp file {}", temp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("sync temp file {}", temp_path.display()))?;
    drop(file);
    rename_temp_to_final(&temp_path, path)
}
