use crate::errors::{IoResultExt, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Prefix of in-flight temp files. Never a valid object or ref name.
pub const TEMP_PREFIX: &str = ".tmp-";

/// Replace `path` with `content` in one step: write a temp file next to it,
/// flush it to disk, then rename over the target. Readers see either the old
/// bytes or the new ones.
pub fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    let temp = staged_temp_file(path, content)?;

    temp.persist(path)
        .map_err(|err| err.error)
        .with_path("rename temp file to", path)?;

    Ok(())
}

/// Like [`write_atomically`], but never replaces an existing file. Returns
/// `false`, leaving the target untouched, when `path` already exists; of
/// several racing writers exactly one gets `true`.
pub fn create_atomically(path: &Path, content: &[u8]) -> Result<bool> {
    let temp = staged_temp_file(path, content)?;

    match temp.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(err) => Err(err.error).with_path("rename temp file to", path),
    }
}

/// Synced temp file holding `content` in the directory of `path`
fn staged_temp_file(path: &Path, content: &[u8]) -> Result<NamedTempFile> {
    let dir = path
        .parent()
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).with_path("create directory", dir)?;

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(dir)
        .with_path("create temp file in", dir)?;
    temp.write_all(content).with_path("write", temp.path())?;
    temp.as_file().sync_all().with_path("sync", temp.path())?;

    Ok(temp)
}

pub fn is_temp_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX)
}
