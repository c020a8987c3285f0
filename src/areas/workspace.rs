//! Working tree access for staging
//!
//! Paths handed out by the workspace are relative to the repository root and
//! `/`-separated, the same form the index stores.

use crate::areas::atomic::is_temp_name;
use crate::artifacts::index::index_entry::EntryMetadata;
use crate::errors::{Error, IoResultExt, Result};
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    /// Name of the metadata directory, never listed
    repository_dir: String,
}

impl Workspace {
    pub fn new(path: PathBuf, repository_dir: String) -> Self {
        Workspace {
            path,
            repository_dir,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Turn a user-supplied path (absolute, or relative to the root) into
    /// the root-relative form. `.` and `..` are folded lexically so paths of
    /// deleted files can still be named; the result may be empty (the root).
    pub fn relative_path(&self, path: &Path) -> Result<String> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.path.join(path)
        };
        let invalid = || Error::InvalidPath(path.display().to_string());

        let relative = absolute.strip_prefix(&self.path).map_err(|_| invalid())?;
        let mut parts: Vec<String> = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str().ok_or_else(invalid)?.to_string()),
                Component::CurDir => {}
                Component::ParentDir => {
                    parts.pop().ok_or_else(invalid)?;
                }
                Component::RootDir | Component::Prefix(_) => return Err(invalid()),
            }
        }

        if parts.first().is_some_and(|first| *first == self.repository_dir) {
            return Err(invalid());
        }

        Ok(parts.join("/"))
    }

    /// Every file at or below `path` (root-relative, `""` for the whole
    /// tree), sorted. Symlinks are listed, not followed.
    pub fn list_files(&self, path: &str) -> Result<Vec<String>> {
        let start = self.path.join(path);
        let metadata = match std::fs::symlink_metadata(&start) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Error::io(format!("unable to stat {}", start.display()), err)),
        };
        if !metadata.is_dir() {
            return Ok(vec![path.to_string()]);
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&start)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_ignored(entry.path()));

        for entry in walker {
            let entry = entry.map_err(|err| {
                let context = format!("unable to list {}", start.display());
                Error::io(context, err.into())
            })?;
            if entry.file_type().is_dir() {
                continue;
            }
            if entry.file_name().to_str().is_none_or(is_temp_name) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.path) else {
                continue;
            };
            match relative.to_str() {
                Some(relative) => files.push(relative.replace('\\', "/")),
                None => tracing::warn!(path = %relative.display(), "skipping non UTF-8 path"),
            }
        }
        files.sort();

        Ok(files)
    }

    fn is_ignored(&self, path: &Path) -> bool {
        path.strip_prefix(&self.path)
            .ok()
            .and_then(|relative| relative.components().next())
            .is_some_and(|first| first.as_os_str() == self.repository_dir.as_str())
    }

    /// Whether anything (file, link or directory) exists at `path`
    pub fn exists(&self, path: &str) -> bool {
        std::fs::symlink_metadata(self.path.join(path)).is_ok()
    }

    /// File content, or the link target for a symlink
    pub fn read_file(&self, path: &str) -> Result<Bytes> {
        let full_path = self.path.join(path);
        let metadata = std::fs::symlink_metadata(&full_path).with_path("stat", &full_path)?;

        if metadata.file_type().is_symlink() {
            let target = std::fs::read_link(&full_path).with_path("read link", &full_path)?;
            return Ok(Bytes::copy_from_slice(target.as_os_str().as_encoded_bytes()));
        }

        let content = std::fs::read(&full_path).with_path("read", &full_path)?;
        Ok(Bytes::from(content))
    }

    pub fn stat_file(&self, path: &str) -> Result<EntryMetadata> {
        let full_path = self.path.join(path);
        let metadata = std::fs::symlink_metadata(&full_path).with_path("stat", &full_path)?;

        Ok(EntryMetadata::from_stat(&full_path, &metadata))
    }
}
