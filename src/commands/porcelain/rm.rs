use crate::areas::repository::Repository;
use crate::errors::{Error, Result};
use std::path::PathBuf;

impl Repository {
    /// Unstage `paths` (and everything staged below them), leaving the
    /// working tree alone. Fails without changing anything when a path
    /// matches no index entry.
    pub fn rm_cached(&self, paths: &[PathBuf]) -> Result<Vec<String>> {
        let mut index = self.load_index()?;

        let mut removed = Vec::new();
        for path in paths {
            let relative = self.workspace().relative_path(path)?;
            let matched: Vec<String> = index
                .entries_under(&relative)
                .map(|entry| entry.name.clone())
                .collect();
            if matched.is_empty() {
                return Err(Error::PathNotFound {
                    revision: "index".to_string(),
                    path: path.display().to_string(),
                });
            }
            removed.extend(matched);
        }

        for path in &removed {
            index.unstage(path);
        }
        index.save()?;
        removed.sort();
        removed.dedup();

        Ok(removed)
    }
}
