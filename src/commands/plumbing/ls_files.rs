use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::errors::Result;

impl Repository {
    /// Staged entries in path order
    pub fn ls_files(&self) -> Result<Vec<IndexEntry>> {
        Ok(self.load_index()?.into_entries().collect())
    }
}
