use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::Result;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Which working tree changes `add` picks up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddMode {
    /// New, modified and deleted files under the given paths
    #[default]
    Paths,
    /// Only paths already in the index (`-u`)
    Tracked,
    /// Everything, the whole tree when no paths are given (`-A`)
    All,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// New or changed entries
    pub staged: Vec<String>,
    /// Tracked files that vanished from the working tree
    pub removed: Vec<String>,
    /// Arguments matching neither a file nor a tracked path
    pub ignored: Vec<String>,
}

impl AddOutcome {
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty() && self.removed.is_empty()
    }
}

impl Repository {
    /// Bring the index in line with the working tree under `paths`.
    ///
    /// Within one call new and modified files are staged first and deletions
    /// applied second. The index is written once, at the end, and only if
    /// every file could be read.
    pub fn add(&self, paths: &[PathBuf], mode: AddMode) -> Result<AddOutcome> {
        let mut index = self.load_index()?;
        let mut outcome = AddOutcome::default();

        let targets: Vec<PathBuf> = if paths.is_empty() && mode != AddMode::Paths {
            vec![self.root().to_path_buf()]
        } else {
            paths.to_vec()
        };

        let mut to_stage = BTreeSet::new();
        let mut to_remove = BTreeSet::new();
        for target in &targets {
            let relative = self.workspace().relative_path(target)?;
            let tracked: BTreeSet<String> = index
                .entries_under(&relative)
                .map(|entry| entry.name.clone())
                .collect();
            let mut on_disk = self.workspace().list_files(&relative)?;

            if on_disk.is_empty() && tracked.is_empty() {
                outcome.ignored.push(target.display().to_string());
                continue;
            }
            if mode == AddMode::Tracked {
                on_disk.retain(|path| tracked.contains(path));
            }

            let present: BTreeSet<&String> = on_disk.iter().collect();
            to_remove.extend(tracked.iter().filter(|path| !present.contains(path)).cloned());
            to_stage.extend(on_disk);
        }

        for path in to_stage {
            if self.stage_file(&mut index, &path)? {
                outcome.staged.push(path);
            }
        }
        // exact entries only: a tracked file may have become a directory
        // whose contents were staged above
        for path in to_remove {
            index.unstage_file(&path);
            outcome.removed.push(path);
        }

        index.save()?;
        tracing::debug!(
            staged = outcome.staged.len(),
            removed = outcome.removed.len(),
            "index updated from working tree"
        );

        Ok(outcome)
    }

    /// Store the blob for `path` and stage it; false when the index already
    /// had the same content and mode
    fn stage_file(&self, index: &mut Index, path: &str) -> Result<bool> {
        let content = self.workspace().read_file(path)?;
        let stat = self.workspace().stat_file(path)?;
        let oid = self.database().put(ObjectType::Blob, &content)?;
        let mode = stat.file_mode();

        let unchanged = index
            .entry(path)
            .is_some_and(|entry| entry.oid == oid && entry.mode() == EntryMode::File(mode));
        index.stage(path, oid, mode, Some(stat))?;

        Ok(!unchanged)
    }
}
