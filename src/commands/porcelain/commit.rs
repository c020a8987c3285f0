use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub oid: ObjectId,
    /// Branch that moved, `None` for a detached HEAD
    pub branch: Option<String>,
    /// First commit on the branch
    pub root: bool,
    pub summary: String,
}

impl Repository {
    /// Snapshot the index as a new commit on top of HEAD and advance the
    /// branch HEAD points to (or HEAD itself when detached).
    ///
    /// With `allow_empty` unset, a commit whose tree equals its parent's is
    /// refused with [`Error::NothingToCommit`]. The object is written before
    /// the ref moves, so a failure in between leaves an unreferenced commit
    /// and the branch untouched.
    pub fn commit(&self, message: &str, allow_empty: bool) -> Result<CommitOutcome> {
        let tree = self.write_tree()?;
        let parent = self.refs().resolve_head()?;

        if !allow_empty && let Some(parent) = &parent {
            let parent_commit = self.database().parse_object_as_commit(parent)?;
            if parent_commit.tree_oid() == &tree {
                return Err(Error::NothingToCommit);
            }
        }

        let root = parent.is_none();
        let oid = self.write_commit(tree, parent.into_iter().collect(), message)?;
        self.refs().update_head(&oid)?;
        let branch = self.refs().current_branch()?;
        tracing::debug!(%oid, ?branch, "commit created");

        let summary = self.database().parse_object_as_commit(&oid)?.short_message();

        Ok(CommitOutcome {
            oid,
            branch,
            root,
            summary,
        })
    }
}
