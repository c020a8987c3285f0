use crate::areas::database::Database;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::Error;
use derive_new::new;
use std::collections::{HashSet, VecDeque};

/// Why a commit reachable from the start points was left out of a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Missing,
    NotACommit(ObjectType),
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct SkippedCommit {
    pub oid: ObjectId,
    pub reason: SkipReason,
}

#[derive(Debug, Default)]
pub struct WalkResult {
    /// Newest first
    pub commits: Vec<(ObjectId, Commit)>,
    pub skipped: Vec<SkippedCommit>,
}

/// Breadth-first walk over parent links
#[derive(Debug, new)]
pub struct RevList<'d> {
    database: &'d Database,
}

impl RevList<'_> {
    /// Every commit reachable from `start`, each once, ordered by committer
    /// time (newest first, ties in discovery order) and then cut to `limit`.
    ///
    /// Commits that are missing or unreadable are reported in `skipped` and
    /// their ancestry is not followed; the walk itself never fails.
    pub fn walk(&self, start: impl IntoIterator<Item = ObjectId>, limit: Option<usize>) -> WalkResult {
        let mut result = WalkResult::default();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        for oid in start {
            if visited.insert(oid.clone()) {
                queue.push_back(oid);
            }
        }

        while let Some(oid) = queue.pop_front() {
            match self.database.parse_object_as_commit(&oid) {
                Ok(commit) => {
                    for parent in commit.parents() {
                        if visited.insert(parent.clone()) {
                            queue.push_back(parent.clone());
                        }
                    }
                    result.commits.push((oid, commit));
                }
                Err(err) => {
                    let reason = match err {
                        Error::ObjectNotFound(_) => SkipReason::Missing,
                        Error::ObjectTypeMismatch { actual, .. } => SkipReason::NotACommit(actual),
                        other => SkipReason::Unreadable(other.to_string()),
                    };
                    tracing::warn!(%oid, ?reason, "skipping commit during history walk");
                    result.skipped.push(SkippedCommit::new(oid, reason));
                }
            }
        }

        // stable sort keeps discovery order between equal timestamps
        result
            .commits
            .sort_by(|(_, a), (_, b)| b.timestamp().cmp(&a.timestamp()));
        if let Some(limit) = limit {
            result.commits.truncate(limit);
        }

        result
    }
}
