use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};

impl Repository {
    /// Create a commit object for `tree` without touching any ref
    pub fn commit_tree(&self, tree: &str, parents: &[String], message: &str) -> Result<ObjectId> {
        let resolver = self.resolver();
        let tree = resolver.peel(resolver.resolve(tree)?, Some(ObjectType::Tree))?;
        let parents = parents
            .iter()
            .map(|parent| resolver.resolve_commit(parent))
            .collect::<Result<Vec<_>>>()?;

        self.write_commit(tree, parents, message)
    }

    pub(crate) fn write_commit(
        &self,
        tree: ObjectId,
        parents: Vec<ObjectId>,
        message: &str,
    ) -> Result<ObjectId> {
        let message = normalize_message(message)?;
        let author = self.config().author()?;
        let committer = self.config().committer()?;

        let commit = Commit::new(tree, parents, author, committer, message);
        self.database().store(&commit)
    }
}

/// Messages always end with exactly one newline
pub(crate) fn normalize_message(message: &str) -> Result<String> {
    let trimmed = message.trim_end();
    if trimmed.trim().is_empty() {
        return Err(Error::EmptyMessage);
    }

    Ok(format!("{trimmed}\n"))
}
