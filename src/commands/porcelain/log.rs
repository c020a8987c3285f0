use crate::areas::repository::Repository;
use crate::artifacts::log::rev_list::WalkResult;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::refs::ref_name::SymRefName;
use crate::artifacts::refs::{HEADS_PREFIX, TAGS_PREFIX};
use crate::errors::Result;
use std::collections::HashMap;

impl Repository {
    /// History reachable from `revisions` (HEAD when none are given), newest
    /// first. An unborn HEAD yields an empty history rather than an error.
    pub fn log(&self, revisions: &[String], limit: Option<usize>) -> Result<WalkResult> {
        let resolver = self.resolver();

        let starts = if revisions.is_empty() {
            match self.refs().resolve_head()? {
                Some(head) => vec![resolver.peel(head, Some(ObjectType::Commit))?],
                None => return Ok(WalkResult::default()),
            }
        } else {
            revisions
                .iter()
                .map(|revision| resolver.resolve_commit(revision))
                .collect::<Result<Vec<_>>>()?
        };

        Ok(self.rev_list().walk(starts, limit))
    }

    /// Commit id -> branches and tags pointing at it (tags peeled), for
    /// decorating log output
    pub fn decorations(&self) -> Result<HashMap<ObjectId, Vec<SymRefName>>> {
        let resolver = self.resolver();
        let mut decorations: HashMap<ObjectId, Vec<SymRefName>> = HashMap::new();

        let mut refs = self.refs().list_refs(HEADS_PREFIX)?;
        refs.extend(self.refs().list_refs(TAGS_PREFIX)?);
        for name in refs {
            let Some(oid) = self.refs().resolve(&name)? else {
                continue;
            };
            // dangling refs are left undecorated
            let Ok(oid) = resolver.peel(oid, None) else {
                continue;
            };
            decorations.entry(oid).or_default().push(name);
        }

        Ok(decorations)
    }
}
