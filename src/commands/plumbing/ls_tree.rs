use crate::areas::repository::Repository;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::Result;

/// One line of `ls-tree` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeListing {
    pub mode: EntryMode,
    pub kind: ObjectType,
    pub oid: ObjectId,
    /// Relative to the listed tree
    pub path: String,
}

impl std::fmt::Display for TreeListing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o} {} {}\t{}", self.mode.as_u32(), self.kind, self.oid, self.path)
    }
}

impl Repository {
    /// Entries of the tree named by `revision` (a tree, or anything that
    /// peels to one). With `recursive`, subtrees are expanded in place of
    /// being listed.
    pub fn ls_tree(&self, revision: &str, recursive: bool) -> Result<Vec<TreeListing>> {
        let resolver = self.resolver();
        let tree = resolver.peel(resolver.resolve(revision)?, Some(ObjectType::Tree))?;

        let mut listing = Vec::new();
        self.collect_tree(&tree, "", recursive, &mut listing)?;

        Ok(listing)
    }

    fn collect_tree(
        &self,
        oid: &ObjectId,
        prefix: &str,
        recursive: bool,
        listing: &mut Vec<TreeListing>,
    ) -> Result<()> {
        let tree = self.database().parse_object_as_tree(oid)?;

        for entry in tree.into_entries() {
            let path = if prefix.is_empty() {
                entry.name.clone()
            } else {
                format!("{prefix}/{}", entry.name)
            };

            if recursive && entry.is_tree() {
                self.collect_tree(&entry.oid, &path, recursive, listing)?;
            } else {
                listing.push(TreeListing {
                    mode: entry.mode,
                    kind: entry.object_type(),
                    oid: entry.oid,
                    path,
                });
            }
        }

        Ok(())
    }
}
