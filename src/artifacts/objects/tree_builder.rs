//! Index to tree conversion
//!
//! Groups the flat list of staged paths into one node per directory, then
//! stores the nodes children-first so each parent can reference the ids of
//! its subtrees. Identical directories always encode to the same bytes, so
//! unchanged subtrees keep their ids across commits and are not rewritten.

use crate::areas::database::Database;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::{Tree, TreeEntry};
use crate::errors::{Error, Result};
use std::collections::BTreeMap;

#[derive(Debug)]
enum Node {
    File { mode: EntryMode, oid: ObjectId },
    Directory(TreeBuilder),
}

/// One directory level of the tree under construction
#[derive(Debug, Default)]
pub struct TreeBuilder {
    children: BTreeMap<String, Node>,
}

impl TreeBuilder {
    /// Write the tree for `entries` and every subtree below it, returning
    /// the root id. An empty index yields the empty tree.
    pub fn build_from_index<'e>(
        database: &Database,
        entries: impl IntoIterator<Item = &'e IndexEntry>,
    ) -> Result<ObjectId> {
        let mut root = TreeBuilder::default();
        for entry in entries {
            root.add_entry(&entry.name, entry)?;
        }

        root.store(database)
    }

    fn add_entry(&mut self, path: &str, entry: &IndexEntry) -> Result<()> {
        match path.split_once('/') {
            None => {
                if matches!(self.children.get(path), Some(Node::Directory(_))) {
                    return Err(Error::InvalidPath(entry.name.clone()));
                }
                self.children.insert(
                    path.to_string(),
                    Node::File {
                        mode: entry.mode(),
                        oid: entry.oid.clone(),
                    },
                );
            }
            Some((dir, rest)) => {
                let node = self
                    .children
                    .entry(dir.to_string())
                    .or_insert_with(|| Node::Directory(TreeBuilder::default()));
                match node {
                    Node::Directory(subtree) => subtree.add_entry(rest, entry)?,
                    Node::File { .. } => return Err(Error::InvalidPath(entry.name.clone())),
                }
            }
        }

        Ok(())
    }

    /// Post-order: subtrees first, then this level
    fn store(self, database: &Database) -> Result<ObjectId> {
        let mut entries = Vec::with_capacity(self.children.len());

        for (name, node) in self.children {
            let entry = match node {
                Node::File { mode, oid } => TreeEntry::new(name, mode, oid),
                Node::Directory(subtree) => {
                    TreeEntry::new(name, EntryMode::Directory, subtree.store(database)?)
                }
            };
            entries.push(entry);
        }

        database.store(&Tree::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::FileMode;
    use crate::artifacts::objects::object_type::ObjectType;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    struct Fixture {
        _dir: TempDir,
        database: Database,
    }

    #[fixture]
    fn db() -> Fixture {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects"), 4);
        Fixture { _dir: dir, database }
    }

    fn entry(database: &Database, path: &str, content: &str) -> IndexEntry {
        let oid = database.put(ObjectType::Blob, content.as_bytes()).unwrap();
        IndexEntry::staged(path.to_string(), oid, FileMode::Regular, None)
    }

    #[rstest]
    fn empty_index_builds_the_empty_tree(db: Fixture) {
        let oid = TreeBuilder::build_from_index(&db.database, []).unwrap();

        assert_eq!(oid.as_ref(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
        assert!(db.database.parse_object_as_tree(&oid).unwrap().is_empty());
    }

    #[rstest]
    fn single_file_tree_matches_git(db: Fixture) {
        let entries = [entry(&db.database, "a.txt", "hi")];

        let oid = TreeBuilder::build_from_index(&db.database, &entries).unwrap();

        // printf 'hi' > a.txt && git add a.txt && git write-tree
        assert_eq!(oid.as_ref(), "959186c87f11cedbc03fb0aa728575ce3dbf3335");
    }

    #[rstest]
    fn insertion_order_does_not_matter(db: Fixture) {
        let a = entry(&db.database, "a", "1");
        let b = entry(&db.database, "dir/b", "2");

        let forward = TreeBuilder::build_from_index(&db.database, [&a, &b]).unwrap();
        let backward = TreeBuilder::build_from_index(&db.database, [&b, &a]).unwrap();

        assert_eq!(forward, backward);
    }

    #[rstest]
    fn nested_directories_become_subtrees(db: Fixture) {
        let entries = [
            entry(&db.database, "src/lib.rs", "lib"),
            entry(&db.database, "src/bin/main.rs", "main"),
            entry(&db.database, "README", "readme"),
        ];

        let root = TreeBuilder::build_from_index(&db.database, &entries).unwrap();

        let root = db.database.parse_object_as_tree(&root).unwrap();
        let names: Vec<_> = root.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["README", "src"]);

        let src = root.entry("src").unwrap();
        assert!(src.is_tree());
        let src = db.database.parse_object_as_tree(&src.oid).unwrap();
        let names: Vec<_> = src.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["bin", "lib.rs"]);
    }

    #[rstest]
    fn unchanged_subtree_keeps_its_id(db: Fixture) {
        let lib = entry(&db.database, "lib/a", "same");
        let first = TreeBuilder::build_from_index(&db.database, [&lib, &entry(&db.database, "x", "1")]).unwrap();
        let second = TreeBuilder::build_from_index(&db.database, [&lib, &entry(&db.database, "x", "2")]).unwrap();

        let lib_id = |root: &ObjectId| {
            db.database
                .parse_object_as_tree(root)
                .unwrap()
                .entry("lib")
                .unwrap()
                .oid
                .clone()
        };
        assert_ne!(first, second);
        assert_eq!(lib_id(&first), lib_id(&second));
    }
}
