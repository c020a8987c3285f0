//! Evaluation of revision expressions
//!
//! A bare name is looked up in a fixed order, first match wins:
//!
//! 1. `HEAD`
//! 2. a full ref path (`refs/...`)
//! 3. `refs/heads/<name>`
//! 4. `refs/tags/<name>`
//! 5. an object id prefix of at least the minimum abbreviation length
//!
//! A branch named like a hex prefix therefore shadows the object.

use crate::areas::database::Database;
use crate::areas::refs::Refs;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_id::is_hex;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::refs::ref_name::SymRefName;
use crate::artifacts::refs::{HEAD_REF_NAME, HEADS_PREFIX, REFS_PREFIX, TAGS_PREFIX};
use crate::artifacts::revision::revision::Revision;
use crate::errors::{Error, Result};
use derive_new::new;

#[derive(Debug, new)]
pub struct RevisionResolver<'r> {
    database: &'r Database,
    refs: &'r Refs,
}

impl RevisionResolver<'_> {
    pub fn resolve(&self, expression: &str) -> Result<ObjectId> {
        let revision = Revision::try_parse(expression)?;
        let oid = self.evaluate(&revision)?;
        tracing::debug!(expression, %oid, "revision resolved");

        Ok(oid)
    }

    /// Resolve and peel to a commit, for callers that need history
    pub fn resolve_commit(&self, expression: &str) -> Result<ObjectId> {
        let oid = self.resolve(expression)?;
        self.peel(oid, Some(ObjectType::Commit))
    }

    pub fn evaluate(&self, revision: &Revision) -> Result<ObjectId> {
        match revision {
            Revision::Ref(name) => self.resolve_name(name),
            Revision::Parent(base) => self.nth_parent(self.evaluate(base)?, 1),
            Revision::ParentN(base, n) => self.nth_parent(self.evaluate(base)?, *n),
            Revision::Ancestor(base, generations) => {
                let mut oid = self.peel(self.evaluate(base)?, Some(ObjectType::Commit))?;
                for _ in 0..*generations {
                    oid = self.nth_parent(oid, 1)?;
                }

                Ok(oid)
            }
            Revision::Peel(base, target) => self.peel(self.evaluate(base)?, *target),
            Revision::Path(base, path) => {
                let tree = self.peel(self.evaluate(base)?, Some(ObjectType::Tree))?;
                self.lookup_path(tree, path)
                    .map_err(|err| match err {
                        Error::PathNotFound { path, .. } => Error::PathNotFound {
                            revision: base.to_string(),
                            path,
                        },
                        other => other,
                    })
            }
        }
    }

    fn resolve_name(&self, name: &str) -> Result<ObjectId> {
        let unknown = || Error::UnknownRevision(name.to_string());

        if name == HEAD_REF_NAME {
            return self.refs.resolve_head()?.ok_or_else(unknown);
        }

        let mut candidates = Vec::with_capacity(3);
        if name.starts_with(REFS_PREFIX) {
            candidates.push(name.to_string());
        }
        candidates.push(format!("{HEADS_PREFIX}{name}"));
        candidates.push(format!("{TAGS_PREFIX}{name}"));

        for candidate in candidates {
            let Ok(ref_name) = SymRefName::try_parse(candidate) else {
                continue;
            };
            if let Some(oid) = self.refs.resolve(&ref_name)? {
                tracing::trace!(name, %ref_name, "name matched a ref");
                return Ok(oid);
            }
        }

        if is_hex(name) {
            match self.database.resolve_abbreviation(name) {
                Ok(oid) => return Ok(oid),
                Err(Error::ObjectNotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }

        Err(unknown())
    }

    /// Dereference `oid` to `target`: tags are followed to what they point
    /// at, and a commit stands for its tree when a tree is asked for
    pub fn peel(&self, oid: ObjectId, target: Option<ObjectType>) -> Result<ObjectId> {
        let Some(target) = target else {
            return self.peel_tags(oid);
        };

        if target == ObjectType::Tag {
            let actual = self.database.object_kind(&oid)?;
            return if actual == ObjectType::Tag {
                Ok(oid)
            } else {
                Err(Error::ObjectTypeMismatch {
                    oid,
                    expected: target,
                    actual,
                })
            };
        }

        let oid = self.peel_tags(oid)?;
        let actual = self.database.object_kind(&oid)?;
        match (target, actual) {
            _ if target == actual => Ok(oid),
            (ObjectType::Tree, ObjectType::Commit) => {
                Ok(self.database.parse_object_as_commit(&oid)?.tree_oid().clone())
            }
            _ => Err(Error::ObjectTypeMismatch {
                oid,
                expected: target,
                actual,
            }),
        }
    }

    fn peel_tags(&self, mut oid: ObjectId) -> Result<ObjectId> {
        while self.database.object_kind(&oid)? == ObjectType::Tag {
            let tag = self.database.parse_object_as_tag(&oid)?;
            tracing::trace!(tag = %oid, target = %tag.object(), "peeled tag");
            oid = tag.object().clone();
        }

        Ok(oid)
    }

    fn nth_parent(&self, oid: ObjectId, n: usize) -> Result<ObjectId> {
        let oid = self.peel(oid, Some(ObjectType::Commit))?;
        if n == 0 {
            return Ok(oid);
        }

        let commit = self.database.parse_object_as_commit(&oid)?;
        commit
            .parents()
            .get(n - 1)
            .cloned()
            .ok_or(Error::NoSuchParent(oid))
    }

    /// Walk `path` component by component starting at `tree`
    fn lookup_path(&self, tree: ObjectId, path: &str) -> Result<ObjectId> {
        let not_found = || Error::PathNotFound {
            revision: String::new(),
            path: path.to_string(),
        };

        let mut current = tree;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            let tree = match self.database.parse_object_as_tree(&current) {
                Ok(tree) => tree,
                // a blob in the middle of the path
                Err(Error::ObjectTypeMismatch { .. }) => return Err(not_found()),
                Err(err) => return Err(err),
            };
            current = tree.entry(component).ok_or_else(not_found)?.oid.clone();
        }

        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::FileMode;
    use crate::artifacts::index::index_entry::IndexEntry;
    use crate::artifacts::objects::commit::{Commit, Identity};
    use crate::artifacts::objects::tag::Tag;
    use crate::artifacts::objects::tree_builder::TreeBuilder;
    use crate::artifacts::refs::ref_name::RefName;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    struct Repo {
        _dir: TempDir,
        database: Database,
        refs: Refs,
        tree: ObjectId,
        blob: ObjectId,
        c1: ObjectId,
        c2: ObjectId,
        c3: ObjectId,
        side: ObjectId,
        merge: ObjectId,
    }

    impl Repo {
        fn resolver(&self) -> RevisionResolver<'_> {
            RevisionResolver::new(&self.database, &self.refs)
        }

        fn resolve(&self, expression: &str) -> Result<ObjectId> {
            self.resolver().resolve(expression)
        }
    }

    fn commit(database: &Database, tree: &ObjectId, parents: &[&ObjectId], time: i64) -> ObjectId {
        let who = Identity::try_from(format!("A <a@x> {time} +0000").as_str()).unwrap();
        let commit = Commit::new(
            tree.clone(),
            parents.iter().map(|p| (*p).clone()).collect(),
            who.clone(),
            who,
            format!("commit at {time}\n"),
        );
        database.store(&commit).unwrap()
    }

    /// c1 <- c2 <- c3 (master), side branches off c1, merge joins c3 and side
    #[fixture]
    fn repo() -> Repo {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects"), 4);
        let refs = Refs::new(dir.path().to_path_buf());

        let blob = database.put(ObjectType::Blob, b"hi").unwrap();
        let entries = [
            IndexEntry::staged("a.txt".into(), blob.clone(), FileMode::Regular, None),
            IndexEntry::staged("dir/b.txt".into(), blob.clone(), FileMode::Regular, None),
        ];
        let tree = TreeBuilder::build_from_index(&database, &entries).unwrap();

        let c1 = commit(&database, &tree, &[], 100);
        let c2 = commit(&database, &tree, &[&c1], 200);
        let c3 = commit(&database, &tree, &[&c2], 300);
        let side = commit(&database, &tree, &[&c1], 250);
        let merge = commit(&database, &tree, &[&c3, &side], 400);

        let master = RefName::try_parse("master").unwrap();
        refs.create_branch(&master, &c3).unwrap();
        refs.set_head_to_branch(&master).unwrap();
        refs.create_branch(&RefName::try_parse("topic").unwrap(), &merge).unwrap();

        Repo {
            _dir: dir,
            database,
            refs,
            tree,
            blob,
            c1,
            c2,
            c3,
            side,
            merge,
        }
    }

    #[rstest]
    fn head_and_parents_walk_back_through_history(repo: Repo) {
        assert_eq!(repo.resolve("HEAD").unwrap(), repo.c3);
        assert_eq!(repo.resolve("@").unwrap(), repo.c3);
        assert_eq!(repo.resolve("HEAD^").unwrap(), repo.c2);
        assert_eq!(repo.resolve("HEAD^^").unwrap(), repo.c1);
        assert_eq!(repo.resolve("HEAD~2").unwrap(), repo.c1);
        assert_eq!(repo.resolve("master~").unwrap(), repo.c2);
        assert_eq!(repo.resolve("HEAD^0").unwrap(), repo.c3);
    }

    #[rstest]
    fn numbered_parent_selects_merge_parent(repo: Repo) {
        assert_eq!(repo.resolve("topic^1").unwrap(), repo.c3);
        assert_eq!(repo.resolve("topic^2").unwrap(), repo.side);
        assert!(matches!(
            repo.resolve("topic^3"),
            Err(Error::NoSuchParent(oid)) if oid == repo.merge
        ));
    }

    #[rstest]
    fn root_commit_has_no_parent(repo: Repo) {
        assert!(matches!(
            repo.resolve("HEAD~3"),
            Err(Error::NoSuchParent(oid)) if oid == repo.c1
        ));
    }

    #[rstest]
    fn full_ref_paths_resolve_directly(repo: Repo) {
        assert_eq!(repo.resolve("refs/heads/topic").unwrap(), repo.merge);
    }

    #[rstest]
    fn branches_shadow_tags_of_the_same_name(repo: Repo) {
        let name = RefName::try_parse("release").unwrap();
        repo.refs.create_tag(&name, &repo.c1).unwrap();
        assert_eq!(repo.resolve("release").unwrap(), repo.c1);

        repo.refs.create_branch(&name, &repo.c2).unwrap();
        assert_eq!(repo.resolve("release").unwrap(), repo.c2);
        assert_eq!(repo.resolve("refs/tags/release").unwrap(), repo.c1);
    }

    #[rstest]
    fn branch_named_like_a_prefix_shadows_the_object(repo: Repo) {
        let prefix = &repo.c1.as_ref()[..6];
        repo.refs
            .create_branch(&RefName::try_parse(prefix).unwrap(), &repo.c3)
            .unwrap();

        assert_eq!(repo.resolve(prefix).unwrap(), repo.c3);
    }

    #[rstest]
    fn hex_prefixes_expand_to_objects(repo: Repo) {
        assert_eq!(repo.resolve(&repo.c2.as_ref()[..8]).unwrap(), repo.c2);
        assert_eq!(repo.resolve(repo.c2.as_ref()).unwrap(), repo.c2);
        assert_eq!(
            repo.resolve(&format!("{}^", &repo.c2.as_ref()[..8])).unwrap(),
            repo.c1
        );
    }

    #[rstest]
    #[case("nosuchbranch")]
    #[case("abc")]
    #[case("0000000000")]
    fn unmatched_names_are_unknown(repo: Repo, #[case] expression: &str) {
        assert!(matches!(
            repo.resolve(expression),
            Err(Error::UnknownRevision(_))
        ));
    }

    #[rstest]
    fn peeling_to_tree_and_commit(repo: Repo) {
        assert_eq!(repo.resolve("HEAD^{tree}").unwrap(), repo.tree);
        assert_eq!(repo.resolve("HEAD^{commit}").unwrap(), repo.c3);
        assert_eq!(repo.resolve("HEAD~1^{tree}").unwrap(), repo.tree);

        let blob_tree = format!("{}^{{tree}}", repo.blob);
        assert!(matches!(
            repo.resolve(&blob_tree),
            Err(Error::ObjectTypeMismatch { expected: ObjectType::Tree, actual: ObjectType::Blob, .. })
        ));
    }

    #[rstest]
    fn annotated_tags_peel_to_their_commit(repo: Repo) {
        let tagger = Identity::try_from("T <t@x> 500 +0000").unwrap();
        let tag = Tag::new(
            repo.c2.clone(),
            ObjectType::Commit,
            "v1".to_string(),
            tagger,
            "first\n".to_string(),
        );
        let tag_oid = repo.database.store(&tag).unwrap();
        repo.refs
            .create_tag(&RefName::try_parse("v1").unwrap(), &tag_oid)
            .unwrap();

        assert_eq!(repo.resolve("v1").unwrap(), tag_oid);
        assert_eq!(repo.resolve("v1^{tag}").unwrap(), tag_oid);
        assert_eq!(repo.resolve("v1^{}").unwrap(), repo.c2);
        assert_eq!(repo.resolve("v1^{commit}").unwrap(), repo.c2);
        assert_eq!(repo.resolve("v1^").unwrap(), repo.c1);
        assert_eq!(repo.resolve("v1~0").unwrap(), repo.c2);
        assert_eq!(repo.resolver().resolve_commit("v1").unwrap(), repo.c2);
        assert!(matches!(
            repo.resolve("HEAD^{tag}"),
            Err(Error::ObjectTypeMismatch { expected: ObjectType::Tag, .. })
        ));
    }

    #[rstest]
    fn paths_resolve_inside_the_commit_tree(repo: Repo) {
        assert_eq!(repo.resolve("HEAD:a.txt").unwrap(), repo.blob);
        assert_eq!(repo.resolve("master:dir/b.txt").unwrap(), repo.blob);
        assert_eq!(repo.resolve("HEAD:").unwrap(), repo.tree);

        let dir = repo.resolve("HEAD:dir").unwrap();
        assert_eq!(repo.database.object_kind(&dir).unwrap(), ObjectType::Tree);
    }

    #[rstest]
    #[case("HEAD:missing.txt", "missing.txt")]
    #[case("HEAD:dir/nope", "dir/nope")]
    #[case("HEAD:a.txt/inner", "a.txt/inner")]
    fn absent_paths_name_the_revision(repo: Repo, #[case] expression: &str, #[case] expected: &str) {
        match repo.resolve(expression) {
            Err(Error::PathNotFound { revision, path }) => {
                assert_eq!(revision, "HEAD");
                assert_eq!(path, expected);
            }
            other => panic!("expected PathNotFound, got {other:?}"),
        }
    }

    #[test]
    fn unborn_head_is_unknown() {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects"), 4);
        let refs = Refs::new(dir.path().to_path_buf());
        refs.set_head_to_branch(&RefName::try_parse("master").unwrap())
            .unwrap();

        let resolver = RevisionResolver::new(&database, &refs);

        assert!(matches!(
            resolver.resolve("HEAD"),
            Err(Error::UnknownRevision(_))
        ));
    }
}
