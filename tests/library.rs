use assert_fs::TempDir;
use assert_fs::prelude::*;
use minigit::Error;
use minigit::areas::atomic::TEMP_PREFIX;
use minigit::areas::repository::Repository;
use minigit::artifacts::index::entry_mode::{EntryMode, FileMode};
use minigit::artifacts::index::index_entry::IndexEntry;
use minigit::artifacts::objects::codec;
use minigit::artifacts::objects::commit::{Commit, Identity};
use minigit::artifacts::objects::object_id::ObjectId;
use minigit::artifacts::objects::object_type::ObjectType;
use minigit::artifacts::objects::tree_builder::TreeBuilder;
use minigit::artifacts::refs::ref_name::SymRefName;
use minigit::commands::porcelain::add::AddMode;
use minigit::config::Config;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use std::path::PathBuf;

const HI_BLOB: &str = "32f95c0d1244a78b2be1bab8de17906fabb2c4a8";
const HI_TREE: &str = "959186c87f11cedbc03fb0aa728575ce3dbf3335";

fn identity_at(minute: u32) -> Identity {
    Identity::try_from(format!("Tester <tester@example.com> {} +0000", 1_700_000_000 + minute * 60).as_str())
        .expect("valid identity")
}

fn config_at(minute: u32) -> Config {
    Config {
        author: Some(identity_at(minute)),
        committer: Some(identity_at(minute)),
        ..Config::default()
    }
}

/// Workspace with an initialised repository and a clock fixed at minute 0
struct Fixture {
    dir: TempDir,
    repository: Repository,
}

impl Fixture {
    /// Reopen with the clock at `minute`, as a later process would
    fn at(&mut self, minute: u32) -> &Repository {
        self.repository =
            Repository::open(self.dir.path(), config_at(minute)).expect("repository reopens");
        &self.repository
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    fn write(&self, relative: &str, content: &str) {
        self.dir.child(relative).write_str(content).unwrap();
    }

    fn staged_names(&self) -> Vec<String> {
        self.repository
            .ls_files()
            .unwrap()
            .into_iter()
            .map(|entry| entry.name)
            .collect()
    }
}

#[fixture]
fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let repository = Repository::init(dir.path(), config_at(0)).unwrap();
    Fixture { dir, repository }
}

#[rstest]
fn staging_committing_and_resolving_a_single_file(fixture: Fixture) {
    let repository = &fixture.repository;
    let database = repository.database();

    let blob = database.put(ObjectType::Blob, b"hi").unwrap();
    assert_eq!(blob.as_ref(), HI_BLOB);

    let entry = IndexEntry::staged("a.txt".into(), blob.clone(), FileMode::Regular, None);
    let tree = TreeBuilder::build_from_index(database, [&entry]).unwrap();
    assert_eq!(tree.as_ref(), HI_TREE);

    let commit = Commit::new(
        tree.clone(),
        vec![],
        identity_at(0),
        identity_at(0),
        "first\n".into(),
    );
    let commit_oid = database.store(&commit).unwrap();
    repository.refs().update_head(&commit_oid).unwrap();

    assert_eq!(repository.rev_parse("HEAD").unwrap(), commit_oid);
    assert_eq!(repository.rev_parse("master").unwrap(), commit_oid);

    let decoded = database.parse_object_as_tree(&tree).unwrap();
    assert_eq!(decoded.len(), 1);
    let only = &decoded.entries()[0];
    assert_eq!(only.name, "a.txt");
    assert_eq!(only.mode, EntryMode::File(FileMode::Regular));
    assert_eq!(only.mode.as_str(), "100644");
    assert_eq!(only.oid, blob);
}

#[rstest]
fn add_and_commit_produce_the_same_objects(fixture: Fixture) {
    fixture.write("a.txt", "hi");
    let repository = &fixture.repository;

    let outcome = repository.add(&[fixture.path("a.txt")], AddMode::Paths).unwrap();
    assert_eq!(outcome.staged, vec!["a.txt".to_string()]);

    let commit = repository.commit("first", false).unwrap();
    assert!(commit.root);
    assert_eq!(commit.branch.as_deref(), Some("master"));
    assert_eq!(commit.summary, "first");
    assert_eq!(repository.rev_parse("HEAD^{tree}").unwrap().as_ref(), HI_TREE);
    assert_eq!(repository.rev_parse("HEAD:a.txt").unwrap().as_ref(), HI_BLOB);
}

#[rstest]
fn putting_the_same_content_twice_stores_one_object(fixture: Fixture) {
    let database = fixture.repository.database();

    let first = database.put(ObjectType::Blob, b"same bytes").unwrap();
    let second = database.put(ObjectType::Blob, b"same bytes").unwrap();

    assert_eq!(first, second);
    assert_eq!(first, codec::hash(ObjectType::Blob, b"same bytes"));
    assert_eq!(database.find_objects_by_prefix(&first.as_ref()[..6]).unwrap(), vec![first.clone()]);

    let (kind, body) = database.get(&first).unwrap();
    assert_eq!(kind, ObjectType::Blob);
    assert_eq!(body.as_ref(), b"same bytes");
}

#[rstest]
fn tree_hash_ignores_staging_order(fixture: Fixture) {
    let database = fixture.repository.database();
    let h1 = database.put(ObjectType::Blob, b"1").unwrap();
    let h2 = database.put(ObjectType::Blob, b"2").unwrap();
    let a = IndexEntry::staged("a".into(), h1, FileMode::Regular, None);
    let b = IndexEntry::staged("dir/b".into(), h2, FileMode::Executable, None);

    let forward = TreeBuilder::build_from_index(database, [&a, &b]).unwrap();
    let backward = TreeBuilder::build_from_index(database, [&b, &a]).unwrap();

    assert_eq!(forward, backward);
}

#[rstest]
fn revision_suffixes_chain_left_to_right(mut fixture: Fixture) {
    let mut commits = Vec::new();
    for (minute, content) in ["one", "two", "three"].into_iter().enumerate() {
        fixture.write("file.txt", content);
        let path = fixture.path("file.txt");
        let repository = fixture.at(minute as u32);
        repository.add(&[path], AddMode::Paths).unwrap();
        commits.push(repository.commit(content, false).unwrap().oid);
    }
    let repository = &fixture.repository;

    assert_eq!(repository.rev_parse("HEAD").unwrap(), commits[2]);
    assert_eq!(repository.rev_parse("HEAD^").unwrap(), commits[1]);
    assert_eq!(repository.rev_parse("HEAD^^").unwrap(), commits[0]);
    assert_eq!(repository.rev_parse("HEAD~2").unwrap(), commits[0]);
    assert_eq!(repository.rev_parse("@~1^").unwrap(), commits[0]);
    assert!(matches!(
        repository.rev_parse("HEAD^^^"),
        Err(Error::NoSuchParent(oid)) if oid == commits[0]
    ));

    let history = repository.log(&[], None).unwrap();
    let order: Vec<ObjectId> = history.commits.into_iter().map(|(oid, _)| oid).collect();
    assert_eq!(order, vec![commits[2].clone(), commits[1].clone(), commits[0].clone()]);
    assert!(history.skipped.is_empty());
}

#[rstest]
fn unique_and_ambiguous_short_hashes(fixture: Fixture) {
    let database = fixture.repository.database();

    // brute force two blobs sharing a four-character prefix
    let mut seen: std::collections::HashMap<String, ObjectId> = Default::default();
    let (first, second) = (0u32..)
        .find_map(|n| {
            let oid = database.put(ObjectType::Blob, n.to_string().as_bytes()).unwrap();
            let prefix = oid.as_ref()[..4].to_string();
            seen.insert(prefix, oid.clone()).map(|previous| (previous, oid))
        })
        .unwrap();
    let shared = &first.as_ref()[..4];

    assert!(matches!(
        fixture.repository.rev_parse(shared),
        Err(Error::AmbiguousHash { candidates, .. }) if candidates.len() == 2
    ));

    let longer = (5..=40)
        .map(|len| &first.as_ref()[..len])
        .find(|prefix| !second.as_ref().starts_with(prefix))
        .unwrap();
    assert_eq!(fixture.repository.rev_parse(longer).unwrap(), first);
}

#[rstest]
fn interrupted_ref_write_leaves_the_old_value(mut fixture: Fixture) {
    fixture.write("a.txt", "hi");
    let path = fixture.path("a.txt");
    let repository = fixture.at(0);
    repository.add(&[path], AddMode::Paths).unwrap();
    let committed = repository.commit("first", false).unwrap().oid;

    // a writer that died before its rename leaves only the temp file
    fixture
        .dir
        .child(format!(".git/refs/heads/{TEMP_PREFIX}master"))
        .write_str("0000000000000000000000000000000000000000\n")
        .unwrap();

    let repository = fixture.at(1);
    assert_eq!(repository.rev_parse("master").unwrap(), committed);
    assert_eq!(
        repository.refs().list_branches().unwrap(),
        vec![SymRefName::try_parse("refs/heads/master").unwrap()]
    );
}

#[rstest]
fn add_stages_new_files_then_applies_deletions(fixture: Fixture) {
    fixture.write("keep.txt", "keep");
    fixture.write("gone.txt", "gone");
    fixture.write("dir/nested.txt", "nested");
    let repository = &fixture.repository;
    repository.add(&[fixture.path(".")], AddMode::Paths).unwrap();
    assert_eq!(fixture.staged_names(), vec!["dir/nested.txt", "gone.txt", "keep.txt"]);

    std::fs::remove_file(fixture.path("gone.txt")).unwrap();
    fixture.write("keep.txt", "changed");
    fixture.write("new.txt", "new");

    let outcome = repository.add(&[fixture.path(".")], AddMode::Paths).unwrap();

    assert_eq!(outcome.staged, vec!["keep.txt", "new.txt"]);
    assert_eq!(outcome.removed, vec!["gone.txt"]);
    assert_eq!(fixture.staged_names(), vec!["dir/nested.txt", "keep.txt", "new.txt"]);
}

#[rstest]
#[case::named_path(AddMode::Paths, true)]
#[case::whole_tree(AddMode::All, false)]
fn file_turned_into_a_directory_keeps_its_new_contents(
    fixture: Fixture,
    #[case] mode: AddMode,
    #[case] name_the_path: bool,
) {
    fixture.write("a", "file");
    let repository = &fixture.repository;
    repository.add(&[fixture.path("a")], AddMode::Paths).unwrap();

    std::fs::remove_file(fixture.path("a")).unwrap();
    fixture.write("a/b", "nested");
    let paths = if name_the_path { vec![fixture.path("a")] } else { vec![] };
    let outcome = repository.add(&paths, mode).unwrap();

    assert_eq!(outcome.staged, vec!["a/b"]);
    assert_eq!(outcome.removed, vec!["a"]);
    assert_eq!(fixture.staged_names(), vec!["a/b"]);
}

#[rstest]
fn tracked_mode_skips_untracked_files(fixture: Fixture) {
    fixture.write("tracked.txt", "v1");
    let repository = &fixture.repository;
    repository.add(&[fixture.path("tracked.txt")], AddMode::Paths).unwrap();

    fixture.write("tracked.txt", "v2");
    fixture.write("untracked.txt", "new");
    let outcome = repository.add(&[], AddMode::Tracked).unwrap();

    assert_eq!(outcome.staged, vec!["tracked.txt"]);
    assert_eq!(fixture.staged_names(), vec!["tracked.txt"]);

    let outcome = repository.add(&[], AddMode::All).unwrap();
    assert_eq!(outcome.staged, vec!["untracked.txt"]);
    assert_eq!(fixture.staged_names(), vec!["tracked.txt", "untracked.txt"]);
}

#[rstest]
fn unmatched_paths_are_ignored_and_restaging_is_a_no_op(fixture: Fixture) {
    fixture.write("a.txt", "a");
    let repository = &fixture.repository;

    let outcome = repository
        .add(&[fixture.path("a.txt"), fixture.path("missing.txt")], AddMode::Paths)
        .unwrap();
    assert_eq!(outcome.staged, vec!["a.txt"]);
    assert_eq!(outcome.ignored.len(), 1);
    assert!(outcome.ignored[0].ends_with("missing.txt"));

    let again = repository.add(&[fixture.path("a.txt")], AddMode::Paths).unwrap();
    assert!(again.is_empty());
}

#[rstest]
fn paths_outside_the_workspace_are_rejected(fixture: Fixture) {
    let outside = fixture.dir.path().join("..").join("elsewhere.txt");

    let result = fixture.repository.add(&[outside], AddMode::Paths);

    assert!(matches!(result, Err(Error::InvalidPath(_))));
    assert!(fixture.staged_names().is_empty());
}

#[rstest]
fn discover_finds_the_root_from_a_subdirectory(fixture: Fixture) {
    fixture.write("deep/er/file.txt", "x");

    let found = Repository::discover(&fixture.path("deep/er"), Config::default()).unwrap();

    assert_eq!(found.root(), fixture.repository.root());
    assert!(matches!(
        Repository::open(&fixture.path("deep"), Config::default()),
        Err(Error::NotARepository(_))
    ));
}

#[rstest]
fn annotated_tags_peel_to_their_commit(mut fixture: Fixture) {
    fixture.write("a.txt", "hi");
    let path = fixture.path("a.txt");
    let repository = fixture.at(0);
    repository.add(&[path], AddMode::Paths).unwrap();
    let commit = repository.commit("tagged", false).unwrap().oid;

    let repository = fixture.at(3);
    let tag = repository.tag_create("v1", None, Some("release")).unwrap();
    repository.tag_create("light", Some("HEAD"), None).unwrap();

    assert_ne!(tag, commit);
    assert_eq!(repository.rev_parse("v1").unwrap(), tag);
    assert_eq!(repository.rev_parse("v1^{}").unwrap(), commit);
    assert_eq!(repository.rev_parse("v1^0").unwrap(), commit);
    assert_eq!(repository.rev_parse("light").unwrap(), commit);
    assert_eq!(repository.tag_list().unwrap(), vec!["light", "v1"]);

    let decorations = repository.decorations().unwrap();
    let mut names: Vec<&str> = decorations[&commit]
        .iter()
        .map(|name| name.as_ref_path())
        .collect();
    names.sort();
    assert_eq!(names, vec!["refs/heads/master", "refs/tags/light", "refs/tags/v1"]);
}
