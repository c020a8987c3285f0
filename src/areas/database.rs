//! Object database
//!
//! Content-addressed, write-once store. Each object lives zlib-compressed at
//! `objects/<2-hex>/<38-hex>`. Writes are idempotent and need no locking:
//! racing writers of the same id produce identical bytes, and each lands via
//! its own temp file and an atomic rename.

use crate::areas::atomic::write_atomically;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::codec;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox};
use crate::artifacts::objects::object_id::{ObjectId, is_hex};
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use crate::artifacts::objects::{OBJECT_ID_LENGTH, OBJECT_SHARD_LENGTH};
use crate::errors::{Error, IoResultExt, Result};
use bytes::Bytes;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Database {
    /// The `objects` directory
    path: PathBuf,
    min_abbrev_len: usize,
    /// Decoded objects seen during this process
    cache: RefCell<HashMap<ObjectId, ObjectBox>>,
}

impl Database {
    pub fn new(path: PathBuf, min_abbrev_len: usize) -> Self {
        Database {
            path,
            min_abbrev_len: min_abbrev_len.max(OBJECT_SHARD_LENGTH),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    fn object_path(&self, oid: &ObjectId) -> PathBuf {
        self.path.join(oid.to_path())
    }

    /// Store `body` as an object of `kind`, returning its id. A no-op when
    /// the object is already present.
    pub fn put(&self, kind: ObjectType, body: &[u8]) -> Result<ObjectId> {
        let oid = codec::hash(kind, body);
        let object_path = self.object_path(&oid);

        if object_path.exists() {
            tracing::trace!(%oid, %kind, "object already stored");
            return Ok(oid);
        }

        let compressed = Self::compress(&codec::frame(kind, body))?;
        write_atomically(&object_path, &compressed)?;
        tracing::debug!(%oid, %kind, size = body.len(), "object written");

        Ok(oid)
    }

    /// Encode and store an object
    pub fn store(&self, object: &impl Object) -> Result<ObjectId> {
        let body = object.serialize()?;
        self.put(object.object_type(), &body)
    }

    /// Kind and body of the object with the given full id
    pub fn get(&self, oid: &ObjectId) -> Result<(ObjectType, Bytes)> {
        let object_path = self.object_path(oid);
        let compressed = match std::fs::read(&object_path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ObjectNotFound(oid.to_string()));
            }
            Err(err) => {
                return Err(Error::io(format!("unable to read object {oid}"), err));
            }
        };

        let framed = Self::decompress(&compressed)
            .map_err(|_| Error::malformed(format!("object {oid} is not valid zlib data")))?;
        codec::unframe(&framed)
    }

    /// Like [`get`](Self::get) but accepting an abbreviated id
    pub fn get_by_prefix(&self, prefix: &str) -> Result<(ObjectId, ObjectType, Bytes)> {
        let oid = self.resolve_abbreviation(prefix)?;
        let (kind, body) = self.get(&oid)?;

        Ok((oid, kind, body))
    }

    pub fn exists(&self, oid: &ObjectId) -> bool {
        self.object_path(oid).is_file()
    }

    pub fn object_kind(&self, oid: &ObjectId) -> Result<ObjectType> {
        if let Some(object) = self.cache.borrow().get(oid) {
            return Ok(object.object_type());
        }
        let (kind, _) = self.get(oid)?;
        Ok(kind)
    }

    /// Expand a hex prefix of at least the minimum length to the one object
    /// id it matches.
    pub fn resolve_abbreviation(&self, prefix: &str) -> Result<ObjectId> {
        let prefix = prefix.to_ascii_lowercase();
        if prefix.len() < self.min_abbrev_len || prefix.len() > OBJECT_ID_LENGTH || !is_hex(&prefix) {
            return Err(Error::ObjectNotFound(prefix));
        }

        let mut matches = self.find_objects_by_prefix(&prefix)?;
        match matches.len() {
            0 => Err(Error::ObjectNotFound(prefix)),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::AmbiguousHash {
                prefix,
                candidates: matches,
            }),
        }
    }

    /// All stored ids starting with `prefix` (at least two hex characters),
    /// sorted
    pub fn find_objects_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>> {
        if prefix.len() < OBJECT_SHARD_LENGTH {
            return Ok(Vec::new());
        }
        let (dir_name, file_prefix) = prefix.split_at(OBJECT_SHARD_LENGTH);
        let dir_path = self.path.join(dir_name);

        let entries = match std::fs::read_dir(&dir_path) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Error::io(format!("unable to list {}", dir_path.display()), err)),
        };

        let mut matches = Vec::new();
        for entry in entries {
            let entry = entry.with_path("list", &dir_path)?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };

            // in-flight temp files fail to parse and are skipped
            if file_name.starts_with(file_prefix)
                && let Ok(oid) = ObjectId::try_parse(format!("{dir_name}{file_name}"))
            {
                matches.push(oid);
            }
        }
        matches.sort();

        Ok(matches)
    }

    /// Decode an object, memoized for the life of this handle
    pub fn parse_object(&self, oid: &ObjectId) -> Result<ObjectBox> {
        if let Some(object) = self.cache.borrow().get(oid) {
            return Ok(object.clone());
        }

        let (kind, body) = self.get(oid)?;
        let object = codec::decode(kind, &body)?;
        self.cache.borrow_mut().insert(oid.clone(), object.clone());

        Ok(object)
    }

    fn mismatch(oid: &ObjectId, expected: ObjectType, actual: &ObjectBox) -> Error {
        Error::ObjectTypeMismatch {
            oid: oid.clone(),
            expected,
            actual: actual.object_type(),
        }
    }

    pub fn parse_object_as_blob(&self, oid: &ObjectId) -> Result<Blob> {
        match self.parse_object(oid)? {
            ObjectBox::Blob(blob) => Ok(blob),
            other => Err(Self::mismatch(oid, ObjectType::Blob, &other)),
        }
    }

    pub fn parse_object_as_tree(&self, oid: &ObjectId) -> Result<Tree> {
        match self.parse_object(oid)? {
            ObjectBox::Tree(tree) => Ok(tree),
            other => Err(Self::mismatch(oid, ObjectType::Tree, &other)),
        }
    }

    pub fn parse_object_as_commit(&self, oid: &ObjectId) -> Result<Commit> {
        match self.parse_object(oid)? {
            ObjectBox::Commit(commit) => Ok(commit),
            other => Err(Self::mismatch(oid, ObjectType::Commit, &other)),
        }
    }

    pub fn parse_object_as_tag(&self, oid: &ObjectId) -> Result<Tag> {
        match self.parse_object(oid)? {
            ObjectBox::Tag(tag) => Ok(tag),
            other => Err(Self::mismatch(oid, ObjectType::Tag, &other)),
        }
    }

    fn compress(data: &[u8]) -> Result<Bytes> {
        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(data)
            .io_context(|| "unable to compress object content")?;

        encoder
            .finish()
            .map(Bytes::from)
            .io_context(|| "unable to finish compressing object content")
    }

    fn decompress(data: &[u8]) -> std::io::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut content = Vec::new();
        decoder.read_to_end(&mut content)?;

        Ok(content.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
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

    fn stored_files(database: &Database) -> usize {
        walkdir::WalkDir::new(database.objects_path())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .count()
    }

    #[rstest]
    fn put_then_get_returns_the_same_object(db: Fixture) {
        let oid = db.database.put(ObjectType::Blob, b"hi").unwrap();

        assert_eq!(oid.as_ref(), "32f95c0d1244a78b2be1bab8de17906fabb2c4a8");
        let (kind, body) = db.database.get(&oid).unwrap();
        assert_eq!(kind, ObjectType::Blob);
        assert_eq!(body.as_ref(), b"hi");
    }

    #[rstest]
    fn identical_content_is_stored_once(db: Fixture) {
        let first = db.database.put(ObjectType::Blob, b"same").unwrap();
        let second = db.database.put(ObjectType::Blob, b"same").unwrap();

        assert_eq!(first, second);
        assert_eq!(stored_files(&db.database), 1);
    }

    #[rstest]
    fn stored_file_is_zlib_of_framed_object(db: Fixture) {
        let oid = db.database.put(ObjectType::Blob, b"hi").unwrap();

        let raw = std::fs::read(db.database.objects_path().join(oid.to_path())).unwrap();
        let framed = Database::decompress(&raw).unwrap();

        assert_eq!(framed.as_ref(), b"blob 2\0hi");
    }

    #[rstest]
    fn missing_object_is_not_found(db: Fixture) {
        let oid = ObjectId::try_parse("4b825dc642cb6eb9a060e54bf8d69288fbee4904").unwrap();
        assert!(matches!(db.database.get(&oid), Err(Error::ObjectNotFound(_))));
    }

    #[rstest]
    fn corrupt_file_is_malformed(db: Fixture) {
        let oid = db.database.put(ObjectType::Blob, b"hi").unwrap();
        std::fs::write(db.database.objects_path().join(oid.to_path()), b"garbage").unwrap();

        assert!(matches!(db.database.get(&oid), Err(Error::MalformedObject(_))));
    }

    #[rstest]
    fn typed_reads_reject_other_kinds(db: Fixture) {
        let oid = db.database.store(&Blob::new("x")).unwrap();

        assert!(matches!(
            db.database.parse_object_as_tree(&oid),
            Err(Error::ObjectTypeMismatch {
                expected: ObjectType::Tree,
                actual: ObjectType::Blob,
                ..
            })
        ));
        assert_eq!(db.database.object_kind(&oid).unwrap(), ObjectType::Blob);
    }

    #[rstest]
    fn unique_prefix_resolves(db: Fixture) {
        let oid = db.database.put(ObjectType::Blob, b"hi").unwrap();

        assert_eq!(db.database.resolve_abbreviation("32f9").unwrap(), oid);
        assert_eq!(db.database.resolve_abbreviation("32F95C0").unwrap(), oid);
        let (found, kind, _) = db.database.get_by_prefix("32f95").unwrap();
        assert_eq!((found, kind), (oid, ObjectType::Blob));
    }

    #[rstest]
    #[case("32f")]
    #[case("ffff")]
    #[case("xyz1")]
    fn unusable_prefixes_are_not_found(db: Fixture, #[case] prefix: &str) {
        db.database.put(ObjectType::Blob, b"hi").unwrap();

        assert!(matches!(
            db.database.resolve_abbreviation(prefix),
            Err(Error::ObjectNotFound(_))
        ));
    }

    #[rstest]
    fn shared_prefix_is_ambiguous(db: Fixture) {
        // two ids that agree on their first 4 hex digits
        let (a, b) = colliding_pair(&db.database);

        let err = db.database.resolve_abbreviation(&a.as_ref()[..4]).unwrap_err();

        match err {
            Error::AmbiguousHash { candidates, .. } => {
                assert!(candidates.contains(&a) && candidates.contains(&b));
            }
            other => panic!("expected AmbiguousHash, got {other:?}"),
        }
        let longer = (4..=OBJECT_ID_LENGTH)
            .find(|&n| a.as_ref()[..n] != b.as_ref()[..n])
            .unwrap();
        assert_eq!(db.database.resolve_abbreviation(&a.as_ref()[..longer]).unwrap(), a);
    }

    /// Store blobs until two ids share a 4-hex-digit prefix
    fn colliding_pair(database: &Database) -> (ObjectId, ObjectId) {
        let mut seen: HashMap<String, ObjectId> = HashMap::new();
        for n in 0u32.. {
            let oid = database.put(ObjectType::Blob, n.to_string().as_bytes()).unwrap();
            if let Some(previous) = seen.insert(oid.abbreviate(4), oid.clone()) {
                return (previous, oid);
            }
        }
        unreachable!()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn content_addressing_round_trips(body in proptest::collection::vec(any::<u8>(), 0..512)) {
            let dir = TempDir::new().unwrap();
            let database = Database::new(dir.path().join("objects"), 4);

            let oid = database.put(ObjectType::Blob, &body).unwrap();

            prop_assert_eq!(&oid, &codec::hash(ObjectType::Blob, &body));
            let (kind, stored) = database.get(&oid).unwrap();
            prop_assert_eq!(kind, ObjectType::Blob);
            prop_assert_eq!(stored.as_ref(), body.as_slice());
        }
    }
}
