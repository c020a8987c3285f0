//! Index (staging area)
//!
//! Ordered mapping of repository-relative path to the staged blob, persisted
//! as a version 2 `DIRC` file. Each command runs one load/mutate/save cycle;
//! nothing survives in memory between invocations and there is no lock file.
//! Concurrent savers race and the last rename wins.
//!
//! ## Index File Format
//!
//! - Header: signature, version, and entry count
//! - Entries: sorted by path, 8-byte aligned
//! - Checksum: SHA-1 of everything before it

use crate::areas::atomic::write_atomically;
use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::entry_mode::FileMode;
use crate::artifacts::index::index_entry::{
    ENTRY_BLOCK, ENTRY_MIN_SIZE, EntryMetadata, IndexEntry, parent_dirs, validate_path,
};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::HEADER_SIZE;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, IoResultExt, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (typically `.git/index`)
    path: PathBuf,
    entries: BTreeMap<String, IndexEntry>,
    /// Directory -> staged paths below it, for file/directory replacement
    children: BTreeMap<String, BTreeSet<String>>,
}

impl Index {
    pub fn new(path: PathBuf) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted index. A missing or empty file is an empty index.
    pub fn load(path: PathBuf) -> Result<Self> {
        let mut index = Index::new(path);

        let file = match std::fs::File::open(&index.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(index),
            Err(err) => return Err(Error::io(format!("unable to open {}", index.path.display()), err)),
        };
        let size = file.metadata().with_path("stat", &index.path)?.len();
        if size == 0 {
            return Ok(index);
        }

        let mut reader = Checksum::new(BufReader::new(file));
        let entries_count = Self::parse_header(&mut reader)?;
        index.parse_entries(entries_count, &mut reader)?;
        reader.verify()?;

        tracing::trace!(entries = index.len(), path = %index.path.display(), "index loaded");
        Ok(index)
    }

    fn parse_header<R: std::io::Read>(reader: &mut Checksum<R>) -> Result<u32> {
        let header_bytes = reader.read(HEADER_SIZE)?;
        let header = IndexHeader::deserialize(Cursor::new(header_bytes))?;
        header.validate()?;

        Ok(header.entries_count)
    }

    fn parse_entries<R: std::io::Read>(
        &mut self,
        entries_count: u32,
        reader: &mut Checksum<R>,
    ) -> Result<()> {
        for _ in 0..entries_count {
            let mut entry_bytes = reader.read(ENTRY_MIN_SIZE)?.to_vec();

            // names are NUL-padded to the block size, so the last byte of a
            // complete entry is always zero
            while entry_bytes.last() != Some(&0) {
                entry_bytes.extend_from_slice(&reader.read(ENTRY_BLOCK)?);
            }

            let entry = IndexEntry::parse(&entry_bytes)?;
            if self.entries.contains_key(&entry.name) {
                return Err(Error::CorruptIndex(format!("duplicate entry '{}'", entry.name)));
            }
            self.store_entry(entry);
        }

        Ok(())
    }

    /// Insert or overwrite the entry for `path`.
    ///
    /// Staging `a/b` drops a staged file `a`; staging file `a` drops every
    /// staged `a/...`.
    pub fn stage(
        &mut self,
        path: &str,
        oid: ObjectId,
        mode: FileMode,
        stat: Option<EntryMetadata>,
    ) -> Result<()> {
        validate_path(path)?;
        let entry = IndexEntry::staged(path.to_string(), oid, mode, stat);

        self.discard_conflicts(&entry);
        self.store_entry(entry);

        Ok(())
    }

    /// Remove `path` and anything staged below it. Absent paths are a no-op.
    pub fn unstage(&mut self, path: &str) -> bool {
        let path = path.trim_end_matches('/');
        let removed = self.remove_entry(path);
        let removed_children = self.remove_children(path);

        removed || removed_children
    }

    /// Remove the file entry at exactly `path`, leaving anything staged
    /// below a directory of the same name alone
    pub fn unstage_file(&mut self, path: &str) -> bool {
        self.remove_entry(path)
    }

    fn discard_conflicts(&mut self, entry: &IndexEntry) {
        for parent in entry.parent_dirs() {
            self.remove_entry(parent);
        }
        self.remove_children(&entry.name);
    }

    fn store_entry(&mut self, entry: IndexEntry) {
        for parent in entry.parent_dirs() {
            self.children
                .entry(parent.to_string())
                .or_default()
                .insert(entry.name.clone());
        }

        self.entries.insert(entry.name.clone(), entry);
    }

    fn remove_children(&mut self, path: &str) -> bool {
        match self.children.remove(path) {
            Some(children) => {
                for child in children {
                    self.remove_entry(&child);
                }
                true
            }
            None => false,
        }
    }

    fn remove_entry(&mut self, path: &str) -> bool {
        let Some(entry) = self.entries.remove(path) else {
            return false;
        };

        for parent in entry.parent_dirs() {
            if let Some(children) = self.children.get_mut(parent) {
                children.remove(path);
                if children.is_empty() {
                    self.children.remove(parent);
                }
            }
        }

        true
    }

    /// Persist the whole index, replacing the previous file atomically
    pub fn save(&self) -> Result<()> {
        let mut writer = Checksum::new(Vec::new());

        let header = IndexHeader::for_entries(self.entries.len() as u32);
        writer.write(&header.serialize()?)?;
        for entry in self.entries() {
            writer.write(&entry.serialize()?)?;
        }
        writer.write_checksum()?;

        write_atomically(&self.path, &writer.into_inner())?;
        tracing::debug!(entries = self.len(), path = %self.path.display(), "index saved");

        Ok(())
    }

    /// Entries in path order
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn into_entries(self) -> impl Iterator<Item = IndexEntry> {
        self.entries.into_values()
    }

    pub fn entry(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// True when `path` is a staged file or a directory containing one
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path) || self.children.contains_key(path)
    }

    /// Entries at or below `prefix`; `""` or `"."` means all of them
    pub fn entries_under<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a IndexEntry> + 'a {
        let prefix = prefix.trim_end_matches('/');
        self.entries.values().filter(move |entry| {
            prefix.is_empty()
                || prefix == "."
                || entry.name == prefix
                || parent_dirs(&entry.name).contains(&prefix)
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn oid() -> ObjectId {
        ObjectId::try_parse("e69de29bb2d1d6434b8b29ae775ad8c2e48c5391").unwrap()
    }

    #[fixture]
    fn dir() -> TempDir {
        TempDir::new().unwrap()
    }

    fn paths(index: &Index) -> Vec<&str> {
        index.entries().map(|e| e.name.as_str()).collect()
    }

    #[rstest]
    fn missing_file_loads_as_empty(dir: TempDir) {
        let index = Index::load(dir.path().join("index")).unwrap();
        assert!(index.is_empty());
    }

    #[rstest]
    fn entries_come_back_sorted_after_save(dir: TempDir, oid: ObjectId) {
        let path = dir.path().join("index");
        let mut index = Index::new(path.clone());
        index.stage("z.txt", oid.clone(), FileMode::Regular, None).unwrap();
        index.stage("a/b.txt", oid.clone(), FileMode::Executable, None).unwrap();
        index.stage("a.txt", oid, FileMode::Regular, None).unwrap();
        index.save().unwrap();

        let loaded = Index::load(path).unwrap();

        assert_eq!(paths(&loaded), vec!["a.txt", "a/b.txt", "z.txt"]);
        assert_eq!(
            loaded.entry("a/b.txt").unwrap().metadata.file_mode(),
            FileMode::Executable
        );
    }

    #[rstest]
    fn file_replaces_directory(oid: ObjectId) {
        let mut index = Index::new(PathBuf::from("index"));
        index.stage("a/b/c.txt", oid.clone(), FileMode::Regular, None).unwrap();
        index.stage("a/d.txt", oid.clone(), FileMode::Regular, None).unwrap();
        index.stage("x", oid.clone(), FileMode::Regular, None).unwrap();

        index.stage("a", oid, FileMode::Regular, None).unwrap();

        assert_eq!(paths(&index), vec!["a", "x"]);
        assert!(!index.contains("a/b"));
    }

    #[rstest]
    fn directory_replaces_file(oid: ObjectId) {
        let mut index = Index::new(PathBuf::from("index"));
        index.stage("a", oid.clone(), FileMode::Regular, None).unwrap();

        index.stage("a/b/c.txt", oid, FileMode::Regular, None).unwrap();

        assert_eq!(paths(&index), vec!["a/b/c.txt"]);
        assert!(index.contains("a/b"));
    }

    #[rstest]
    fn unstage_is_a_noop_for_unknown_paths(oid: ObjectId) {
        let mut index = Index::new(PathBuf::from("index"));
        index.stage("kept", oid, FileMode::Regular, None).unwrap();

        assert!(!index.unstage("missing"));
        assert_eq!(paths(&index), vec!["kept"]);
    }

    #[rstest]
    fn unstage_removes_a_whole_directory(oid: ObjectId) {
        let mut index = Index::new(PathBuf::from("index"));
        index.stage("src/a.rs", oid.clone(), FileMode::Regular, None).unwrap();
        index.stage("src/b/c.rs", oid.clone(), FileMode::Regular, None).unwrap();
        index.stage("srcfile", oid, FileMode::Regular, None).unwrap();

        assert!(index.unstage("src"));
        assert_eq!(paths(&index), vec!["srcfile"]);
    }

    #[rstest]
    fn unstage_file_spares_a_directory_of_the_same_name(oid: ObjectId) {
        let mut index = Index::new(PathBuf::from("index"));
        index.stage("a", oid.clone(), FileMode::Regular, None).unwrap();
        index.stage("a/b", oid, FileMode::Regular, None).unwrap();

        assert!(!index.unstage_file("a"));
        assert_eq!(paths(&index), vec!["a/b"]);
    }

    #[rstest]
    fn entries_under_matches_whole_components(oid: ObjectId) {
        let mut index = Index::new(PathBuf::from("index"));
        for path in ["lib/a", "lib/b/c", "library", "main"] {
            index.stage(path, oid.clone(), FileMode::Regular, None).unwrap();
        }

        let under: Vec<_> = index.entries_under("lib").map(|e| e.name.as_str()).collect();

        assert_eq!(under, vec!["lib/a", "lib/b/c"]);
        assert_eq!(index.entries_under(".").count(), 4);
    }

    #[rstest]
    fn invalid_paths_cannot_be_staged(oid: ObjectId) {
        let mut index = Index::new(PathBuf::from("index"));
        assert!(matches!(
            index.stage("../escape", oid, FileMode::Regular, None),
            Err(Error::InvalidPath(_))
        ));
    }

    #[rstest]
    fn damaged_file_is_corrupt(dir: TempDir, oid: ObjectId) {
        let path = dir.path().join("index");
        let mut index = Index::new(path.clone());
        index.stage("a.txt", oid, FileMode::Regular, None).unwrap();
        index.save().unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(Index::load(path), Err(Error::CorruptIndex(_))));
    }

    #[rstest]
    fn foreign_signature_is_corrupt(dir: TempDir) {
        let path = dir.path().join("index");
        std::fs::write(&path, b"JUNK\0\0\0\x02\0\0\0\0").unwrap();

        assert!(matches!(Index::load(path), Err(Error::CorruptIndex(_))));
    }
}
