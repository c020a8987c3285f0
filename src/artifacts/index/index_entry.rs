//! Index entry representation
//!
//! Each entry in the index represents a staged file with:
//! - Repository-relative path (`/`-separated)
//! - Content hash (object ID)
//! - File metadata (mode, size, timestamps)
//!
//! ## Entry Format
//!
//! Entries are stored in a binary format with 8-byte alignment. The cached
//! stat data is informational only: nothing in the core compares it.

use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::object::Packable;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, IoResultExt, Result};
use byteorder::{ByteOrder, NetworkEndian, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use is_executable::IsExecutable;
use std::cmp::min;
use std::fs::Metadata;
use std::io::Write;
use std::os::unix::prelude::MetadataExt;
use std::path::Path;

/// Largest path length that fits the 12-bit length field of the flags
const MAX_PATH_SIZE: usize = 0xfff;

/// Block size for entry alignment (8 bytes)
pub const ENTRY_BLOCK: usize = 8;

/// Fixed-width part of an entry, plus the NUL that ends the shortest name
pub const ENTRY_MIN_SIZE: usize = 64;

const NAME_OFFSET: usize = 62;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// Path relative to the repository root
    pub name: String,
    pub oid: ObjectId,
    pub metadata: EntryMetadata,
}

impl IndexEntry {
    /// Entry for `name` with the given mode, keeping whatever stat data the
    /// caller has (or none).
    pub fn staged(name: String, oid: ObjectId, mode: FileMode, stat: Option<EntryMetadata>) -> Self {
        let metadata = EntryMetadata {
            mode: mode.into(),
            flags: min(name.len(), MAX_PATH_SIZE) as u32,
            ..stat.unwrap_or_default()
        };

        IndexEntry::new(name, oid, metadata)
    }

    pub fn mode(&self) -> EntryMode {
        self.metadata.mode
    }

    pub fn basename(&self) -> &str {
        self.name
            .rsplit_once('/')
            .map_or(self.name.as_str(), |(_, base)| base)
    }

    /// Every proper ancestor directory, outermost first: `a/b/c` gives
    /// `["a", "a/b"]`.
    pub fn parent_dirs(&self) -> Vec<&str> {
        parent_dirs(&self.name)
    }
}

pub(crate) fn parent_dirs(path: &str) -> Vec<&str> {
    path.match_indices('/').map(|(at, _)| &path[..at]).collect()
}

/// Check that `path` is a clean repository-relative path
pub fn validate_path(path: &str) -> Result<()> {
    let invalid = path.is_empty()
        || path.contains('\0')
        || path
            .split('/')
            .any(|component| matches!(component, "" | "." | ".."));

    if invalid {
        return Err(Error::InvalidPath(path.to_string()));
    }
    Ok(())
}

impl PartialOrd for IndexEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.as_bytes().cmp(other.name.as_bytes())
    }
}

/// Cached `stat` data of a staged file
///
/// - `ctime`: status change time
/// - `mtime`: content modification time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    pub ctime: i64,
    pub ctime_nsec: i64,
    pub mtime: i64,
    pub mtime_nsec: i64,
    pub dev: u64,
    pub ino: u64,
    pub mode: EntryMode,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub flags: u32,
}

impl EntryMetadata {
    /// Build from `lstat` data; symlinks are recorded as links, not followed.
    pub fn from_stat(file_path: &Path, metadata: &Metadata) -> Self {
        let mode = if metadata.file_type().is_symlink() {
            FileMode::Symlink
        } else if file_path.is_executable() {
            FileMode::Executable
        } else {
            FileMode::Regular
        };

        Self {
            ctime: metadata.ctime(),
            ctime_nsec: metadata.ctime_nsec(),
            mtime: metadata.mtime(),
            mtime_nsec: metadata.mtime_nsec(),
            dev: metadata.dev(),
            ino: metadata.ino(),
            mode: mode.into(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size(),
            flags: 0,
        }
    }

    pub fn file_mode(&self) -> FileMode {
        match self.mode {
            EntryMode::File(mode) => mode,
            EntryMode::Directory => FileMode::Regular,
        }
    }
}

impl Packable for IndexEntry {
    fn serialize(&self) -> Result<Bytes> {
        let mut entry_bytes = Vec::with_capacity(ENTRY_MIN_SIZE + self.name.len());
        self.write_fields(&mut entry_bytes)
            .io_context(|| format!("unable to encode index entry {}", self.name))?;

        // at least one NUL ends the name, then pad to the block size
        entry_bytes.push(0);
        while entry_bytes.len() % ENTRY_BLOCK != 0 {
            entry_bytes.push(0);
        }

        Ok(Bytes::from(entry_bytes))
    }
}

impl IndexEntry {
    fn write_fields(&self, out: &mut Vec<u8>) -> std::io::Result<()> {
        let meta = &self.metadata;
        // stat fields are truncated to 32 bits like git does
        out.write_u32::<NetworkEndian>(meta.ctime as u32)?;
        out.write_u32::<NetworkEndian>(meta.ctime_nsec as u32)?;
        out.write_u32::<NetworkEndian>(meta.mtime as u32)?;
        out.write_u32::<NetworkEndian>(meta.mtime_nsec as u32)?;
        out.write_u32::<NetworkEndian>(meta.dev as u32)?;
        out.write_u32::<NetworkEndian>(meta.ino as u32)?;
        out.write_u32::<NetworkEndian>(meta.mode.as_u32())?;
        out.write_u32::<NetworkEndian>(meta.uid)?;
        out.write_u32::<NetworkEndian>(meta.gid)?;
        out.write_u32::<NetworkEndian>(meta.size as u32)?;
        self.oid.write_h40_to(out)?;
        let flags = (meta.flags & !(MAX_PATH_SIZE as u32)) | min(self.name.len(), MAX_PATH_SIZE) as u32;
        out.write_u16::<NetworkEndian>(flags as u16)?;
        out.write_all(self.name.as_bytes())
    }

    /// Decode one padded entry, as cut out of the index file
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < ENTRY_MIN_SIZE {
            return Err(Error::CorruptIndex("entry too short".to_string()));
        }

        let field = |at: usize| NetworkEndian::read_u32(&bytes[at..at + 4]);
        let mode = EntryMode::try_from(field(24))
            .map_err(|_| Error::CorruptIndex(format!("invalid entry mode {:o}", field(24))))?;
        if mode.is_tree() {
            return Err(Error::CorruptIndex("directory entry in index".to_string()));
        }
        let oid = ObjectId::from_bytes(&bytes[40..60])
            .map_err(|_| Error::CorruptIndex("invalid entry object id".to_string()))?;
        let flags = NetworkEndian::read_u16(&bytes[60..62]) as u32;

        let name_end = bytes[NAME_OFFSET..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::CorruptIndex("entry name not terminated".to_string()))?;
        let name = std::str::from_utf8(&bytes[NAME_OFFSET..NAME_OFFSET + name_end])
            .map_err(|_| Error::CorruptIndex("entry name is not valid UTF-8".to_string()))?
            .to_string();
        validate_path(&name).map_err(|_| Error::CorruptIndex(format!("invalid path '{name}'")))?;

        Ok(IndexEntry {
            name,
            oid,
            metadata: EntryMetadata {
                ctime: field(0) as i64,
                ctime_nsec: field(4) as i64,
                mtime: field(8) as i64,
                mtime_nsec: field(12) as i64,
                dev: field(16) as u64,
                ino: field(20) as u64,
                mode,
                uid: field(28),
                gid: field(32),
                size: field(36) as u64,
                flags,
            },
        })
    }
}
