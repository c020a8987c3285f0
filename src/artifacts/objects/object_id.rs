//! Object identifier (SHA-1 hash)
//!
//! Object IDs are 40-character lowercase hexadecimal strings representing SHA-1
//! digests of an object's canonical bytes.
//!
//! ## Storage
//!
//! Objects are stored in `<repository_dir>/objects/<first-2-chars>/<remaining-38-chars>`

use crate::artifacts::objects::{OBJECT_ID_LENGTH, OBJECT_SHARD_LENGTH, RAW_OBJECT_ID_LENGTH};
use crate::errors::{Error, Result};
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

/// Validated, lowercase 40-character object id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID from a string
    ///
    /// Upper-case hex digits are accepted and normalised to lower case.
    pub fn try_parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.len() != OBJECT_ID_LENGTH {
            return Err(Error::malformed(format!(
                "invalid object id length {}: {id}",
                id.len()
            )));
        }
        if !is_hex(&id) {
            return Err(Error::malformed(format!("invalid object id characters: {id}")));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Build an object id from a raw 20-byte digest
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != RAW_OBJECT_ID_LENGTH {
            return Err(Error::malformed(format!(
                "invalid raw object id length {}",
                bytes.len()
            )));
        }
        Ok(Self(bytes.iter().map(|b| format!("{b:02x}")).collect()))
    }

    /// Write the object ID in binary format (20 bytes)
    ///
    /// Used when serializing tree objects and index entries.
    pub fn write_h40_to<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        let hex40 = self.as_ref();

        for i in (0..OBJECT_ID_LENGTH).step_by(2) {
            let byte = u8::from_str_radix(&hex40[i..i + 2], 16)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid hex digit"))?;
            writer.write_all(&[byte])?;
        }

        Ok(())
    }

    /// Read an object ID from binary format (20 bytes)
    pub fn read_h40_from<R: io::Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut buffer = [0u8; RAW_OBJECT_ID_LENGTH];
        reader
            .read_exact(&mut buffer)
            .map_err(|_| Error::malformed("unexpected end of data in object id"))?;

        Self::from_bytes(&buffer)
    }

    /// Convert to the shard path used for object storage
    ///
    /// `abc123...` becomes `ab/c123...`
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(OBJECT_SHARD_LENGTH);
        PathBuf::from(dir).join(file)
    }

    /// Abbreviated form of the object ID
    pub fn to_short_oid(&self) -> String {
        self.abbreviate(crate::config::DISPLAY_ABBREV_LENGTH)
    }

    pub fn abbreviate(&self, len: usize) -> String {
        self.0[..len.min(OBJECT_ID_LENGTH)].to_string()
    }
}

pub(crate) fn is_hex(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_hexdigit())
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_parse(s)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
