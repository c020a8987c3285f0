use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::errors::{Error, Result};
use byteorder::{ByteOrder, NetworkEndian};
use bytes::Bytes;
use derive_new::new;
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexHeader {
    pub marker: String,
    pub version: u32,
    pub entries_count: u32,
}

impl IndexHeader {
    pub fn for_entries(entries_count: u32) -> Self {
        IndexHeader::new(SIGNATURE.to_string(), VERSION, entries_count)
    }

    /// Reject anything but a version 2 `DIRC` file
    pub fn validate(&self) -> Result<()> {
        if self.marker != SIGNATURE {
            return Err(Error::CorruptIndex(format!(
                "bad signature '{}'",
                self.marker
            )));
        }
        if self.version != VERSION {
            return Err(Error::CorruptIndex(format!(
                "unsupported version {}",
                self.version
            )));
        }
        Ok(())
    }
}

impl Packable for IndexHeader {
    fn serialize(&self) -> Result<Bytes> {
        // "a4N2"
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        bytes.extend_from_slice(self.marker.as_bytes());
        bytes.extend_from_slice(&self.version.to_be_bytes());
        bytes.extend_from_slice(&self.entries_count.to_be_bytes());

        Ok(Bytes::from(bytes))
    }
}

impl Unpackable for IndexHeader {
    fn deserialize(mut reader: impl BufRead) -> Result<Self> {
        let mut bytes = [0u8; HEADER_SIZE];
        reader
            .read_exact(&mut bytes)
            .map_err(|_| Error::CorruptIndex("truncated header".to_string()))?;

        let marker = String::from_utf8_lossy(&bytes[0..4]).into_owned();
        let version = NetworkEndian::read_u32(&bytes[4..8]);
        let entries_count = NetworkEndian::read_u32(&bytes[8..12]);

        Ok(IndexHeader {
            marker,
            version,
            entries_count,
        })
    }
}
