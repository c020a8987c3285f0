use crate::artifacts::index::CHECKSUM_SIZE;
use crate::errors::{Error, IoResultExt, Result};
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::{Read, Write};

/// Running SHA-1 over everything read from or written to the index file,
/// checked against (or appended as) the 20-byte trailer.
#[derive(Debug)]
pub struct Checksum<T> {
    inner: T,
    digest: Sha1,
}

impl<T> Checksum<T> {
    pub fn new(inner: T) -> Self {
        Checksum {
            inner,
            digest: Sha1::new(),
        }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<R: Read> Checksum<R> {
    pub fn read(&mut self, size: usize) -> Result<Bytes> {
        let mut buffer = vec![0; size];
        self.inner
            .read_exact(&mut buffer)
            .map_err(|_| Error::CorruptIndex("unexpected end of file".to_string()))?;

        self.digest.update(&buffer);
        Ok(Bytes::from(buffer))
    }

    pub fn verify(&mut self) -> Result<()> {
        let mut expected = [0u8; CHECKSUM_SIZE];
        self.inner
            .read_exact(&mut expected)
            .map_err(|_| Error::CorruptIndex("missing checksum".to_string()))?;

        if expected != self.digest.clone().finalize().as_slice() {
            return Err(Error::CorruptIndex(
                "checksum does not match value stored on disk".to_string(),
            ));
        }

        let mut trailing = [0u8; 1];
        match self.inner.read(&mut trailing) {
            Ok(0) => Ok(()),
            _ => Err(Error::CorruptIndex("data after checksum".to_string())),
        }
    }
}

impl<W: Write> Checksum<W> {
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.inner
            .write_all(data)
            .io_context(|| "unable to write index")?;
        self.digest.update(data);
        Ok(())
    }

    pub fn write_checksum(&mut self) -> Result<()> {
        let checksum = self.digest.clone().finalize();
        self.inner
            .write_all(checksum.as_slice())
            .io_context(|| "unable to write index checksum")
    }
}
