//! Binary layout of the staging area
//!
//! A `DIRC` version 2 file: a 12-byte header (signature, version, entry
//! count), the entries sorted by path with each one NUL-padded to a multiple
//! of 8 bytes, then a SHA-1 of everything before it.

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod index_header;

pub const CHECKSUM_SIZE: usize = 20;

/// Signature, version and entry count, four bytes each
pub const HEADER_SIZE: usize = 12;

pub const SIGNATURE: &str = "DIRC";

/// Only version 2 is read or written
pub const VERSION: u32 = 2;
