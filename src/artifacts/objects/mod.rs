//! Object model and canonical encoding
//!
//! Four object kinds live in the store, each identified by the SHA-1 of its
//! framed bytes:
//!
//! - **Blob**: file content (raw bytes)
//! - **Tree**: directory listing (names, modes, and object IDs)
//! - **Commit**: snapshot with metadata (tree, parents, identities, message)
//! - **Tag**: annotated, named pointer to another object
//!
//! Framing is `<type> <size>\0<body>`; see [`codec`].

pub mod blob;
pub mod codec;
pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tag;
pub mod tree;
pub mod tree_builder;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;

/// Length of a SHA-1 digest in bytes
pub const RAW_OBJECT_ID_LENGTH: usize = 20;

/// Hex characters used as the shard directory name
pub const OBJECT_SHARD_LENGTH: usize = 2;
