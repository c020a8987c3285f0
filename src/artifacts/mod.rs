//! Data structures and algorithms
//!
//! - `index`: index file entries, modes, header and checksum
//! - `log`: commit history traversal
//! - `objects`: object types, ids, codec and the tree builder
//! - `refs`: ref names and ref values
//! - `revision`: revision grammar and resolution

pub mod index;
pub mod log;
pub mod objects;
pub mod refs;
pub mod revision;
