//! Core repository components
//!
//! The stateful, on-disk building blocks of a repository:
//!
//! - `atomic`: temp file + rename writes shared by the index and refs
//! - `database`: object database for blobs, trees, commits and tags
//! - `index`: staging area
//! - `refs`: branches, tags and HEAD
//! - `repository`: the handle coordinating all of the above
//! - `workspace`: working directory reads for staging

pub mod atomic;
pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
