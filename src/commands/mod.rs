//! Repository operations
//!
//! Everything the CLI layer can ask of a repository, split the way git splits
//! its commands:
//!
//! - `plumbing`: direct access to objects, refs and the index
//! - `porcelain`: workflows composed from the plumbing
//!
//! Operations return typed outcomes and never print; rendering is up to the
//! caller.

pub mod plumbing;
pub mod porcelain;
