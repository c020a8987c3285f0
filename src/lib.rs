//! A small content-addressed version control core.
//!
//! - `areas`: the on-disk parts of a repository (objects, index, refs,
//!   working tree) and the [`Repository`](areas::repository::Repository)
//!   handle tying them together
//! - `artifacts`: pure data structures and algorithms (object codec, index
//!   format, ref names, revision grammar, history walking)
//! - `commands`: the operations a front end invokes
//!
//! Nothing in the library prints or exits; every operation returns
//! [`Result`].

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod config;
pub mod errors;

pub use errors::{Error, Result};
