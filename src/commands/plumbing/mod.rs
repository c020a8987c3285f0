//! Plumbing commands (low-level operations)
//!
//! ## Commands
//!
//! - `hash-object`: compute a blob id and optionally store the blob
//! - `cat-file`: decode any object named by a revision
//! - `write-tree` / `commit-tree`: build objects from the index
//! - `update-ref` / `symbolic-ref`: raw ref manipulation
//! - `rev-parse`: revision expression to object id
//! - `ls-tree` / `ls-files`: list a tree or the index

pub mod cat_file;
pub mod commit_tree;
pub mod hash_object;
pub mod ls_files;
pub mod ls_tree;
pub mod rev_parse;
pub mod symbolic_ref;
pub mod update_ref;
pub mod write_tree;
