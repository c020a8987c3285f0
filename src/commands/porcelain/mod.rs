//! Porcelain commands (user-facing workflows)
//!
//! ## Commands
//!
//! - `add` / `rm --cached`: stage and unstage working tree files
//! - `commit`: snapshot the index onto the current branch
//! - `branch` / `tag`: create, list and delete named refs
//! - `log`: commit history

pub mod add;
pub mod branch;
pub mod commit;
pub mod log;
pub mod rm;
pub mod tag;
