//! Commit history traversal
//!
//! - `rev_list`: breadth-first walk over parent links, deduplicated and
//!   ordered by commit time, reporting commits it could not read

pub mod rev_list;
