//! Reference names and values
//!
//! - `ref_name`: validated branch/tag names and full ref paths
//! - `ref_value`: the content of a ref file, direct or symbolic

pub mod ref_name;
pub mod ref_value;

/// Anything matching this is not a valid ref name (or ref name component)
pub const INVALID_REF_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\/\/|\.lock$|\.lock\/|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";

/// A symbolic ref file: `ref: <path>`
pub const SYMREF_REGEX: &str = r"^ref: (.+)$";

pub const HEAD_REF_NAME: &str = "HEAD";
pub const REFS_PREFIX: &str = "refs/";
pub const HEADS_PREFIX: &str = "refs/heads/";
pub const TAGS_PREFIX: &str = "refs/tags/";
