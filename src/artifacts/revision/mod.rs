//! Revision expressions
//!
//! - `revision`: the expression grammar (`HEAD~2^{tree}`, `v1:src/main.rs`)
//! - `resolver`: evaluation of an expression against objects and refs

pub mod resolver;
pub mod revision;

pub const PARENT_REGEX: &str = r"^(.+)\^$";
pub const PARENT_N_REGEX: &str = r"^(.+)\^(\d+)$";
pub const ANCESTOR_REGEX: &str = r"^(.+)\~(\d*)$";
pub const PEEL_REGEX: &str = r"^(.+)\^\{([a-z]*)\}$";
pub const REF_ALIASES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "@" => "HEAD",
};
