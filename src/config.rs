//! Repository configuration
//!
//! Plain defaults, overridable from the process environment. The core never
//! reads `<repository_dir>/config`; that file is left for other tools.

use crate::artifacts::objects::commit::Identity;
use crate::errors::{Error, Result};

pub const DEFAULT_REPOSITORY_DIR: &str = ".git";
pub const DEFAULT_BRANCH: &str = "master";

/// Shortest hex prefix accepted for object-id abbreviation
pub const MIN_ABBREV_LENGTH: usize = 4;

/// Length used when displaying abbreviated object ids
pub const DISPLAY_ABBREV_LENGTH: usize = 7;

/// Contents written to `<repository_dir>/config` by init
pub const CONFIG_STUB: &str = "[core]\n\trepositoryformatversion = 0\n\tfilemode = true\n\tbare = false\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Name of the metadata directory below the repository root
    pub repository_dir: String,
    /// Branch HEAD points to after init
    pub default_branch: String,
    pub min_abbrev_len: usize,
    pub abbrev_len: usize,
    /// Fixed identities; when unset they are read from the environment
    pub author: Option<Identity>,
    pub committer: Option<Identity>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            repository_dir: DEFAULT_REPOSITORY_DIR.to_string(),
            default_branch: DEFAULT_BRANCH.to_string(),
            min_abbrev_len: MIN_ABBREV_LENGTH,
            abbrev_len: DISPLAY_ABBREV_LENGTH,
            author: None,
            committer: None,
        }
    }
}

impl Config {
    /// Defaults with `GIT_DIR` and `MINIGIT_DEFAULT_BRANCH` applied.
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Some(dir) = non_empty_var("GIT_DIR") {
            config.repository_dir = dir;
        }
        if let Some(branch) = non_empty_var("MINIGIT_DEFAULT_BRANCH") {
            config.default_branch = branch;
        }

        config
    }

    /// Author identity from `GIT_AUTHOR_NAME`, `GIT_AUTHOR_EMAIL` and the
    /// optional `GIT_AUTHOR_DATE`.
    pub fn author(&self) -> Result<Identity> {
        match &self.author {
            Some(author) => Ok(author.clone()),
            None => Identity::load_from_env("AUTHOR"),
        }
    }

    /// Committer identity from `GIT_COMMITTER_*`, falling back to the author
    /// when no committer name is set.
    pub fn committer(&self) -> Result<Identity> {
        if let Some(committer) = &self.committer {
            return Ok(committer.clone());
        }
        match non_empty_var("GIT_COMMITTER_NAME") {
            Some(_) => Identity::load_from_env("COMMITTER"),
            None => self.author(),
        }
    }
}

pub(crate) fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

pub(crate) fn required_var(name: &str) -> Result<String> {
    non_empty_var(name).ok_or_else(|| Error::MissingConfig(name.to_string()))
}
