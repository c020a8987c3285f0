use crate::artifacts::refs::{
    HEAD_REF_NAME, HEADS_PREFIX, INVALID_REF_NAME_REGEX, REFS_PREFIX, TAGS_PREFIX,
};
use crate::errors::{Error, Result};

/// Short branch or tag name, e.g. `main` or `feature/login`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefName(String);

impl RefName {
    pub fn try_parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if is_valid_ref_name(&name) {
            Ok(Self(name))
        } else {
            Err(Error::InvalidRefName(name))
        }
    }
}

pub(crate) fn is_valid_ref_name(name: &str) -> bool {
    if name.is_empty() || name == "@" {
        return false;
    }

    match regex::Regex::new(INVALID_REF_NAME_REGEX) {
        Ok(re) => !re.is_match(name),
        Err(_) => false,
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Full ref path below the repository directory: `HEAD` or `refs/...`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymRefName(String);

impl SymRefName {
    pub fn head() -> Self {
        Self(HEAD_REF_NAME.to_string())
    }

    pub fn branch(name: &RefName) -> Self {
        Self(format!("{HEADS_PREFIX}{name}"))
    }

    pub fn tag(name: &RefName) -> Self {
        Self(format!("{TAGS_PREFIX}{name}"))
    }

    /// Accepts `HEAD` or a valid path starting with `refs/`
    pub fn try_parse(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let valid = path == HEAD_REF_NAME
            || path
                .strip_prefix(REFS_PREFIX)
                .is_some_and(is_valid_ref_name);

        if valid {
            Ok(Self(path))
        } else {
            Err(Error::InvalidRefName(path))
        }
    }

    pub fn as_ref_path(&self) -> &str {
        &self.0
    }

    pub fn is_head(&self) -> bool {
        self.0 == HEAD_REF_NAME
    }

    /// `main` for `refs/heads/main`
    pub fn branch_name(&self) -> Option<&str> {
        self.0.strip_prefix(HEADS_PREFIX)
    }

    pub fn tag_name(&self) -> Option<&str> {
        self.0.strip_prefix(TAGS_PREFIX)
    }

    /// Name with the `refs/heads/` or `refs/tags/` prefix dropped
    pub fn short_name(&self) -> &str {
        self.branch_name()
            .or_else(|| self.tag_name())
            .unwrap_or(&self.0)
    }
}

impl std::fmt::Display for SymRefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
