//! Error taxonomy of the repository core
//!
//! Every operation of the core returns [`Result`]. The variants name *what*
//! went wrong so the CLI layer can render its own message; nothing in the core
//! prints or exits.

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use std::path::Path;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("object {0} not found")]
    ObjectNotFound(String),

    #[error("short object id {prefix} is ambiguous ({} candidates)", candidates.len())]
    AmbiguousHash {
        prefix: String,
        candidates: Vec<ObjectId>,
    },

    #[error("malformed object: {0}")]
    MalformedObject(String),

    #[error("object {oid} is a {actual}, not a {expected}")]
    ObjectTypeMismatch {
        oid: ObjectId,
        expected: ObjectType,
        actual: ObjectType,
    },

    #[error("unknown revision or path not in the working tree: '{0}'")]
    UnknownRevision(String),

    #[error("commit {0} has no such parent")]
    NoSuchParent(ObjectId),

    #[error("path '{path}' does not exist in '{revision}'")]
    PathNotFound { revision: String, path: String },

    #[error("ref {0} not found")]
    RefNotFound(String),

    #[error("ref {0} already exists")]
    RefAlreadyExists(String),

    #[error("'{0}' is not a valid ref name")]
    InvalidRefName(String),

    #[error("invalid path '{0}'")]
    InvalidPath(String),

    #[error("index file corrupt: {0}")]
    CorruptIndex(String),

    #[error("not a repository (or any of the parent directories): {0}")]
    NotARepository(String),

    #[error("{0} not set")]
    MissingConfig(String),

    #[error("nothing to commit, tree unchanged")]
    NothingToCommit,

    #[error("aborting commit due to empty commit message")]
    EmptyMessage,

    #[error("cannot delete branch '{0}': it is checked out")]
    BranchCheckedOut(String),

    #[error("{context}")]
    IoFailure {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedObject(message.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::IoFailure {
            context: context.into(),
            source,
        }
    }

    /// True for the error kinds that say "the thing you asked for isn't there",
    /// as opposed to corruption or filesystem trouble.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ObjectNotFound(_)
                | Error::UnknownRevision(_)
                | Error::RefNotFound(_)
                | Error::PathNotFound { .. }
        )
    }
}

/// Attach a context message to filesystem errors, in the manner of
/// `anyhow::Context`.
pub trait IoResultExt<T> {
    fn io_context<C, F>(self, context: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;

    fn with_path(self, action: &str, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn io_context<C, F>(self, context: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|source| Error::io(context(), source))
    }

    fn with_path(self, action: &str, path: &Path) -> Result<T> {
        self.map_err(|source| Error::io(format!("unable to {action} {}", path.display()), source))
    }
}
