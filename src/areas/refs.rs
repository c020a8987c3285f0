//! References (branches, tags, HEAD)
//!
//! References are human-readable names pointing to objects:
//! - Direct: the ref file holds a 40-hex object id
//! - Symbolic: the ref file holds `ref: <path>` (HEAD -> refs/heads/master)
//!
//! Every ref is its own file and is replaced atomically (temp file + rename),
//! so writing one ref never touches another and a crash mid-write leaves the
//! previous value readable. Branches and tags are created without clobbering,
//! so concurrent creators of one name cannot both win. There are no
//! cross-ref transactions and no locks.

use crate::areas::atomic::{create_atomically, is_temp_name, write_atomically};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::ref_name::{RefName, SymRefName};
use crate::artifacts::refs::ref_value::RefValue;
use crate::artifacts::refs::{HEAD_REF_NAME, HEADS_PREFIX, TAGS_PREFIX};
use crate::errors::{Error, IoResultExt, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub struct Refs {
    /// The repository directory (typically `.git`)
    path: PathBuf,
}

impl Refs {
    pub fn new(path: PathBuf) -> Self {
        Refs { path }
    }

    fn file_of(&self, name: &SymRefName) -> PathBuf {
        self.path.join(name.as_ref_path())
    }

    /// Raw value of a ref, or `None` when it does not exist
    pub fn read(&self, name: &SymRefName) -> Result<Option<RefValue>> {
        let path = self.file_of(name);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err)
                if matches!(
                    err.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::IsADirectory
                ) =>
            {
                return Ok(None);
            }
            Err(err) => return Err(Error::io(format!("unable to read {}", path.display()), err)),
        };

        RefValue::parse(&content).map(Some)
    }

    pub fn write(&self, name: &SymRefName, value: &RefValue) -> Result<()> {
        write_atomically(&self.file_of(name), value.to_file_content().as_bytes())?;
        tracing::debug!(%name, value = %value.to_file_content().trim_end(), "ref written");

        Ok(())
    }

    /// Remove a ref, pruning emptied directories below `refs/heads` and
    /// `refs/tags`
    pub fn delete(&self, name: &SymRefName) -> Result<()> {
        let path = self.file_of(name);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::RefNotFound(name.to_string()));
            }
            Err(err) => return Err(Error::io(format!("unable to delete {}", path.display()), err)),
        }
        self.prune_empty_parent_dirs(&path)?;
        tracing::debug!(%name, "ref deleted");

        Ok(())
    }

    /// Follow a ref through at most one symbolic hop to an object id.
    ///
    /// `None` when the ref is missing, points at an unborn branch, or the
    /// symbolic target is itself symbolic.
    pub fn resolve(&self, name: &SymRefName) -> Result<Option<ObjectId>> {
        match self.read(name)? {
            Some(RefValue::Direct(oid)) => Ok(Some(oid)),
            Some(RefValue::Symbolic(target)) => match self.read(&target)? {
                Some(RefValue::Direct(oid)) => Ok(Some(oid)),
                Some(RefValue::Symbolic(next)) => {
                    tracing::warn!(%name, %target, %next, "more than one level of symbolic refs");
                    Ok(None)
                }
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    /// Commit HEAD points at, `None` on an unborn branch
    pub fn resolve_head(&self) -> Result<Option<ObjectId>> {
        self.resolve(&SymRefName::head())
    }

    /// Ref HEAD points to, or `None` when HEAD is detached
    pub fn head_target(&self) -> Result<Option<SymRefName>> {
        match self.read(&SymRefName::head())? {
            Some(RefValue::Symbolic(target)) => Ok(Some(target)),
            Some(RefValue::Direct(_)) => Ok(None),
            None => Err(Error::RefNotFound(HEAD_REF_NAME.to_string())),
        }
    }

    /// Branch name HEAD points to, or `None` when HEAD is detached
    pub fn current_branch(&self) -> Result<Option<String>> {
        Ok(self
            .head_target()?
            .and_then(|target| target.branch_name().map(str::to_string)))
    }

    /// Move the branch HEAD points to, or HEAD itself when detached
    pub fn update_head(&self, oid: &ObjectId) -> Result<()> {
        let target = self.head_target()?.unwrap_or_else(SymRefName::head);
        self.write(&target, &RefValue::Direct(oid.clone()))
    }

    pub fn set_head_to_branch(&self, name: &RefName) -> Result<()> {
        self.write(
            &SymRefName::head(),
            &RefValue::Symbolic(SymRefName::branch(name)),
        )
    }

    pub fn detach_head(&self, oid: &ObjectId) -> Result<()> {
        self.write(&SymRefName::head(), &RefValue::Direct(oid.clone()))
    }

    pub fn create_branch(&self, name: &RefName, oid: &ObjectId) -> Result<()> {
        self.create(&SymRefName::branch(name), oid)
    }

    pub fn delete_branch(&self, name: &RefName) -> Result<ObjectId> {
        self.delete_with_value(&SymRefName::branch(name))
    }

    pub fn create_tag(&self, name: &RefName, oid: &ObjectId) -> Result<()> {
        self.create(&SymRefName::tag(name), oid)
    }

    pub fn delete_tag(&self, name: &RefName) -> Result<ObjectId> {
        self.delete_with_value(&SymRefName::tag(name))
    }

    /// Write a new ref; an existing one, even one created concurrently, is
    /// never replaced
    fn create(&self, name: &SymRefName, oid: &ObjectId) -> Result<()> {
        let value = RefValue::Direct(oid.clone());
        if !create_atomically(&self.file_of(name), value.to_file_content().as_bytes())? {
            return Err(Error::RefAlreadyExists(name.short_name().to_string()));
        }
        tracing::debug!(%name, %oid, "ref created");

        Ok(())
    }

    fn delete_with_value(&self, name: &SymRefName) -> Result<ObjectId> {
        let oid = self
            .resolve(name)?
            .ok_or_else(|| Error::RefNotFound(name.short_name().to_string()))?;
        self.delete(name)?;

        Ok(oid)
    }

    pub fn list_branches(&self) -> Result<Vec<SymRefName>> {
        self.list_refs(HEADS_PREFIX)
    }

    pub fn list_tags(&self) -> Result<Vec<SymRefName>> {
        self.list_refs(TAGS_PREFIX)
    }

    /// Every ref below `prefix`, sorted, skipping in-flight temp files
    pub fn list_refs(&self, prefix: &str) -> Result<Vec<SymRefName>> {
        let root = self.path.join(prefix);
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut refs = Vec::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(|err| {
                let context = format!("unable to list {}", root.display());
                Error::io(context, err.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.file_name().to_str().is_none_or(is_temp_name) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.path) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            match SymRefName::try_parse(relative) {
                Ok(name) => refs.push(name),
                Err(err) => tracing::warn!(error = %err, "skipping unreadable ref"),
            }
        }
        refs.sort();

        Ok(refs)
    }

    fn prune_empty_parent_dirs(&self, path: &Path) -> Result<()> {
        let heads = self.path.join(HEADS_PREFIX);
        let tags = self.path.join(TAGS_PREFIX);

        let mut current = path.parent();
        while let Some(parent) = current {
            let below_namespace = (parent.starts_with(&heads) && parent != heads.as_path())
                || (parent.starts_with(&tags) && parent != tags.as_path());
            if !below_namespace {
                break;
            }
            let empty = parent
                .read_dir()
                .with_path("read directory", parent)?
                .next()
                .is_none();
            if !empty {
                break;
            }
            std::fs::remove_dir(parent).with_path("remove empty ref directory", parent)?;
            current = parent.parent();
        }

        Ok(())
    }
}
