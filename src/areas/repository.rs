//! Repository handle
//!
//! Ties the on-disk areas of one repository together. Handles are cheap and
//! short-lived: each command opens one, does its work and drops it. The index
//! is loaded on demand rather than held, so nothing stale survives between
//! operations.

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::log::rev_list::RevList;
use crate::artifacts::refs::ref_name::{RefName, SymRefName};
use crate::artifacts::revision::resolver::RevisionResolver;
use crate::config::{CONFIG_STUB, Config};
use crate::errors::{Error, IoResultExt, Result};
use std::path::{Path, PathBuf};

const OBJECTS_DIR: &str = "objects";
const INDEX_FILE: &str = "index";
const CONFIG_FILE: &str = "config";

#[derive(Debug)]
pub struct Repository {
    root: PathBuf,
    git_dir: PathBuf,
    config: Config,
    database: Database,
    refs: Refs,
    workspace: Workspace,
}

impl Repository {
    fn new(root: PathBuf, config: Config) -> Self {
        let git_dir = root.join(&config.repository_dir);
        let database = Database::new(git_dir.join(OBJECTS_DIR), config.min_abbrev_len);
        let refs = Refs::new(git_dir.clone());
        let workspace = Workspace::new(root.clone(), config.repository_dir.clone());

        Repository {
            root,
            git_dir,
            config,
            database,
            refs,
            workspace,
        }
    }

    /// Create the repository layout below `root`. Existing files are left
    /// alone, so running it twice only fills in what is missing.
    pub fn init(root: &Path, config: Config) -> Result<Self> {
        let default_branch = RefName::try_parse(config.default_branch.clone())?;
        std::fs::create_dir_all(root).with_path("create", root)?;
        let root = root.canonicalize().with_path("resolve", root)?;
        let repository = Repository::new(root, config);

        for dir in [OBJECTS_DIR, "refs/heads", "refs/tags"] {
            let path = repository.git_dir.join(dir);
            std::fs::create_dir_all(&path).with_path("create", &path)?;
        }

        if repository.refs.read(&SymRefName::head())?.is_none() {
            repository.refs.set_head_to_branch(&default_branch)?;
        }

        let config_path = repository.git_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            std::fs::write(&config_path, CONFIG_STUB).with_path("write", &config_path)?;
        }
        tracing::debug!(git_dir = %repository.git_dir.display(), "repository initialised");

        Ok(repository)
    }

    /// Handle on the repository whose root is exactly `root`
    pub fn open(root: &Path, config: Config) -> Result<Self> {
        let git_dir = root.join(&config.repository_dir);
        if !git_dir.is_dir() {
            return Err(Error::NotARepository(root.display().to_string()));
        }
        let root = root.canonicalize().with_path("resolve", root)?;

        Ok(Repository::new(root, config))
    }

    /// Walk up from `start` to the first directory holding the repository
    /// directory
    pub fn discover(start: &Path, config: Config) -> Result<Self> {
        let start = start.canonicalize().with_path("resolve", start)?;

        for dir in start.ancestors() {
            if dir.join(&config.repository_dir).is_dir() {
                tracing::trace!(root = %dir.display(), "repository discovered");
                return Repository::open(dir, config);
            }
        }

        Err(Error::NotARepository(start.display().to_string()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn index_path(&self) -> PathBuf {
        self.git_dir.join(INDEX_FILE)
    }

    /// Current staging area; empty when no index has been written yet
    pub fn load_index(&self) -> Result<Index> {
        Index::load(self.index_path())
    }

    pub fn resolver(&self) -> RevisionResolver<'_> {
        RevisionResolver::new(&self.database, &self.refs)
    }

    pub fn rev_list(&self) -> RevList<'_> {
        RevList::new(&self.database)
    }
}
