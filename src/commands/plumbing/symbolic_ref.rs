use crate::areas::repository::Repository;
use crate::artifacts::refs::REFS_PREFIX;
use crate::artifacts::refs::ref_name::SymRefName;
use crate::artifacts::refs::ref_value::RefValue;
use crate::errors::{Error, Result};

impl Repository {
    /// Ref HEAD points to, or `None` when HEAD is detached
    pub fn read_symbolic_ref(&self) -> Result<Option<SymRefName>> {
        self.refs().head_target()
    }

    /// Make HEAD a symbolic ref to `target`, which must live below `refs/`.
    /// The target need not exist yet (an unborn branch).
    pub fn set_symbolic_ref(&self, target: &str) -> Result<SymRefName> {
        if !target.starts_with(REFS_PREFIX) {
            return Err(Error::InvalidRefName(target.to_string()));
        }
        let target = SymRefName::try_parse(target)?;
        self.refs()
            .write(&SymRefName::head(), &RefValue::Symbolic(target.clone()))?;

        Ok(target)
    }
}
