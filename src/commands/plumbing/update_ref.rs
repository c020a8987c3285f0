use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::ref_name::SymRefName;
use crate::artifacts::refs::ref_value::RefValue;
use crate::errors::{Error, Result};

impl Repository {
    /// Point `name` (`HEAD` or a full `refs/...` path) at whatever `revision`
    /// resolves to. Updating a symbolic HEAD moves the branch it names.
    pub fn update_ref(&self, name: &str, revision: &str) -> Result<ObjectId> {
        let name = SymRefName::try_parse(name)?;
        let oid = self.resolver().resolve(revision)?;

        if name.is_head() {
            self.refs().update_head(&oid)?;
        } else {
            self.refs().write(&name, &RefValue::Direct(oid.clone()))?;
        }

        Ok(oid)
    }

    /// Remove a ref, returning the id it held
    pub fn delete_ref(&self, name: &str) -> Result<ObjectId> {
        let name = SymRefName::try_parse(name)?;
        let oid = self
            .refs()
            .resolve(&name)?
            .ok_or_else(|| Error::RefNotFound(name.to_string()))?;
        self.refs().delete(&name)?;

        Ok(oid)
    }
}
