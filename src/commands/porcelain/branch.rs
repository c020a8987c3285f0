use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::HEAD_REF_NAME;
use crate::artifacts::refs::ref_name::RefName;
use crate::errors::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchListing {
    pub name: String,
    pub oid: Option<ObjectId>,
    /// HEAD points to this branch
    pub current: bool,
}

impl Repository {
    /// Create `name` at the commit `start` resolves to (HEAD by default)
    pub fn branch_create(&self, name: &str, start: Option<&str>) -> Result<ObjectId> {
        let name = RefName::try_parse(name)?;
        let oid = self
            .resolver()
            .resolve_commit(start.unwrap_or(HEAD_REF_NAME))?;
        self.refs().create_branch(&name, &oid)?;

        Ok(oid)
    }

    /// Delete `name`, returning the commit it pointed to. The branch HEAD
    /// is on cannot be deleted.
    pub fn branch_delete(&self, name: &str) -> Result<ObjectId> {
        let name = RefName::try_parse(name)?;
        if self.refs().current_branch()?.as_deref() == Some(name.as_ref()) {
            return Err(Error::BranchCheckedOut(name.to_string()));
        }

        self.refs().delete_branch(&name)
    }

    pub fn branch_list(&self) -> Result<Vec<BranchListing>> {
        let current = self.refs().current_branch()?;

        self.refs()
            .list_branches()?
            .into_iter()
            .map(|branch| {
                let name = branch.short_name().to_string();
                Ok(BranchListing {
                    oid: self.refs().resolve(&branch)?,
                    current: current.as_deref() == Some(name.as_str()),
                    name,
                })
            })
            .collect()
    }
}
