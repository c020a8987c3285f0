use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::refs::HEAD_REF_NAME;
use crate::artifacts::refs::ref_name::{RefName, SymRefName};
use crate::commands::plumbing::commit_tree::normalize_message;
use crate::errors::{Error, Result};

impl Repository {
    /// Tag the object `target` resolves to (HEAD by default).
    ///
    /// Without a message the tag is lightweight: `refs/tags/<name>` holds the
    /// target id. With one, an annotated tag object is stored and the ref
    /// points to it. Returns the id the new ref holds.
    pub fn tag_create(
        &self,
        name: &str,
        target: Option<&str>,
        message: Option<&str>,
    ) -> Result<ObjectId> {
        let name = RefName::try_parse(name)?;
        if self.refs().read(&SymRefName::tag(&name))?.is_some() {
            return Err(Error::RefAlreadyExists(name.to_string()));
        }
        let target = self.resolver().resolve(target.unwrap_or(HEAD_REF_NAME))?;

        let oid = match message {
            None => target,
            Some(message) => {
                let kind = self.database().object_kind(&target)?;
                let tag = Tag::new(
                    target,
                    kind,
                    name.to_string(),
                    self.config().committer()?,
                    normalize_message(message)?,
                );
                self.database().store(&tag)?
            }
        };
        self.refs().create_tag(&name, &oid)?;

        Ok(oid)
    }

    pub fn tag_delete(&self, name: &str) -> Result<ObjectId> {
        let name = RefName::try_parse(name)?;
        self.refs().delete_tag(&name)
    }

    /// Tag names, sorted
    pub fn tag_list(&self) -> Result<Vec<String>> {
        Ok(self
            .refs()
            .list_tags()?
            .iter()
            .map(|tag| tag.short_name().to_string())
            .collect())
    }
}
