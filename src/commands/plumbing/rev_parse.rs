use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;

impl Repository {
    pub fn rev_parse(&self, revision: &str) -> Result<ObjectId> {
        self.resolver().resolve(revision)
    }
}
