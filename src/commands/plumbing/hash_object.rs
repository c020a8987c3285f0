use crate::areas::repository::Repository;
use crate::artifacts::objects::codec;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{IoResultExt, Result};
use std::path::Path;

impl Repository {
    /// Blob id of the file at `path`, storing the blob when `write` is set
    pub fn hash_object(&self, path: &Path, write: bool) -> Result<ObjectId> {
        let content = std::fs::read(path).with_path("read", path)?;

        if write {
            self.database().put(ObjectType::Blob, &content)
        } else {
            Ok(codec::hash(ObjectType::Blob, &content))
        }
    }
}
