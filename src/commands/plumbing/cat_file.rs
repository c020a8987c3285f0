use crate::areas::repository::Repository;
use crate::artifacts::objects::object::{Object, ObjectBox};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::Result;
use bytes::Bytes;

/// An object looked up by revision, with both its raw body and decoded form
#[derive(Debug, Clone)]
pub struct CatFile {
    pub oid: ObjectId,
    pub kind: ObjectType,
    pub body: Bytes,
    pub object: ObjectBox,
}

impl CatFile {
    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// `cat-file -p` rendering: raw bytes for blobs, text for the rest
    pub fn pretty(&self) -> Bytes {
        match &self.object {
            ObjectBox::Blob(_) => self.body.clone(),
            ObjectBox::Tree(tree) if tree.is_empty() => Bytes::new(),
            ObjectBox::Tree(tree) => Bytes::from(tree.display() + "\n"),
            ObjectBox::Commit(commit) => Bytes::from(commit.display()),
            ObjectBox::Tag(tag) => Bytes::from(tag.display()),
        }
    }
}

impl Repository {
    pub fn cat_file(&self, revision: &str) -> Result<CatFile> {
        let oid = self.resolver().resolve(revision)?;
        let (kind, body) = self.database().get(&oid)?;
        let object = self.database().parse_object(&oid)?;

        Ok(CatFile {
            oid,
            kind,
            body,
            object,
        })
    }
}
