use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree_builder::TreeBuilder;
use crate::errors::Result;

impl Repository {
    /// Store the tree of the current index and return its id
    pub fn write_tree(&self) -> Result<ObjectId> {
        let index = self.load_index()?;
        TreeBuilder::build_from_index(self.database(), index.entries())
    }
}
