//! Annotated tag object
//!
//! ## Format
//!
//! ```text
//! tag <size>\0
//! object <target-sha>
//! type <target-kind>
//! tag <name>
//! tagger <name> <email> <timestamp> <timezone>
//!
//! <message>
//! ```
//!
//! Lightweight tags are plain refs and never become objects.

use crate::artifacts::objects::commit::{Identity, parse_headers};
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, IoResultExt, Result};
use bytes::Bytes;
use derive_new::new;
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Tag {
    object: ObjectId,
    target_type: ObjectType,
    name: String,
    tagger: Identity,
    message: String,
}

impl Tag {
    pub fn object(&self) -> &ObjectId {
        &self.object
    }

    pub fn target_type(&self) -> ObjectType {
        self.target_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tagger(&self) -> &Identity {
        &self.tagger
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn to_text(&self) -> String {
        format!(
            "object {}\ntype {}\ntag {}\ntagger {}\n\n{}",
            self.object,
            self.target_type,
            self.name,
            self.tagger.display(),
            self.message
        )
    }
}

impl Packable for Tag {
    fn serialize(&self) -> Result<Bytes> {
        Ok(Bytes::from(self.to_text()))
    }
}

impl Unpackable for Tag {
    fn deserialize(mut reader: impl BufRead) -> Result<Self> {
        let mut content = Vec::new();
        reader
            .read_to_end(&mut content)
            .io_context(|| "unable to read tag body")?;
        let content =
            String::from_utf8(content).map_err(|_| Error::malformed("tag is not valid UTF-8"))?;

        let (headers, message) = content
            .split_once("\n\n")
            .ok_or_else(|| Error::malformed("tag without blank line after headers"))?;
        let headers = parse_headers(headers)?;

        let field = |key: &str| {
            headers
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.as_str())
                .ok_or_else(|| Error::malformed(format!("tag without {key} header")))
        };

        Ok(Tag {
            object: ObjectId::try_parse(field("object")?)?,
            target_type: ObjectType::try_from(field("type")?)?,
            name: field("tag")?.to_string(),
            tagger: Identity::try_from(field("tagger")?)?,
            message: message.to_string(),
        })
    }
}

impl Object for Tag {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tag
    }

    fn display(&self) -> String {
        self.to_text()
    }
}
