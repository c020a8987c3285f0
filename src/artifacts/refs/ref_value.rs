use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::refs::SYMREF_REGEX;
use crate::artifacts::refs::ref_name::SymRefName;
use crate::errors::{Error, Result};

/// What a ref file holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefValue {
    Direct(ObjectId),
    Symbolic(SymRefName),
}

impl RefValue {
    /// Parse ref file content: a 40-hex id or `ref: <path>`, newline optional
    pub fn parse(content: &str) -> Result<Self> {
        let content = content.trim_end_matches(['\n', '\r']);

        let symref = regex::Regex::new(SYMREF_REGEX)
            .map_err(|_| Error::malformed("symbolic ref pattern"))?;
        if let Some(captures) = symref.captures(content) {
            return Ok(RefValue::Symbolic(SymRefName::try_parse(&captures[1])?));
        }

        ObjectId::try_parse(content)
            .map(RefValue::Direct)
            .map_err(|_| Error::malformed(format!("invalid ref content '{content}'")))
    }

    /// File content, newline terminated
    pub fn to_file_content(&self) -> String {
        match self {
            RefValue::Direct(oid) => format!("{oid}\n"),
            RefValue::Symbolic(target) => format!("ref: {target}\n"),
        }
    }

    pub fn as_oid(&self) -> Option<&ObjectId> {
        match self {
            RefValue::Direct(oid) => Some(oid),
            RefValue::Symbolic(_) => None,
        }
    }
}
