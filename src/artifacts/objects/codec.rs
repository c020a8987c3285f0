//! Canonical object encoding
//!
//! An object's identity is the SHA-1 of `"<kind> <len(body)>\0" + body`. The
//! framed form is also what gets compressed onto disk.

use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{ObjectBox, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use crate::errors::{Error, Result};
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::Cursor;

pub fn header(kind: ObjectType, body_len: usize) -> String {
    format!("{} {}\0", kind.as_str(), body_len)
}

/// Hash of the framed object. Pure: depends on nothing but the arguments.
pub fn hash(kind: ObjectType, body: &[u8]) -> ObjectId {
    let mut hasher = Sha1::new();
    hasher.update(header(kind, body.len()).as_bytes());
    hasher.update(body);

    let digest = hasher.finalize();
    // a SHA-1 digest is always 20 bytes
    ObjectId::from_bytes(digest.as_slice()).unwrap_or_else(|_| unreachable!())
}

/// Prefix the body with its `<kind> <len>\0` header
pub fn frame(kind: ObjectType, body: &[u8]) -> Bytes {
    let header = header(kind, body.len());
    let mut framed = Vec::with_capacity(header.len() + body.len());
    framed.extend_from_slice(header.as_bytes());
    framed.extend_from_slice(body);

    Bytes::from(framed)
}

/// Split a framed object into its kind and body, checking the declared length
pub fn unframe(data: &[u8]) -> Result<(ObjectType, Bytes)> {
    let nul = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::malformed("missing NUL after object header"))?;
    let header = std::str::from_utf8(&data[..nul])
        .map_err(|_| Error::malformed("object header is not valid UTF-8"))?;

    let (kind, len) = header
        .split_once(' ')
        .ok_or_else(|| Error::malformed(format!("invalid object header '{header}'")))?;
    let kind = ObjectType::try_from(kind)?;
    // decimal digits only: `parse` alone would take a leading '+'
    let len: usize = Some(len)
        .filter(|len| !len.is_empty() && len.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|len| len.parse().ok())
        .ok_or_else(|| Error::malformed(format!("invalid object length '{len}'")))?;

    let body = &data[nul + 1..];
    if body.len() != len {
        return Err(Error::malformed(format!(
            "{kind} declares {len} bytes but has {}",
            body.len()
        )));
    }

    Ok((kind, Bytes::copy_from_slice(body)))
}

pub fn encode(object: &ObjectBox) -> Result<Bytes> {
    object.serialize()
}

pub fn decode(kind: ObjectType, body: &[u8]) -> Result<ObjectBox> {
    let reader = Cursor::new(body);

    Ok(match kind {
        ObjectType::Blob => ObjectBox::Blob(Blob::deserialize(reader)?),
        ObjectType::Tree => ObjectBox::Tree(Tree::deserialize(reader)?),
        ObjectType::Commit => ObjectBox::Commit(Commit::deserialize(reader)?),
        ObjectType::Tag => ObjectBox::Tag(Tag::deserialize(reader)?),
    })
}
