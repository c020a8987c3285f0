//! Commit object
//!
//! Commits represent snapshots of the repository at specific points in time.
//! They contain:
//! - A tree object ID (directory snapshot)
//! - Parent commit ID(s) (for history)
//! - Author and committer information
//! - Commit message
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//! <other headers, continuation lines start with a space>
//!
//! <commit message>
//! ```
//!
//! Decoding keeps unrecognised headers, so re-encoding a decoded commit
//! reproduces the original bytes.

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::config::{non_empty_var, required_var};
use crate::errors::{Error, IoResultExt, Result};
use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use std::io::BufRead;

/// Author, committer or tagger information
///
/// Contains name, email, and timestamp with timezone information.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Identity {
    name: String,
    email: String,
    timestamp: DateTime<FixedOffset>,
}

impl Identity {
    /// Create a new identity stamped with the current local time
    pub fn new(name: String, email: String) -> Self {
        Identity {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    pub fn new_with_timestamp(name: String, email: String, timestamp: DateTime<FixedOffset>) -> Self {
        Identity {
            name,
            email,
            timestamp,
        }
    }

    /// `Name <email@example.com>`
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// `Name <email> timestamp timezone`, as stored in object headers
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// Load an identity from `GIT_<ROLE>_NAME`, `GIT_<ROLE>_EMAIL` and the
    /// optional `GIT_<ROLE>_DATE`, where role is `AUTHOR` or `COMMITTER`.
    ///
    /// The date may be RFC 2822, `%Y-%m-%d %H:%M:%S %z`, or git's raw
    /// `<unix-seconds> <+hhmm>`. Without a usable date the current time is used.
    pub fn load_from_env(role: &str) -> Result<Self> {
        let name = required_var(&format!("GIT_{role}_NAME"))?;
        let email = required_var(&format!("GIT_{role}_EMAIL"))?;
        let timestamp = non_empty_var(&format!("GIT_{role}_DATE")).and_then(|date| parse_date(&date));

        match timestamp {
            Some(ts) => Ok(Identity::new_with_timestamp(name, email, ts)),
            None => Ok(Identity::new(name, email)),
        }
    }

    /// Timestamp in human-readable form, e.g. "Mon Jan 1 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.timestamp.format("%a %b %-d %H:%M:%S %Y %z").to_string()
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

fn parse_date(date: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(date)
        .or_else(|_| DateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S %z"))
        .ok()
        .or_else(|| {
            let (seconds, offset) = date.trim_start_matches('@').split_once(' ')?;
            raw_timestamp(seconds, offset)
        })
}

fn raw_timestamp(seconds: &str, offset: &str) -> Option<DateTime<FixedOffset>> {
    let seconds = seconds.parse::<i64>().ok()?;
    let offset = parse_offset(offset)?;

    Some(DateTime::from_timestamp(seconds, 0)?.with_timezone(&offset))
}

/// `+hhmm` / `-hhmm`
fn parse_offset(offset: &str) -> Option<FixedOffset> {
    if offset.len() != 5 || !offset.is_ascii() {
        return None;
    }
    let sign = match &offset[..1] {
        "+" => 1,
        "-" => -1,
        _ => return None,
    };
    let hours = offset[1..3].parse::<i32>().ok()?;
    let minutes = offset[3..5].parse::<i32>().ok()?;

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl TryFrom<&str> for Identity {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        // Format: "name <email> timestamp timezone"
        // Split from right to get timezone and timestamp first
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(Error::malformed(format!("invalid identity '{value}'")));
        }

        let timestamp = raw_timestamp(parts[1], parts[0])
            .ok_or_else(|| Error::malformed(format!("invalid identity date in '{value}'")))?;

        let name_email_part = parts[2];
        let email_start = name_email_part
            .find('<')
            .ok_or_else(|| Error::malformed(format!("identity without '<': '{value}'")))?;
        let email_end = name_email_part
            .rfind('>')
            .filter(|&end| end > email_start)
            .ok_or_else(|| Error::malformed(format!("identity without '>': '{value}'")))?;

        let name = name_email_part[..email_start].trim_end().to_string();
        let email = name_email_part[email_start + 1..email_end].to_string();

        Ok(Identity {
            name,
            email,
            timestamp,
        })
    }
}

/// Commit object
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    tree_oid: ObjectId,
    /// Empty for a root commit, several for a merge
    parents: Vec<ObjectId>,
    author: Identity,
    committer: Identity,
    /// Headers after `committer` (`encoding`, `gpgsig`, ...), value lines
    /// joined with `\n`
    extra_headers: Vec<(String, String)>,
    message: String,
}

impl Commit {
    pub fn new(
        tree_oid: ObjectId,
        parents: Vec<ObjectId>,
        author: Identity,
        committer: Identity,
        message: String,
    ) -> Self {
        Commit {
            tree_oid,
            parents,
            author,
            committer,
            extra_headers: Vec::new(),
            message,
        }
    }

    /// First line of the message, for one-line listings
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn author(&self) -> &Identity {
        &self.author
    }

    pub fn committer(&self) -> &Identity {
        &self.committer
    }

    pub fn extra_headers(&self) -> &[(String, String)] {
        &self.extra_headers
    }

    /// Commit time, used to order history
    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.committer.timestamp()
    }

    fn to_text(&self) -> String {
        let mut text = format!("tree {}\n", self.tree_oid);
        for parent in &self.parents {
            text.push_str(&format!("parent {parent}\n"));
        }
        text.push_str(&format!("author {}\n", self.author.display()));
        text.push_str(&format!("committer {}\n", self.committer.display()));
        for (key, value) in &self.extra_headers {
            text.push_str(&format!("{key} {}\n", value.replace('\n', "\n ")));
        }
        text.push('\n');
        text.push_str(&self.message);

        text
    }
}

impl Packable for Commit {
    fn serialize(&self) -> Result<Bytes> {
        Ok(Bytes::from(self.to_text()))
    }
}

impl Unpackable for Commit {
    fn deserialize(mut reader: impl BufRead) -> Result<Self> {
        let mut content = Vec::new();
        reader
            .read_to_end(&mut content)
            .io_context(|| "unable to read commit body")?;
        let content = String::from_utf8(content)
            .map_err(|_| Error::malformed("commit is not valid UTF-8"))?;

        let (headers, message) = content
            .split_once("\n\n")
            .ok_or_else(|| Error::malformed("commit without blank line after headers"))?;
        let headers = parse_headers(headers)?;
        let mut headers = headers.into_iter().peekable();

        let tree_oid = match headers.next() {
            Some((key, value)) if key == "tree" => ObjectId::try_parse(value)?,
            _ => return Err(Error::malformed("commit without tree header")),
        };

        let mut parents = Vec::new();
        while let Some((_, value)) = headers.next_if(|(key, _)| key == "parent") {
            parents.push(ObjectId::try_parse(value)?);
        }

        let author = match headers.next() {
            Some((key, value)) if key == "author" => Identity::try_from(value.as_str())?,
            _ => return Err(Error::malformed("commit without author header")),
        };
        let committer = match headers.next() {
            Some((key, value)) if key == "committer" => Identity::try_from(value.as_str())?,
            _ => return Err(Error::malformed("commit without committer header")),
        };

        Ok(Commit {
            tree_oid,
            parents,
            author,
            committer,
            extra_headers: headers.collect(),
            message: message.to_string(),
        })
    }
}

/// Split a header block into `(key, value)` pairs, folding continuation
/// lines (leading space) into the previous value.
pub(crate) fn parse_headers(block: &str) -> Result<Vec<(String, String)>> {
    let mut headers: Vec<(String, String)> = Vec::new();

    for line in block.split('\n') {
        if let Some(continuation) = line.strip_prefix(' ') {
            let (_, value) = headers
                .last_mut()
                .ok_or_else(|| Error::malformed("continuation line without a header"))?;
            value.push('\n');
            value.push_str(continuation);
            continue;
        }

        let (key, value) = line
            .split_once(' ')
            .ok_or_else(|| Error::malformed(format!("invalid header line '{line}'")))?;
        headers.push((key.to_string(), value.to_string()));
    }

    Ok(headers)
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        self.to_text()
    }
}
