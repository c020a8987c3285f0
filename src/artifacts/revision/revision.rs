use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::refs::HEAD_REF_NAME;
use crate::artifacts::refs::ref_name::is_valid_ref_name;
use crate::artifacts::revision::{
    ANCESTOR_REGEX, PARENT_N_REGEX, PARENT_REGEX, PEEL_REGEX, REF_ALIASES,
};
use crate::errors::{Error, Result};

/// A parsed revision expression.
///
/// Supported forms:
/// - Names: `main`, `v1.0`, `refs/heads/main`, `HEAD`, `@` (alias of `HEAD`)
/// - Object ids, full or abbreviated to at least 4 hex digits
/// - `<rev>^` first parent, `<rev>^<n>` n-th parent (`^0` is the commit itself)
/// - `<rev>~<n>` n-th first-parent ancestor (`~` alone is `~1`)
/// - `<rev>^{commit|tree|blob|tag}` peel to the given kind, `<rev>^{}` peel tags
/// - `<rev>:<path>` object at `path` in the tree of `rev` (empty path: the tree)
///
/// Suffixes apply left to right: `HEAD~2^{tree}` is the tree of the
/// grandparent of HEAD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    /// A ref name or hex prefix; which one is decided at resolution time
    Ref(String),
    Parent(Box<Revision>),
    ParentN(Box<Revision>, usize),
    Ancestor(Box<Revision>, usize),
    /// `None` peels tags until something else is reached
    Peel(Box<Revision>, Option<ObjectType>),
    Path(Box<Revision>, String),
}

impl Revision {
    pub fn try_parse(revision: &str) -> Result<Revision> {
        let unknown = || Error::UnknownRevision(revision.to_string());

        // ref names cannot contain ':', so the first one starts the path
        if let Some((base, path)) = revision.split_once(':') {
            if base.is_empty() {
                return Err(unknown());
            }
            return Ok(Revision::Path(
                Box::new(Self::try_parse(base)?),
                path.to_string(),
            ));
        }

        if let Some(caps) = captures(PEEL_REGEX, revision)? {
            let target = match caps[1].as_str() {
                "" => None,
                kind => Some(ObjectType::try_from(kind).map_err(|_| unknown())?),
            };
            return Ok(Revision::Peel(Box::new(Self::try_parse(&caps[0])?), target));
        }

        if let Some(caps) = captures(PARENT_N_REGEX, revision)? {
            let n = caps[1].parse().map_err(|_| unknown())?;
            return Ok(Revision::ParentN(Box::new(Self::try_parse(&caps[0])?), n));
        }

        if let Some(caps) = captures(PARENT_REGEX, revision)? {
            return Ok(Revision::Parent(Box::new(Self::try_parse(&caps[0])?)));
        }

        if let Some(caps) = captures(ANCESTOR_REGEX, revision)? {
            let generations = match caps[1].as_str() {
                "" => 1,
                digits => digits.parse().map_err(|_| unknown())?,
            };
            return Ok(Revision::Ancestor(
                Box::new(Self::try_parse(&caps[0])?),
                generations,
            ));
        }

        let name = *REF_ALIASES.get(revision).unwrap_or(&revision);
        if name == HEAD_REF_NAME || is_valid_ref_name(name) {
            Ok(Revision::Ref(name.to_string()))
        } else {
            Err(unknown())
        }
    }
}

/// Capture groups after the whole match, owned so the caller can recurse
fn captures(pattern: &str, revision: &str) -> Result<Option<Vec<String>>> {
    let re = regex::Regex::new(pattern)
        .map_err(|_| Error::UnknownRevision(revision.to_string()))?;

    Ok(re.captures(revision).map(|caps| {
        caps.iter()
            .skip(1)
            .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
            .collect()
    }))
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Revision::Ref(name) => write!(f, "{name}"),
            Revision::Parent(base) => write!(f, "{base}^"),
            Revision::ParentN(base, n) => write!(f, "{base}^{n}"),
            Revision::Ancestor(base, n) => write!(f, "{base}~{n}"),
            Revision::Peel(base, None) => write!(f, "{base}^{{}}"),
            Revision::Peel(base, Some(kind)) => write!(f, "{base}^{{{kind}}}"),
            Revision::Path(base, path) => write!(f, "{base}:{path}"),
        }
    }
}
