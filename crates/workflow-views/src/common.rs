//! Shared models and utilities.

use std::fmt::{self, Display};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// `permissions` for a workflow or job.
///
/// Both shapes are kept verbatim rather than interpreted, e.g. an
/// unknown scope or level is preserved as written.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum Permissions {
    /// Blanket permissions, e.g. `read-all` or `write-all`.
    Scalar(String),
    /// Fine-grained permissions, e.g. `contents: read`, in source order.
    Mapping(IndexMap<String, AccessLevel>),
}

impl Permissions {
    /// Flattens these permissions into statements: the scalar itself, or
    /// one `scope: level` statement per mapping entry.
    pub fn statements(&self) -> Vec<String> {
        match self {
            Self::Scalar(scalar) => vec![scalar.clone()],
            Self::Mapping(scopes) => scopes
                .iter()
                .map(|(scope, level)| format!("{scope}: {level}"))
                .collect(),
        }
    }
}

/// The access level granted to a single permission scope.
///
/// This is normally `read`, `write` or `none`, but YAML allows users to
/// write other native types here, which GitHub then stringifies.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum AccessLevel {
    // Missing values are empty strings.
    #[serde(deserialize_with = "null_to_default")]
    String(String),
    Number(f64),
    Boolean(bool),
}

impl Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// A `uses:` clause split at its first `@`.
///
/// No validation is performed: `./local/action`, `docker://image` and
/// `owner/repo/path@ref` are all accepted as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionRef<'a> {
    /// Everything before the first `@`.
    pub action: &'a str,
    /// Everything after the first `@`, if non-empty.
    pub version: Option<&'a str>,
}

impl<'a> ActionRef<'a> {
    /// Split a raw `uses:` clause.
    pub fn parse(uses: &'a str) -> Self {
        match uses.split_once('@') {
            Some((action, version)) => Self {
                action,
                version: Some(version).filter(|v| !v.is_empty()),
            },
            None => Self {
                action: uses,
                version: None,
            },
        }
    }

    /// Whether this refers to an action inside the calling repository,
    /// e.g. `./.github/actions/setup`.
    pub fn is_local(&self) -> bool {
        self.action.contains("./")
    }

    /// The action path relative to the calling repository's root, for
    /// local actions. Only the first `./` is dropped.
    pub fn local_path(&self) -> Option<String> {
        self.is_local()
            .then(|| self.action.replacen("./", "", 1))
    }
}

pub(crate) fn null_to_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let key = Option::<T>::deserialize(de)?;
    Ok(key.unwrap_or_default())
}
