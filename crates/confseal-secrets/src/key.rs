//! Storage-key derivation shared by every backend.
//!
//! Each backend turns a field's schema position into the key it looks up.
//! The precedence is the same everywhere: an explicit name on the
//! [`SecretDescriptor`] wins over anything derived from the field name and
//! the enclosing group path.

use std::fmt;
use std::path::PathBuf;

use crate::descriptor::SecretDescriptor;
use crate::error::{Result, SecretsError};

/// The concrete location a backend looks a secret up at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKey {
    /// A key inside a named INI section.
    Ini { section: String, key: String },
    /// An environment variable name.
    EnvVar(String),
    /// A file holding the secret.
    File(PathBuf),
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ini { section, key } => write!(f, "[{section}] {key}"),
            Self::EnvVar(name) => f.write_str(name),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The descriptor's explicit name, or `derived()` when it has none.
pub fn explicit_or(descriptor: &SecretDescriptor, derived: impl FnOnce() -> String) -> String {
    match descriptor.explicit_name() {
        Some(name) => name.to_owned(),
        None => derived(),
    }
}

/// `PREFIX_GROUP1_GROUP2_FIELD`, upper-cased. An empty prefix adds no segment.
pub fn env_var_name(prefix: &str, group_path: &[String], field_name: &str) -> String {
    let segments = std::iter::once(prefix)
        .filter(|p| !p.is_empty())
        .chain(group_path.iter().map(String::as_str))
        .chain(std::iter::once(field_name));

    join_segments(segments).to_uppercase()
}

/// `group1_group2_field`, case preserved.
pub fn file_name(group_path: &[String], field_name: &str) -> String {
    let segments = group_path
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(field_name));

    join_segments(segments)
}

/// Dotted path of a field from the schema root, e.g. `db.password`.
pub fn field_path(group_path: &[String], field_name: &str) -> String {
    let mut path = group_path.join(".");
    if !path.is_empty() {
        path.push('.');
    }
    path.push_str(field_name);
    path
}

fn join_segments<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    segments.collect::<Vec<_>>().join("_")
}

/// Map a lookup result to the stored value or [`SecretsError::MissingSecret`].
pub(crate) fn found_or_missing(
    value: Option<String>,
    backend: &'static str,
    key: &StorageKey,
    group_path: &[String],
    field_name: &str,
) -> Result<String> {
    value.ok_or_else(|| SecretsError::MissingSecret {
        field: field_path(group_path, field_name),
        backend,
        key: key.to_string(),
    })
}
