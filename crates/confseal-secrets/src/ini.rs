//! Secrets read from an INI file.
//!
//! The file is read and parsed once, when the provider is constructed; a
//! missing or malformed file fails construction and is never retried.
//! Lookups afterwards are plain map accesses on an immutable snapshot.
//!
//! # Format
//!
//! ```text
//! [secrets]
//! password = foobar
//! db_password = nested!
//!
//! [other_secrets]
//! password = barfoo
//! ```
//!
//! - `[section]` headers, `key = value` (or `key: value`) lines, split on the
//!   first delimiter with both sides trimmed.
//! - Blank lines and lines starting with `#` or `;` are skipped.
//! - Keys are case-insensitive, section names are not.
//! - No interpolation and no multi-line values. Keys outside a section,
//!   lines without a delimiter, empty keys and duplicate sections or keys
//!   are errors.
//!
//! # Sections
//!
//! A secret is read from the section given with
//! [`SecretDescriptor::with_section`] or, without one, from the provider's
//! default section. Because [`SecretsProvider::secret`] snapshots the
//! provider, the default section that applies is the one in effect when the
//! field was *declared*: repointing it with
//! [`FileSectionSecrets::set_default_section`] only affects fields declared
//! afterwards.
//!
//! # Keys
//!
//! An explicit name is used as the key verbatim. Otherwise the key is the
//! field name joined to its enclosing group names with `_`: field `password`
//! inside group `db` is read from `db_password`. Matching is
//! case-insensitive like every other key lookup.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::descriptor::SecretDescriptor;
use crate::environ::EnvSource;
use crate::error::{Result, SecretsError};
use crate::key::{self, StorageKey};
use crate::provider::{ResolveContext, SecretsProvider};

/// Section used when none is given at construction.
pub const DEFAULT_SECTION: &str = "secrets";

type Sections = BTreeMap<String, BTreeMap<String, String>>;

/// INI-file backend.
#[derive(Clone)]
pub struct FileSectionSecrets {
    source_path: PathBuf,
    default_section: String,
    sections: Arc<Sections>,
}

impl FileSectionSecrets {
    /// Load `path`, reading secrets from the `secrets` section by default.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::BackingStoreUnavailable`] if the file cannot be
    /// read and [`SecretsError::MalformedIni`] if it cannot be parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_with_section(path, DEFAULT_SECTION)
    }

    /// Load `path` with `section` as the default section.
    pub fn from_path_with_section(path: impl AsRef<Path>, section: &str) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| {
            SecretsError::BackingStoreUnavailable {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let secrets = Self::parse(path, &text, section)?;
        tracing::info!(
            path = %path.display(),
            sections = secrets.sections.len(),
            default_section = %secrets.default_section,
            "loaded ini secrets"
        );
        Ok(secrets)
    }

    /// Load the file named by the `var` environment variable, or `fallback`
    /// when `var` is unset.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`from_path`](Self::from_path), returns
    /// [`SecretsError::BackingStoreUnavailable`] when `var` is unset and there
    /// is no fallback.
    pub fn from_path_in_env(
        env: &dyn EnvSource,
        var: &str,
        fallback: Option<&Path>,
    ) -> Result<Self> {
        let path = path_from_env(env, var, fallback)?;
        Self::from_path(path)
    }

    /// Parse INI text that did not come from a file.
    pub fn from_ini_str(text: &str, section: &str) -> Result<Self> {
        Self::parse(Path::new("<memory>"), text, section)
    }

    fn parse(path: &Path, text: &str, section: &str) -> Result<Self> {
        Ok(Self {
            source_path: path.to_path_buf(),
            default_section: section.to_owned(),
            sections: Arc::new(parse_ini(path, text)?),
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn default_section(&self) -> &str {
        &self.default_section
    }

    /// Change the section used by fields declared from now on.
    pub fn set_default_section(&mut self, section: impl Into<String>) {
        self.default_section = section.into();
    }

    /// Section names in sorted order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Declare a secret read from `section` regardless of the default.
    pub fn secret_in(&self, section: impl Into<String>) -> SecretDescriptor {
        self.secret().with_section(section)
    }

    /// Raw lookup; `key` is matched case-insensitively.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)?
            .get(&key.to_lowercase())
            .map(String::as_str)
    }
}

impl fmt::Debug for FileSectionSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSectionSecrets")
            .field("source_path", &self.source_path)
            .field("default_section", &self.default_section)
            .field("sections", &self.sections.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SecretsProvider for FileSectionSecrets {
    fn backend(&self) -> &'static str {
        "ini"
    }

    fn storage_key(
        &self,
        descriptor: &SecretDescriptor,
        field_name: &str,
        group_path: &[String],
    ) -> StorageKey {
        let section = descriptor
            .explicit_section()
            .unwrap_or(self.default_section.as_str())
            .to_owned();

        StorageKey::Ini {
            section,
            key: key::explicit_or(descriptor, || key::file_name(group_path, field_name)),
        }
    }

    fn resolve(&self, descriptor: &SecretDescriptor, ctx: &ResolveContext<'_>) -> Result<String> {
        let location = self.storage_key(descriptor, ctx.field_name, ctx.group_path);
        let value = match &location {
            StorageKey::Ini { section, key } => self.get(section, key).map(str::to_owned),
            _ => None,
        };

        key::found_or_missing(value, self.backend(), &location, ctx.group_path, ctx.field_name)
    }
}

/// Path named by `var`, or `fallback`.
pub(crate) fn path_from_env(
    env: &dyn EnvSource,
    var: &str,
    fallback: Option<&Path>,
) -> Result<PathBuf> {
    match (env.var(var), fallback) {
        (Some(path), _) => Ok(PathBuf::from(path)),
        (None, Some(path)) => Ok(path.to_path_buf()),
        (None, None) => Err(SecretsError::BackingStoreUnavailable {
            path: PathBuf::from(format!("${var}")),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("environment variable {var} is not set and no fallback path was given"),
            ),
        }),
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

fn parse_ini(path: &Path, text: &str) -> Result<Sections> {
    let malformed = |line: usize, reason: String| SecretsError::MalformedIni {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut sections = Sections::new();
    let mut current: Option<String> = None;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let Some(name) = header.strip_suffix(']') else {
                return Err(malformed(line_no, "unterminated section header".into()));
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(malformed(line_no, "empty section name".into()));
            }
            match sections.entry(name.to_owned()) {
                Entry::Occupied(_) => {
                    return Err(malformed(line_no, format!("duplicate section `{name}`")));
                }
                Entry::Vacant(slot) => {
                    slot.insert(BTreeMap::new());
                }
            }
            current = Some(name.to_owned());
            continue;
        }

        let Some(section) = current.as_deref() else {
            return Err(malformed(line_no, "key outside of any section".into()));
        };
        let Some(pos) = line.find(['=', ':']) else {
            return Err(malformed(line_no, "expected `key = value`".into()));
        };

        let key = line[..pos].trim().to_lowercase();
        let value = line[pos + 1..].trim();
        if key.is_empty() {
            return Err(malformed(line_no, "empty key".into()));
        }

        let entries = sections.entry(section.to_owned()).or_default();
        match entries.entry(key) {
            Entry::Occupied(slot) => {
                return Err(malformed(
                    line_no,
                    format!("duplicate key `{}` in section `{section}`", slot.key()),
                ));
            }
            Entry::Vacant(slot) => {
                slot.insert(value.to_owned());
            }
        }
    }

    Ok(sections)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
