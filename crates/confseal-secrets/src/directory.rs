//! Secrets stored one per file in a directory.
//!
//! This is the layout container orchestrators use for mounted secrets
//! (`/run/secrets/<name>`). The file for field `password` in group `db` is
//! `db_password`; an explicit name is used as the file name verbatim. Files
//! are read at resolve time and one trailing line ending is stripped.

use std::io;
use std::path::{Path, PathBuf};

use crate::descriptor::SecretDescriptor;
use crate::environ::EnvSource;
use crate::error::{Result, SecretsError};
use crate::ini::path_from_env;
use crate::key::{self, StorageKey};
use crate::provider::{ResolveContext, SecretsProvider};

/// Directory backend with one file per secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySecrets {
    secrets_dir: PathBuf,
}

impl DirectorySecrets {
    /// Use `dir` as the secrets directory. Nothing is read until resolve time.
    pub fn from_path(dir: impl Into<PathBuf>) -> Self {
        Self {
            secrets_dir: dir.into(),
        }
    }

    /// Use the directory named by the `var` environment variable, or
    /// `fallback` when it is unset.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::BackingStoreUnavailable`] when `var` is unset
    /// and there is no fallback.
    pub fn from_path_in_env(
        env: &dyn EnvSource,
        var: &str,
        fallback: Option<&Path>,
    ) -> Result<Self> {
        path_from_env(env, var, fallback).map(Self::from_path)
    }

    pub fn secrets_dir(&self) -> &Path {
        &self.secrets_dir
    }

    fn read(&self, path: &Path) -> Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(mut contents) => {
                if contents.ends_with('\n') {
                    contents.pop();
                    if contents.ends_with('\r') {
                        contents.pop();
                    }
                }
                Ok(Some(contents))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SecretsError::BackingStoreUnavailable {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl SecretsProvider for DirectorySecrets {
    fn backend(&self) -> &'static str {
        "directory"
    }

    fn storage_key(
        &self,
        descriptor: &SecretDescriptor,
        field_name: &str,
        group_path: &[String],
    ) -> StorageKey {
        let name = key::explicit_or(descriptor, || key::file_name(group_path, field_name));
        StorageKey::File(self.secrets_dir.join(name))
    }

    fn resolve(&self, descriptor: &SecretDescriptor, ctx: &ResolveContext<'_>) -> Result<String> {
        let location = self.storage_key(descriptor, ctx.field_name, ctx.group_path);
        let value = match &location {
            StorageKey::File(path) => self.read(path)?,
            _ => None,
        };

        key::found_or_missing(value, self.backend(), &location, ctx.group_path, ctx.field_name)
    }
}
