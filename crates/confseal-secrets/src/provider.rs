//! The secrets provider contract.
//!
//! A [`SecretsProvider`] is a pluggable source of secret values. Every
//! backend offers the same two operations:
//!
//! - [`secret`](SecretsProvider::secret) declares a field as secret and
//!   returns an inert [`SecretDescriptor`] bound to the provider.
//! - [`resolve`](SecretsProvider::resolve) computes the storage key for a
//!   descriptor in its schema context and looks it up.
//!
//! Defaults are not applied here; the resolution driver in
//! [`schema`](crate::schema) does that so a default keeps its own type.

use std::fmt;
use std::sync::Arc;

use crate::descriptor::SecretDescriptor;
use crate::environ::EnvSource;
use crate::error::Result;
use crate::key::{self, StorageKey};

/// Where in a schema a secret is being resolved.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Name of the field being resolved.
    pub field_name: &'a str,
    /// Enclosing group field names, root first.
    pub group_path: &'a [String],
    /// Environment visible to this resolution run.
    pub env: &'a dyn EnvSource,
}

impl<'a> ResolveContext<'a> {
    pub fn new(field_name: &'a str, group_path: &'a [String], env: &'a dyn EnvSource) -> Self {
        Self {
            field_name,
            group_path,
            env,
        }
    }

    /// Dotted path of the field, e.g. `db.password`.
    pub fn field_path(&self) -> String {
        key::field_path(self.group_path, self.field_name)
    }
}

impl fmt::Debug for ResolveContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveContext")
            .field("field_name", &self.field_name)
            .field("group_path", &self.group_path)
            .finish_non_exhaustive()
    }
}

/// A pluggable source of secret values.
///
/// Implementations must be `Send + Sync`; resolution itself is synchronous
/// and read-only.
pub trait SecretsProvider: fmt::Debug + Send + Sync {
    /// Short backend name used in logs and errors (`ini`, `env`, ...).
    fn backend(&self) -> &'static str;

    /// The key this provider looks `descriptor` up at.
    ///
    /// An explicit name on the descriptor always wins over a name derived
    /// from `field_name` and `group_path`.
    fn storage_key(
        &self,
        descriptor: &SecretDescriptor,
        field_name: &str,
        group_path: &[String],
    ) -> StorageKey;

    /// Look up the raw value for `descriptor`.
    ///
    /// Returns [`SecretsError::MissingSecret`](crate::SecretsError::MissingSecret)
    /// when the computed key has no value.
    fn resolve(&self, descriptor: &SecretDescriptor, ctx: &ResolveContext<'_>) -> Result<String>;

    /// Declare a secret field resolved by this provider.
    ///
    /// The descriptor holds a snapshot of the provider taken now, so any
    /// provider-level setting changed afterwards does not affect it.
    fn secret(&self) -> SecretDescriptor
    where
        Self: Sized + Clone + 'static,
    {
        SecretDescriptor::new(Arc::new(self.clone()))
    }
}
