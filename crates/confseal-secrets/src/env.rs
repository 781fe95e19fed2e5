//! Secrets read from environment variables.
//!
//! [`EnvPrefixSecrets`] is a naming strategy over the environment: a field
//! `password` inside group `db` with prefix `SECRET` is read from
//! `SECRET_DB_PASSWORD`. An explicit name on the descriptor is used as the
//! variable name verbatim, without prefix or case change.
//!
//! Nothing is read at construction; every resolve call consults the
//! [`EnvSource`](crate::EnvSource) of the current run.

use crate::descriptor::SecretDescriptor;
use crate::error::Result;
use crate::key::{self, StorageKey};
use crate::provider::{ResolveContext, SecretsProvider};

/// Environment-variable backend using a `PREFIX_GROUP_FIELD` convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvPrefixSecrets {
    key_prefix: String,
}

impl EnvPrefixSecrets {
    pub fn new(key_prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
        }
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }
}

impl SecretsProvider for EnvPrefixSecrets {
    fn backend(&self) -> &'static str {
        "env"
    }

    fn storage_key(
        &self,
        descriptor: &SecretDescriptor,
        field_name: &str,
        group_path: &[String],
    ) -> StorageKey {
        StorageKey::EnvVar(key::explicit_or(descriptor, || {
            key::env_var_name(&self.key_prefix, group_path, field_name)
        }))
    }

    fn resolve(&self, descriptor: &SecretDescriptor, ctx: &ResolveContext<'_>) -> Result<String> {
        let location = self.storage_key(descriptor, ctx.field_name, ctx.group_path);
        let value = match &location {
            StorageKey::EnvVar(name) => ctx.env.var(name),
            _ => None,
        };

        key::found_or_missing(value, self.backend(), &location, ctx.group_path, ctx.field_name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::SecretsError;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn derived_name_uses_prefix_groups_and_uppercase() {
        let vault = EnvPrefixSecrets::new("SECRET");
        let d = vault.secret();
        let groups = vec!["db".to_string()];

        assert_eq!(
            vault.storage_key(&d, "password", &groups),
            StorageKey::EnvVar("SECRET_DB_PASSWORD".into())
        );
    }

    #[test]
    fn explicit_name_is_used_verbatim() {
        let vault = EnvPrefixSecrets::new("SECRET");
        let d = vault.secret().with_name("not_password");
        let groups = vec!["db".to_string()];

        assert_eq!(
            vault.storage_key(&d, "password", &groups),
            StorageKey::EnvVar("not_password".into())
        );
    }

    #[test]
    fn resolves_from_the_given_environment() {
        let vault = EnvPrefixSecrets::new("SECRET");
        let env = env(&[("SECRET_X", "foo")]);
        let ctx = ResolveContext::new("x", &[], &env);

        assert_eq!(vault.resolve(&vault.secret(), &ctx).unwrap(), "foo");
    }

    #[test]
    fn missing_variable_reports_the_key() {
        let vault = EnvPrefixSecrets::new("SECRET");
        let env = env(&[]);
        let groups = vec!["db".to_string()];
        let ctx = ResolveContext::new("pw", &groups, &env);

        let err = vault.resolve(&vault.secret(), &ctx).unwrap_err();
        match err {
            SecretsError::MissingSecret {
                field,
                backend,
                key,
            } => {
                assert_eq!(field, "db.pw");
                assert_eq!(backend, "env");
                assert_eq!(key, "SECRET_DB_PW");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
