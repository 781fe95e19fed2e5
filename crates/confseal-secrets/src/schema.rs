//! Schema declaration and the resolution driver.
//!
//! A [`Schema`] lists, in order, each field's name and either its
//! [`SecretDescriptor`] or a nested group schema. [`Schema::resolve`] walks
//! that tree depth-first and, for every secret:
//!
//! 1. asks the descriptor's provider to resolve it in its schema context
//!    (field name plus the names of the enclosing groups),
//! 2. wraps a hit in [`CensoredValue`],
//! 3. on a miss, uses the declared default verbatim, or aborts the whole
//!    resolution with [`SecretsError::MissingSecret`].
//!
//! No partial tree is ever returned.
//!
//! ```rust,no_run
//! use confseal_secrets::{EnvPrefixSecrets, FileSectionSecrets, ProcessEnv, Schema, SecretsProvider};
//!
//! # fn example() -> confseal_secrets::Result<()> {
//! let ini = FileSectionSecrets::from_path("secrets.ini")?;
//! let vault = EnvPrefixSecrets::new("APP");
//!
//! let schema = Schema::new("App")
//!     .secret("api_token", vault.secret().with_help("Token for the upstream API"))
//!     .group(
//!         "db",
//!         Schema::new("Db").secret("password", ini.secret()),
//!     );
//!
//! let config = schema.resolve(&ProcessEnv)?;
//! println!("{config}"); // App(api_token=<SECRET>, db=Db(password=<SECRET>))
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::censored::CensoredValue;
use crate::descriptor::{SecretDefault, SecretDescriptor};
use crate::environ::{EnvSource, ProcessEnv};
use crate::error::{Result, SecretsError};
use crate::key::{self, StorageKey};
use crate::provider::ResolveContext;
use crate::tree::{ConfigTree, ConfigValue};

// ---------------------------------------------------------------------------
// Declaration
// ---------------------------------------------------------------------------

/// What a schema field holds.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Secret(SecretDescriptor),
    Group(Schema),
}

/// One declared field.
#[derive(Debug, Clone)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
}

/// An ordered declaration of secret fields and nested groups.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<SchemaField>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Declare a secret field.
    pub fn secret(mut self, field: impl Into<String>, descriptor: SecretDescriptor) -> Self {
        self.fields.push(SchemaField {
            name: field.into(),
            kind: FieldKind::Secret(descriptor),
        });
        self
    }

    /// Declare a nested group.
    pub fn group(mut self, field: impl Into<String>, schema: Schema) -> Self {
        self.fields.push(SchemaField {
            name: field.into(),
            kind: FieldKind::Group(schema),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Check field names: non-empty, no `.`, unique within each group.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() || field.name.contains('.') {
                return Err(SecretsError::InvalidSchema {
                    reason: format!("invalid field name `{}` in `{}`", field.name, self.name),
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SecretsError::InvalidSchema {
                    reason: format!("duplicate field `{}` in `{}`", field.name, self.name),
                });
            }
            if let FieldKind::Group(group) = &field.kind {
                group.validate()?;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Resolve every secret against `env`.
    ///
    /// # Errors
    ///
    /// [`SecretsError::InvalidSchema`] for a malformed schema,
    /// [`SecretsError::MissingSecret`] for the first required secret that
    /// could not be found, or any backing-store error a provider reports.
    pub fn resolve(&self, env: &dyn EnvSource) -> Result<ConfigTree> {
        self.validate()?;
        let mut group_path = Vec::new();
        let tree = self.resolve_group(&mut group_path, env)?;
        tracing::debug!(schema = %self.name, "configuration resolved");
        Ok(tree)
    }

    /// Resolve against the live process environment.
    pub fn resolve_from_process_env(&self) -> Result<ConfigTree> {
        self.resolve(&ProcessEnv)
    }

    fn resolve_group(&self, group_path: &mut Vec<String>, env: &dyn EnvSource) -> Result<ConfigTree> {
        let mut tree = ConfigTree::new(&self.name);
        for field in &self.fields {
            let value = match &field.kind {
                FieldKind::Secret(descriptor) => {
                    resolve_field(descriptor, &field.name, group_path, env)?
                }
                FieldKind::Group(schema) => {
                    group_path.push(field.name.clone());
                    let nested = schema.resolve_group(group_path, env);
                    group_path.pop();
                    ConfigValue::Group(nested?)
                }
            };
            tree.push(field.name.clone(), value);
        }
        Ok(tree)
    }

    // -----------------------------------------------------------------------
    // Help
    // -----------------------------------------------------------------------

    /// One entry per secret field, depth-first in declaration order.
    pub fn describe(&self) -> Vec<SecretHelp> {
        let mut out = Vec::new();
        let mut group_path = Vec::new();
        self.describe_into(&mut group_path, &mut out);
        out
    }

    fn describe_into(&self, group_path: &mut Vec<String>, out: &mut Vec<SecretHelp>) {
        for field in &self.fields {
            match &field.kind {
                FieldKind::Secret(descriptor) => out.push(SecretHelp {
                    path: key::field_path(group_path, &field.name),
                    backend: descriptor.provider().backend(),
                    key: descriptor
                        .provider()
                        .storage_key(descriptor, &field.name, group_path),
                    required: !descriptor.default_value().is_set(),
                    help: descriptor.help().map(str::to_owned),
                }),
                FieldKind::Group(schema) => {
                    group_path.push(field.name.clone());
                    schema.describe_into(group_path, out);
                    group_path.pop();
                }
            }
        }
    }

    /// Human-readable listing of every secret and where it is read from.
    pub fn render_help(&self) -> String {
        let mut out = String::new();
        for entry in self.describe() {
            let requirement = if entry.required { "required" } else { "optional" };
            let _ = writeln!(
                out,
                "{} ({}, {}): {}",
                entry.path, entry.backend, requirement, entry.key
            );
            if let Some(help) = &entry.help {
                let _ = writeln!(out, "    {help}");
            }
        }
        out
    }
}

/// Where one secret field is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretHelp {
    /// Dotted field path from the schema root.
    pub path: String,
    pub backend: &'static str,
    pub key: StorageKey,
    /// `false` when a default is declared.
    pub required: bool,
    pub help: Option<String>,
}

/// Resolve a single secret field.
///
/// This is the per-field step of [`Schema::resolve`], exposed for callers
/// that walk their own schema structures.
pub fn resolve_field(
    descriptor: &SecretDescriptor,
    field_name: &str,
    group_path: &[String],
    env: &dyn EnvSource,
) -> Result<ConfigValue> {
    let ctx = ResolveContext::new(field_name, group_path, env);
    let provider = descriptor.provider();

    match provider.resolve(descriptor, &ctx) {
        Ok(raw) => {
            tracing::debug!(
                field = %ctx.field_path(),
                backend = provider.backend(),
                "resolved secret"
            );
            Ok(ConfigValue::Secret(CensoredValue::new(raw)))
        }
        Err(err) if err.is_missing() => match descriptor.default_value() {
            SecretDefault::Set(value) => {
                tracing::debug!(
                    field = %ctx.field_path(),
                    backend = provider.backend(),
                    "secret not found, using declared default"
                );
                Ok(value.clone())
            }
            SecretDefault::NotSet => Err(err),
        },
        Err(err) => Err(err),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::env::EnvPrefixSecrets;
    use crate::provider::SecretsProvider;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn resolves_nested_groups_with_composed_prefix() {
        let vault = EnvPrefixSecrets::new("SECRET");
        let schema = Schema::new("App")
            .secret("token", vault.secret())
            .group(
                "db",
                Schema::new("Db").group(
                    "primary",
                    Schema::new("Primary").secret("password", vault.secret()),
                ),
            );

        let env = env(&[("SECRET_TOKEN", "t"), ("SECRET_DB_PRIMARY_PASSWORD", "p")]);
        let cfg = schema.resolve(&env).unwrap();

        assert_eq!(cfg.secret("token").unwrap(), "t");
        assert_eq!(cfg.secret("db.primary.password").unwrap(), "p");
        assert_eq!(
            cfg.to_string(),
            "App(token=<SECRET>, db=Db(primary=Primary(password=<SECRET>)))"
        );
    }

    #[test]
    fn missing_required_secret_aborts_whole_tree() {
        let vault = EnvPrefixSecrets::new("SECRET");
        let schema = Schema::new("App")
            .secret("present", vault.secret())
            .secret("absent", vault.secret());

        let err = schema.resolve(&env(&[("SECRET_PRESENT", "x")])).unwrap_err();
        match err {
            SecretsError::MissingSecret { field, key, .. } => {
                assert_eq!(field, "absent");
                assert_eq!(key, "SECRET_ABSENT");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn defaults_pass_through_unchanged() {
        let vault = EnvPrefixSecrets::new("SECRET");
        let schema = Schema::new("App")
            .secret("plain", vault.secret().with_default("fallback"))
            .secret("censored", vault.secret().with_default(CensoredValue::new("hidden")))
            .secret("nothing", vault.secret().with_null_default())
            .secret("found", vault.secret().with_default("not used"));

        let cfg = schema.resolve(&env(&[("SECRET_FOUND", "real")])).unwrap();

        assert_eq!(cfg.get("plain"), Some(&ConfigValue::Text("fallback".into())));
        assert_eq!(
            cfg.get("censored"),
            Some(&ConfigValue::Secret(CensoredValue::new("hidden")))
        );
        assert_eq!(cfg.get("nothing"), Some(&ConfigValue::Null));
        assert_eq!(cfg.secret("found").unwrap(), "real");
    }

    #[test]
    fn rejects_duplicate_and_dotted_field_names() {
        let vault = EnvPrefixSecrets::new("SECRET");
        let dup = Schema::new("App")
            .secret("a", vault.secret())
            .secret("a", vault.secret());
        assert!(matches!(
            dup.resolve(&env(&[])),
            Err(SecretsError::InvalidSchema { .. })
        ));

        let dotted = Schema::new("App").group("g", Schema::new("G").secret("a.b", vault.secret()));
        assert!(matches!(
            dotted.validate(),
            Err(SecretsError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn describe_lists_every_secret_with_its_key() {
        let vault = EnvPrefixSecrets::new("SECRET");
        let schema = Schema::new("App")
            .secret("token", vault.secret().with_help("API token"))
            .group(
                "db",
                Schema::new("Db").secret("password", vault.secret().with_default("x")),
            );

        let help = schema.describe();
        assert_eq!(help.len(), 2);
        assert_eq!(help[0].path, "token");
        assert_eq!(help[0].key, StorageKey::EnvVar("SECRET_TOKEN".into()));
        assert!(help[0].required);
        assert_eq!(help[0].help.as_deref(), Some("API token"));
        assert_eq!(help[1].path, "db.password");
        assert_eq!(help[1].key, StorageKey::EnvVar("SECRET_DB_PASSWORD".into()));
        assert!(!help[1].required);

        let text = schema.render_help();
        assert!(text.contains("token (env, required): SECRET_TOKEN\n    API token\n"));
        assert!(text.contains("db.password (env, optional): SECRET_DB_PASSWORD\n"));
    }

    #[test]
    fn resolve_field_wraps_hits() {
        let vault = EnvPrefixSecrets::new("SECRET");
        let value = resolve_field(&vault.secret(), "x", &[], &env(&[("SECRET_X", "foo")])).unwrap();
        assert_eq!(value, ConfigValue::Secret(CensoredValue::new("foo")));
    }
}
