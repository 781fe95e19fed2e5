//! TOML schema files.
//!
//! A schema file names the providers and declares the secret fields:
//!
//! ```toml
//! name = "App"
//!
//! [providers.ini]
//! kind = "ini"
//! path = "secrets.ini"        # or path_env = "APP_SECRETS_INI"
//! section = "secrets"
//!
//! [providers.vault]
//! kind = "env"
//! prefix = "APP"
//!
//! [[fields]]
//! name = "api_token"
//! provider = "vault"
//! help = "Token for the upstream API"
//!
//! [[fields]]
//! name = "db"
//! schema = "Db"
//!
//! [[fields.fields]]
//! name = "password"
//! provider = "ini"
//! ```
//!
//! A field with child `fields` is a group. `provider` may be omitted when
//! exactly one provider is declared. Relative paths are taken relative to the
//! schema file's directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::debug;

use confseal_secrets::{
    DirectorySecrets, EnvPrefixSecrets, EnvSource, FileSectionSecrets, Schema, SecretDescriptor,
    SecretsProvider,
};

// ---------------------------------------------------------------------------
// File model
// ---------------------------------------------------------------------------

/// Top level of a schema file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    pub name: String,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderSpec>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// One `[providers.<id>]` table.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderSpec {
    Ini {
        path: Option<PathBuf>,
        path_env: Option<String>,
        section: Option<String>,
    },
    Env {
        prefix: String,
    },
    Directory {
        path: Option<PathBuf>,
        path_env: Option<String>,
    },
}

/// One `[[fields]]` entry, secret or group.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,
    pub provider: Option<String>,
    /// Explicit storage key name.
    pub key: Option<String>,
    /// Explicit INI section.
    pub section: Option<String>,
    pub default: Option<String>,
    pub help: Option<String>,
    /// Name of the group's schema; defaults to the field name.
    pub schema: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// A constructed provider.
enum Provider {
    Ini(FileSectionSecrets),
    Env(EnvPrefixSecrets),
    Directory(DirectorySecrets),
}

impl Provider {
    fn build(id: &str, spec: &ProviderSpec, base_dir: &Path, env: &dyn EnvSource) -> Result<Self> {
        let provider = match spec {
            ProviderSpec::Ini {
                path,
                path_env,
                section,
            } => {
                let path = locate(id, path.as_deref(), path_env.as_deref(), base_dir, env)?;
                let section = section
                    .as_deref()
                    .unwrap_or(confseal_secrets::ini::DEFAULT_SECTION);
                let ini = FileSectionSecrets::from_path_with_section(&path, section)
                    .with_context(|| format!("provider `{id}`: failed to load ini secrets"))?;
                Self::Ini(ini)
            }
            ProviderSpec::Env { prefix } => Self::Env(EnvPrefixSecrets::new(prefix.as_str())),
            ProviderSpec::Directory { path, path_env } => {
                let path = locate(id, path.as_deref(), path_env.as_deref(), base_dir, env)?;
                Self::Directory(DirectorySecrets::from_path(path))
            }
        };
        debug!(provider = id, backend = provider.backend(), "provider ready");
        Ok(provider)
    }

    fn backend(&self) -> &'static str {
        match self {
            Self::Ini(p) => p.backend(),
            Self::Env(p) => p.backend(),
            Self::Directory(p) => p.backend(),
        }
    }

    fn secret(&self, field: &FieldSpec) -> Result<SecretDescriptor> {
        let descriptor = match (self, field.section.as_deref()) {
            (Self::Ini(p), Some(section)) => p.secret_in(section),
            (Self::Ini(p), None) => p.secret(),
            (_, Some(_)) => bail!(
                "field `{}`: `section` is only supported by ini providers",
                field.name
            ),
            (Self::Env(p), None) => p.secret(),
            (Self::Directory(p), None) => p.secret(),
        };
        Ok(descriptor)
    }
}

/// Resolve a provider path from `path_env`, then `path`.
fn locate(
    id: &str,
    path: Option<&Path>,
    path_env: Option<&str>,
    base_dir: &Path,
    env: &dyn EnvSource,
) -> Result<PathBuf> {
    let from_env = path_env.and_then(|var| env.var(var)).map(PathBuf::from);
    let Some(found) = from_env.or_else(|| path.map(Path::to_path_buf)) else {
        bail!("provider `{id}`: neither `path` nor a set `path_env` variable was given");
    };
    Ok(if found.is_relative() {
        base_dir.join(found)
    } else {
        found
    })
}

impl SchemaFile {
    /// Read and parse a schema file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read schema file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse schema file {}", path.display()))
    }

    /// Construct the providers and the [`Schema`] they back.
    pub fn build(&self, base_dir: &Path, env: &dyn EnvSource) -> Result<Schema> {
        let mut providers = BTreeMap::new();
        for (id, spec) in &self.providers {
            providers.insert(id.as_str(), Provider::build(id, spec, base_dir, env)?);
        }

        build_group(&self.name, &self.fields, &providers)
    }
}

fn build_group(
    name: &str,
    fields: &[FieldSpec],
    providers: &BTreeMap<&str, Provider>,
) -> Result<Schema> {
    let mut schema = Schema::new(name);
    for field in fields {
        if !field.fields.is_empty() {
            let group_name = field.schema.as_deref().unwrap_or(field.name.as_str());
            let group = build_group(group_name, &field.fields, providers)?;
            schema = schema.group(field.name.as_str(), group);
            continue;
        }
        if let Some(group_name) = &field.schema {
            bail!(
                "field `{}`: group schema `{group_name}` declares no fields",
                field.name
            );
        }

        let provider = pick_provider(field, providers)?;
        let mut descriptor = provider.secret(field)?;
        if let Some(key) = &field.key {
            descriptor = descriptor.with_name(key.as_str());
        }
        if let Some(default) = &field.default {
            descriptor = descriptor.with_default(default.as_str());
        }
        if let Some(help) = &field.help {
            descriptor = descriptor.with_help(help.as_str());
        }
        schema = schema.secret(field.name.as_str(), descriptor);
    }
    Ok(schema)
}

fn pick_provider<'a>(
    field: &FieldSpec,
    providers: &'a BTreeMap<&str, Provider>,
) -> Result<&'a Provider> {
    match field.provider.as_deref() {
        Some(id) => providers
            .get(id)
            .with_context(|| format!("field `{}`: unknown provider `{id}`", field.name)),
        None => match providers.values().next() {
            Some(only) if providers.len() == 1 => Ok(only),
            _ => bail!(
                "field `{}`: `provider` is required when {} providers are declared",
                field.name,
                providers.len()
            ),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const INI: &str = "[secrets]\npassword = foobar\ndb_password = nested!\n[other]\ntoken = t0k\n";

    const SCHEMA: &str = r#"
name = "App"

[providers.ini]
kind = "ini"
path = "secrets.ini"

[providers.vault]
kind = "env"
prefix = "APP"

[[fields]]
name = "api_token"
provider = "vault"
help = "Token for the upstream API"

[[fields]]
name = "fallback"
provider = "vault"
default = "plain"

[[fields]]
name = "other_token"
provider = "ini"
section = "other"
key = "token"

[[fields]]
name = "db"
schema = "Db"

[[fields.fields]]
name = "password"
provider = "ini"
"#;

    fn workspace(schema: &str) -> (tempfile::TempDir, SchemaFile) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("secrets.ini"), INI).unwrap();
        let schema_path = dir.path().join("confseal.toml");
        std::fs::write(&schema_path, schema).unwrap();
        let file = SchemaFile::load(&schema_path).unwrap();
        (dir, file)
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn builds_and_resolves_a_schema_file() {
        let (dir, file) = workspace(SCHEMA);
        let env = env(&[("APP_API_TOKEN", "tok")]);

        let schema = file.build(dir.path(), &env).unwrap();
        let cfg = schema.resolve(&env).unwrap();

        assert_eq!(
            cfg.to_string(),
            "App(api_token=<SECRET>, fallback=\"plain\", other_token=<SECRET>, db=Db(password=<SECRET>))"
        );
        assert_eq!(cfg.secret("other_token").unwrap(), "t0k");
        assert_eq!(cfg.secret("db.password").unwrap(), "nested!");
        assert!(
            schema
                .render_help()
                .contains("db.password (ini, required): [secrets] db_password")
        );
    }

    #[test]
    fn path_env_overrides_path() {
        let (dir, _) = workspace(SCHEMA);
        let alt = dir.path().join("alt.ini");
        std::fs::write(&alt, "[secrets]\npassword = alt\n").unwrap();

        let text = "name = \"C\"\n[providers.ini]\nkind = \"ini\"\npath = \"secrets.ini\"\npath_env = \"ALT_INI\"\n[[fields]]\nname = \"password\"\n";
        let file: SchemaFile = toml::from_str(text).unwrap();
        let env = env(&[("ALT_INI", alt.to_str().unwrap())]);

        let cfg = file.build(dir.path(), &env).unwrap().resolve(&env).unwrap();
        assert_eq!(cfg.secret("password").unwrap(), "alt");
    }

    #[test]
    fn section_on_env_provider_is_rejected() {
        let text = "name = \"C\"\n[providers.v]\nkind = \"env\"\nprefix = \"X\"\n[[fields]]\nname = \"a\"\nsection = \"s\"\n";
        let file: SchemaFile = toml::from_str(text).unwrap();
        let err = file.build(Path::new("."), &env(&[])).unwrap_err();
        assert!(err.to_string().contains("only supported by ini"));
    }

    #[test]
    fn provider_required_when_ambiguous() {
        let (dir, file) = workspace(
            "name = \"C\"\n[providers.a]\nkind = \"env\"\nprefix = \"A\"\n[providers.b]\nkind = \"env\"\nprefix = \"B\"\n[[fields]]\nname = \"x\"\n",
        );
        let err = file.build(dir.path(), &env(&[])).unwrap_err();
        assert!(err.to_string().contains("`provider` is required"));
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let (dir, file) = workspace(
            "name = \"C\"\n[providers.a]\nkind = \"env\"\nprefix = \"A\"\n[[fields]]\nname = \"x\"\nprovider = \"nope\"\n",
        );
        let err = file.build(dir.path(), &env(&[])).unwrap_err();
        assert!(err.to_string().contains("unknown provider `nope`"));
    }

    #[test]
    fn missing_ini_file_fails_at_build() {
        let text = "name = \"C\"\n[providers.ini]\nkind = \"ini\"\npath = \"absent.ini\"\n";
        let file: SchemaFile = toml::from_str(text).unwrap();
        let dir = tempfile::tempdir().unwrap();
        assert!(file.build(dir.path(), &env(&[])).is_err());
    }

    #[test]
    fn group_without_fields_is_rejected() {
        let (dir, file) = workspace(
            "name = \"C\"\n[providers.a]\nkind = \"env\"\nprefix = \"A\"\n[[fields]]\nname = \"db\"\nschema = \"Db\"\n",
        );
        let err = file.build(dir.path(), &env(&[])).unwrap_err();
        assert!(err.to_string().contains("group schema `Db` declares no fields"));
    }

    #[test]
    fn unknown_field_keys_are_rejected() {
        let text = "name = \"C\"\n[[fields]]\nname = \"x\"\nbogus = 1\n";
        assert!(toml::from_str::<SchemaFile>(text).is_err());
    }
}
