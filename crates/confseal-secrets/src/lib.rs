//! Secret resolution for declarative configuration.
//!
//! Applications declare which configuration fields are secrets; this crate
//! locates their values in a backing store at build time and hands them back
//! wrapped in a [`CensoredValue`], which renders as `<SECRET>` whenever the
//! enclosing configuration object is printed or serialized.
//!
//! # Modules
//!
//! - [`censored`]: the censoring string wrapper and its two rendering modes.
//! - [`descriptor`]: inert per-field declarations (explicit name, section,
//!   default, help).
//! - [`provider`]: the [`SecretsProvider`] contract.
//! - [`ini`]: INI-file backend, parsed once at construction.
//! - [`env`]: environment-variable backend (`PREFIX_GROUP_FIELD`).
//! - [`directory`]: one-file-per-secret backend.
//! - [`key`]: storage-key derivation shared by the backends.
//! - [`schema`]: schema builder and the resolution driver.
//! - [`tree`]: resolved configuration trees.
//! - [`environ`]: environment sources (live process env or a mapping).
//! - [`error`]: unified error types.
//!
//! # Quick Start
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use confseal_secrets::{EnvPrefixSecrets, Schema, SecretsProvider};
//!
//! # fn example() -> confseal_secrets::Result<()> {
//! let vault = EnvPrefixSecrets::new("SECRET");
//! let schema = Schema::new("App").group(
//!     "db",
//!     Schema::new("Db").secret("password", vault.secret()),
//! );
//!
//! let env: HashMap<String, String> =
//!     [("SECRET_DB_PASSWORD".to_string(), "hunter2".to_string())].into();
//! let config = schema.resolve(&env)?;
//!
//! assert_eq!(config.to_string(), "App(db=Db(password=<SECRET>))");
//! assert_eq!(config.secret("db.password").unwrap(), "hunter2");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod censored;
pub mod descriptor;
pub mod directory;
pub mod env;
pub mod environ;
pub mod error;
pub mod ini;
pub mod key;
pub mod provider;
pub mod schema;
pub mod tree;

// Re-export the most commonly used types at the crate root for convenience.
pub use censored::{CensoredValue, PLACEHOLDER};
pub use descriptor::{SecretDefault, SecretDescriptor};
pub use directory::DirectorySecrets;
pub use env::EnvPrefixSecrets;
pub use environ::{EnvSource, ProcessEnv};
pub use error::{Result, SecretsError};
pub use ini::FileSectionSecrets;
pub use key::StorageKey;
pub use provider::{ResolveContext, SecretsProvider};
pub use schema::{FieldKind, Schema, SchemaField, SecretHelp, resolve_field};
pub use tree::{ConfigTree, ConfigValue};
