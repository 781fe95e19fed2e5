//! Declarative secret placeholders.
//!
//! A [`SecretDescriptor`] is produced by [`SecretsProvider::secret`] when a
//! schema field is declared as secret. It does no I/O: it only records how
//! the value should be located later and which provider will do it.

use std::fmt;
use std::sync::Arc;

use crate::provider::SecretsProvider;
use crate::tree::ConfigValue;

/// The default of a secret field.
///
/// `NotSet` is distinct from `Set(ConfigValue::Null)`: a field may legitimately
/// default to "no value" and still never fail resolution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SecretDefault {
    #[default]
    NotSet,
    Set(ConfigValue),
}

impl SecretDefault {
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }
}

/// How one field's secret is located.
#[derive(Clone)]
pub struct SecretDescriptor {
    provider: Arc<dyn SecretsProvider>,
    name: Option<String>,
    section: Option<String>,
    default: SecretDefault,
    help: Option<String>,
}

impl SecretDescriptor {
    /// A descriptor with no overrides, resolved by `provider`.
    pub fn new(provider: Arc<dyn SecretsProvider>) -> Self {
        Self {
            provider,
            name: None,
            section: None,
            default: SecretDefault::NotSet,
            help: None,
        }
    }

    /// Look the secret up under `name` instead of a name derived from the
    /// field and its groups.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Read the secret from `section` (INI backend only; other backends
    /// ignore it).
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Use `value` verbatim when the secret is missing.
    ///
    /// A plain string stays a plain [`ConfigValue::Text`]; pass a
    /// [`CensoredValue`](crate::CensoredValue) to get a censored default.
    pub fn with_default(mut self, value: impl Into<ConfigValue>) -> Self {
        self.default = SecretDefault::Set(value.into());
        self
    }

    /// Resolve to [`ConfigValue::Null`] when the secret is missing.
    pub fn with_null_default(mut self) -> Self {
        self.default = SecretDefault::Set(ConfigValue::Null);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn provider(&self) -> &Arc<dyn SecretsProvider> {
        &self.provider
    }

    pub fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn explicit_section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    pub fn default_value(&self) -> &SecretDefault {
        &self.default
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }
}

impl fmt::Debug for SecretDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretDescriptor")
            .field("backend", &self.provider.backend())
            .field("name", &self.name)
            .field("section", &self.section)
            .field("default", &self.default)
            .field("help", &self.help)
            .finish()
    }
}
