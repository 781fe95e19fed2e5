//! Resolved configuration trees.
//!
//! [`ConfigTree`] is what the resolution driver produces: an ordered list of
//! field values, some of which are nested groups. Rendering a tree renders
//! every field through its *as-field* mode, so secrets always show up as
//! [`PLACEHOLDER`](crate::censored::PLACEHOLDER).

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::censored::CensoredValue;

/// A single resolved field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    /// An explicit "no value" default.
    Null,
    /// A plain string, e.g. a default that was not declared as secret.
    Text(String),
    /// A value found in a secrets backend.
    Secret(CensoredValue),
    /// A nested group.
    Group(ConfigTree),
}

impl ConfigValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// String payload of a `Text` or `Secret` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Secret(secret) => Some(secret.as_str()),
            Self::Null | Self::Group(_) => None,
        }
    }

    pub fn as_secret(&self) -> Option<&CensoredValue> {
        match self {
            Self::Secret(secret) => Some(secret),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&ConfigTree> {
        match self {
            Self::Group(tree) => Some(tree),
            _ => None,
        }
    }

    /// Render this value as a field of an enclosing tree.
    pub fn render_as_field(&self) -> String {
        match self {
            Self::Null => "None".to_owned(),
            Self::Text(text) => format!("{text:?}"),
            Self::Secret(secret) => secret.render_as_field().to_owned(),
            Self::Group(tree) => tree.to_string(),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for ConfigValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<CensoredValue> for ConfigValue {
    fn from(secret: CensoredValue) -> Self {
        Self::Secret(secret)
    }
}

impl From<ConfigTree> for ConfigValue {
    fn from(tree: ConfigTree) -> Self {
        Self::Group(tree)
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Secret(secret) => secret.serialize(serializer),
            Self::Group(tree) => tree.serialize(serializer),
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigTree
// ---------------------------------------------------------------------------

/// A resolved configuration object.
#[derive(Clone, PartialEq, Eq)]
pub struct ConfigTree {
    name: String,
    entries: Vec<(String, ConfigValue)>,
}

impl ConfigTree {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, field: impl Into<String>, value: ConfigValue) {
        self.entries.push((field.into(), value));
    }

    /// Name of the schema this tree was resolved from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Value of a direct field.
    pub fn get(&self, field: &str) -> Option<&ConfigValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Value at a dotted path such as `db.password`.
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        let mut segments = path.split('.');
        let mut value = self.get(segments.next()?)?;
        for segment in segments {
            value = value.as_group()?.get(segment)?;
        }
        Some(value)
    }

    /// Secret at a dotted path, if that path resolved to a secret.
    pub fn secret(&self, path: &str) -> Option<&CensoredValue> {
        self.get_path(path).and_then(ConfigValue::as_secret)
    }

    /// Nested group at a direct field.
    pub fn group(&self, field: &str) -> Option<&ConfigTree> {
        self.get(field).and_then(ConfigValue::as_group)
    }
}

/// `Name(field=value, group=Group(...))` with every secret censored.
impl fmt::Display for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, (field, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}={}", value.render_as_field())?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for ConfigTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, value) in &self.entries {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfigTree {
        let mut db = ConfigTree::new("DB");
        db.push("password", ConfigValue::Secret("nested!".into()));

        let mut app = ConfigTree::new("C");
        app.push("s", ConfigValue::Secret("abc".into()));
        app.push("note", "plain".into());
        app.push("empty", ConfigValue::Null);
        app.push("db", ConfigValue::Group(db));
        app
    }

    #[test]
    fn renders_secrets_as_placeholder_at_any_depth() {
        let rendered = sample().to_string();
        assert_eq!(
            rendered,
            "C(s=<SECRET>, note=\"plain\", empty=None, db=DB(password=<SECRET>))"
        );
        assert_eq!(format!("{:?}", sample()), rendered);
    }

    #[test]
    fn single_field_rendering_matches_tree_rendering() {
        let mut tree = ConfigTree::new("C");
        tree.push("s", ConfigValue::Secret("abc".into()));
        assert_eq!(tree.to_string(), "C(s=<SECRET>)");
    }

    #[test]
    fn path_lookup() {
        let tree = sample();
        assert_eq!(tree.secret("db.password").unwrap(), "nested!");
        assert_eq!(tree.get_path("note").and_then(ConfigValue::as_str), Some("plain"));
        assert!(tree.get_path("db.missing").is_none());
        assert!(tree.get_path("note.deeper").is_none());
        assert!(tree.secret("note").is_none());
        assert_eq!(tree.group("db").unwrap().name(), "DB");
    }

    #[test]
    fn json_snapshot_never_contains_payloads() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "s": "<SECRET>",
                "note": "plain",
                "empty": null,
                "db": { "password": "<SECRET>" },
            })
        );
    }
}
