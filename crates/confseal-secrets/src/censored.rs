//! A string wrapper that never leaks through structural rendering.
//!
//! [`CensoredValue`] compares, hashes, orders and concatenates exactly like
//! the string it wraps. Rendering is split in two modes:
//!
//! - **standalone**: code that explicitly formats one secret gets the payload
//!   ([`Display`](fmt::Display), [`CensoredValue::render_standalone`]).
//! - **as a field**: anything rendering a *container* that holds the value
//!   gets [`PLACEHOLDER`] instead ([`Debug`](fmt::Debug),
//!   [`CensoredValue::render_as_field`], `Serialize`). Derived `Debug`
//!   implementations call `Debug` on every field, so a configuration struct
//!   printed with `{:?}` is censored at any nesting depth.

use std::borrow::Borrow;
use std::fmt;
use std::ops::{Add, Deref};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Token substituted for a secret inside a container's rendering.
pub const PLACEHOLDER: &str = "<SECRET>";

/// An immutable secret string.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CensoredValue(String);

impl CensoredValue {
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    /// Borrow the payload.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the payload.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// The payload quoted as a plain string literal would be, e.g. `"abc"`.
    pub fn render_standalone(&self) -> String {
        format!("{:?}", self.0)
    }

    /// The rendering used when this value is a field of another value.
    pub fn render_as_field(&self) -> &'static str {
        PLACEHOLDER
    }
}

impl fmt::Display for CensoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for CensoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.render_as_field())
    }
}

impl Deref for CensoredValue {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CensoredValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// `Hash` is derived over the inner `String`, which hashes like `str`, so
// `HashMap<CensoredValue, _>` can be queried with a plain `&str`.
impl Borrow<str> for CensoredValue {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for CensoredValue {
    fn from(payload: String) -> Self {
        Self(payload)
    }
}

impl From<&str> for CensoredValue {
    fn from(payload: &str) -> Self {
        Self(payload.to_owned())
    }
}

impl From<CensoredValue> for String {
    fn from(value: CensoredValue) -> Self {
        value.0
    }
}

// ---------------------------------------------------------------------------
// Comparisons with plain strings
// ---------------------------------------------------------------------------

impl PartialEq<str> for CensoredValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CensoredValue {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<String> for CensoredValue {
    fn eq(&self, other: &String) -> bool {
        &self.0 == other
    }
}

impl PartialEq<CensoredValue> for str {
    fn eq(&self, other: &CensoredValue) -> bool {
        self == other.0
    }
}

impl PartialEq<CensoredValue> for &str {
    fn eq(&self, other: &CensoredValue) -> bool {
        *self == other.0
    }
}

impl PartialEq<CensoredValue> for String {
    fn eq(&self, other: &CensoredValue) -> bool {
        *self == other.0
    }
}

// ---------------------------------------------------------------------------
// Concatenation
// ---------------------------------------------------------------------------

impl Add<&str> for &CensoredValue {
    type Output = String;

    fn add(self, rhs: &str) -> String {
        let mut out = String::with_capacity(self.0.len() + rhs.len());
        out.push_str(&self.0);
        out.push_str(rhs);
        out
    }
}

impl Add<&str> for CensoredValue {
    type Output = String;

    fn add(self, rhs: &str) -> String {
        self.0 + rhs
    }
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

impl Serialize for CensoredValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(PLACEHOLDER)
    }
}

impl<'de> Deserialize<'de> for CensoredValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn standalone_rendering_is_the_quoted_payload() {
        let s = CensoredValue::new("abc");
        assert_eq!(s.render_standalone(), "\"abc\"");
        assert_eq!(s.to_string(), "abc");
        assert_eq!(format!("{s}"), "abc");
    }

    #[test]
    fn container_rendering_is_censored() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct C {
            s: CensoredValue,
        }

        let rendered = format!("{:?}", C { s: CensoredValue::new("abc") });
        assert_eq!(rendered, "C { s: <SECRET> }");
        assert!(!rendered.contains("abc"));
    }

    #[test]
    fn nested_container_rendering_is_censored() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Db {
            password: CensoredValue,
        }

        #[derive(Debug)]
        #[allow(dead_code)]
        struct App {
            db: Db,
            tokens: Vec<CensoredValue>,
            maybe: Option<CensoredValue>,
        }

        let app = App {
            db: Db { password: "hunter2".into() },
            tokens: vec!["t1".into(), "t2".into()],
            maybe: Some("t3".into()),
        };
        let rendered = format!("{app:?}");
        let pretty = format!("{app:#?}");

        for payload in ["hunter2", "t1", "t2", "t3"] {
            assert!(!rendered.contains(payload));
            assert!(!pretty.contains(payload));
        }
        assert_eq!(rendered.matches(PLACEHOLDER).count(), 4);
    }

    #[test]
    fn behaves_like_its_payload() {
        let s = CensoredValue::new("foo");
        assert_eq!(s, "foo");
        assert_eq!("foo", s);
        assert_eq!(s, String::from("foo"));
        assert_eq!(s.len(), 3);
        assert!(s.starts_with('f'));
        assert_eq!(&s + "bar", "foobar");
        assert!(CensoredValue::new("a") < CensoredValue::new("b"));
    }

    #[test]
    fn usable_as_map_key_looked_up_by_str() {
        let mut map = HashMap::new();
        map.insert(CensoredValue::new("key"), 1);
        assert_eq!(map.get("key"), Some(&1));
    }

    #[test]
    fn serializes_as_placeholder() {
        let json = serde_json::to_string(&CensoredValue::new("abc")).unwrap();
        assert_eq!(json, "\"<SECRET>\"");

        let back: CensoredValue = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(back, "abc");
    }
}
