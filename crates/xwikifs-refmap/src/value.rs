//! Values stored in and read from a [`RefMap`].
//!
//! Writes take an owned [`Value`]; reads hand back a borrowed [`ValueRef`]
//! in which reference markers have already been replaced by their content.

use std::fmt;

use serde_yaml::Value as Yaml;

use crate::map::RefMap;

/// A numeric scalar, kept as the text it was written with.
///
/// `1.10` stays `1.10` and `0x10` stays `0x10` when written back; the
/// numeric accessors interpret the text the way YAML does.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Number {
    text: String,
}

impl Number {
    /// Source text of the number.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_i64(&self) -> Option<i64> {
        serde_yaml::from_str(&self.text).ok()
    }

    pub fn as_u64(&self) -> Option<u64> {
        serde_yaml::from_str(&self.text).ok()
    }

    pub fn as_f64(&self) -> Option<f64> {
        serde_yaml::from_str(&self.text).ok()
    }

    pub(crate) fn from_source(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The number as a YAML node. Integers too large for YAML's number
    /// type become strings.
    pub(crate) fn to_yaml(&self) -> Yaml {
        match serde_yaml::from_str::<Yaml>(&self.text) {
            Ok(Yaml::Number(n)) => Yaml::Number(n),
            _ => Yaml::String(self.text.clone()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<serde_yaml::Number> for Number {
    fn from(value: serde_yaml::Number) -> Self {
        Self::from_source(value.to_string())
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Self::from_source(value.to_string())
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Self::from_source(value.to_string())
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        serde_yaml::Number::from(value).into()
    }
}

/// An owned value to store in a [`RefMap`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A string scalar. Strings matching the marker grammar declare a reference.
    String(String),
    /// A boolean scalar.
    Bool(bool),
    /// A numeric scalar, kept as written.
    Number(Number),
    /// A nested map with its own reference table.
    Nested(RefMap),
    /// A sequence or tagged node, kept verbatim and never resolved.
    Opaque(Yaml),
    /// An explicit null.
    Null,
}

impl Value {
    /// Borrow this value as a read view.
    pub fn view(&self) -> ValueRef<'_> {
        match self {
            Value::String(s) => ValueRef::Text(s),
            Value::Bool(b) => ValueRef::Bool(*b),
            Value::Number(n) => ValueRef::Number(n),
            Value::Nested(m) => ValueRef::Nested(m),
            Value::Opaque(v) => ValueRef::Opaque(v),
            Value::Null => ValueRef::Null,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<RefMap> for Value {
    fn from(value: RefMap) -> Self {
        Value::Nested(value)
    }
}

/// A resolved, borrowed view of a stored value.
///
/// Reference markers never appear here: a reference key reads as
/// [`ValueRef::Text`] holding the referenced content.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ValueRef<'a> {
    Text(&'a str),
    Bool(bool),
    Number(&'a Number),
    Nested(&'a RefMap),
    Opaque(&'a Yaml),
    Null,
}

impl<'a> ValueRef<'a> {
    /// Returns the text if this is a string (or resolved reference).
    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            ValueRef::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the nested map, if any.
    pub fn as_map(&self) -> Option<&'a RefMap> {
        match *self {
            ValueRef::Nested(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ValueRef::Null)
    }

    /// Canonical string form used when flattening attributes.
    ///
    /// Composite values render as compact JSON of their resolved content.
    /// `Null` has no string form.
    pub fn to_canonical_string(&self) -> Option<String> {
        match self {
            ValueRef::Text(s) => Some((*s).to_string()),
            ValueRef::Bool(b) => Some(b.to_string()),
            ValueRef::Number(n) => Some(n.to_string()),
            ValueRef::Nested(m) => Some(compact_json(&m.to_resolved_value())),
            ValueRef::Opaque(v) => Some(compact_json(v)),
            ValueRef::Null => None,
        }
    }

    /// Clone into an owned [`Value`].
    pub fn to_owned_value(&self) -> Value {
        match self {
            ValueRef::Text(s) => Value::String((*s).to_string()),
            ValueRef::Bool(b) => Value::Bool(*b),
            ValueRef::Number(n) => Value::Number((*n).clone()),
            ValueRef::Nested(m) => Value::Nested((*m).clone()),
            ValueRef::Opaque(v) => Value::Opaque((*v).clone()),
            ValueRef::Null => Value::Null,
        }
    }
}

fn compact_json(value: &Yaml) -> String {
    // YAML trees with non-string keys have no JSON form; fall back to YAML text.
    serde_json::to_string(value).unwrap_or_else(|_| {
        serde_yaml::to_string(value)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_scalars() {
        assert_eq!(ValueRef::Text("x").to_canonical_string().as_deref(), Some("x"));
        assert_eq!(ValueRef::Bool(true).to_canonical_string().as_deref(), Some("true"));
        let n = Number::from(42i64);
        assert_eq!(ValueRef::Number(&n).to_canonical_string().as_deref(), Some("42"));
        let written = Number::from_source("1.10");
        assert_eq!(ValueRef::Number(&written).to_canonical_string().as_deref(), Some("1.10"));
        assert_eq!(ValueRef::Null.to_canonical_string(), None);
    }

    #[test]
    fn canonical_nested_map_is_json() {
        let mut map = RefMap::new();
        map.put("a", "1x");
        map.put("b", true);
        let value = Value::Nested(map);
        assert_eq!(
            value.view().to_canonical_string().as_deref(),
            Some(r#"{"a":"1x","b":true}"#)
        );
    }

    #[test]
    fn canonical_sequence_is_json() {
        let seq: Yaml = serde_yaml::from_str("- a\n- 2\n").unwrap();
        assert_eq!(
            ValueRef::Opaque(&seq).to_canonical_string().as_deref(),
            Some(r#"["a",2]"#)
        );
    }

    #[test]
    fn owned_round_trip_through_view() {
        let value = Value::from("hello");
        assert_eq!(value.view().to_owned_value(), value);
        assert_eq!(value.view().as_str(), Some("hello"));
        assert!(value.view().as_map().is_none());
    }

    #[test]
    fn number_keeps_text_and_reads_as_yaml() {
        let hex = Number::from_source("0x10");
        assert_eq!(hex.as_str(), "0x10");
        assert_eq!(hex.as_i64(), Some(16));
        assert_eq!(hex.as_u64(), Some(16));

        let decimal = Number::from_source("1.10");
        assert_eq!(decimal.to_string(), "1.10");
        assert_eq!(decimal.as_f64(), Some(1.1));
        assert_eq!(decimal.as_i64(), None);

        assert_eq!(Number::from(1.5).as_str(), "1.5");
        assert_eq!(Number::from(7u64).as_i64(), Some(7));
    }

    #[test]
    fn oversized_integer_becomes_yaml_string() {
        let big = Number::from_source("123456789012345678901234567890");
        assert_eq!(big.as_u64(), None);
        assert_eq!(big.to_yaml(), Yaml::String(big.as_str().to_string()));
        assert!(matches!(Number::from_source("12").to_yaml(), Yaml::Number(_)));
    }
}
