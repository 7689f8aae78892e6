//! Source text capture for scalars.
//!
//! Resolving a plain scalar into a typed value forgets how it was written
//! (`1.10` reads back as `1.1`, `0x10` as `16`, `~` as `null`). Loading
//! therefore walks the document twice: the first pass learns the node
//! shapes with `deserialize_any`, the second asks for every scalar as a
//! string, which yields the exact text found in the file.

use std::fmt;

use serde::de::{
    self, DeserializeSeed, Deserializer, EnumAccess, IgnoredAny, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use serde::Deserialize;
use serde_yaml::Value as Yaml;

use crate::error::{RefMapError, Result};

/// How YAML resolved an untagged scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScalarKind {
    Null,
    Bool(bool),
    Number,
    Text,
}

/// A scalar together with its source text.
///
/// `plain` is set when `text` was written unquoted on a single line, so
/// writing `text` back reproduces the original bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Scalar {
    pub kind: ScalarKind,
    pub text: String,
    pub plain: bool,
}

/// A document node as seen by the second pass.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Node {
    Map(Vec<(Scalar, Node)>),
    Scalar(Scalar),
    /// Sequences and tagged nodes, resolved by serde_yaml.
    Other(Yaml),
}

/// Parse `text` into top-level mapping entries.
///
/// Returns `None` for an empty (or null) document.
pub(crate) fn parse(text: &str) -> Result<Option<Vec<(Scalar, Node)>>> {
    let shape = Shape::deserialize(serde_yaml::Deserializer::from_str(text))?;
    match &shape {
        Shape::Scalar(ScalarKind::Null) => Ok(None),
        Shape::Map(_) => {
            check_keys(&shape)?;
            let seed = NodeSeed {
                shape: &shape,
                input: text,
            };
            match seed.deserialize(serde_yaml::Deserializer::from_str(text))? {
                Node::Map(entries) => Ok(Some(entries)),
                _ => Err(RefMapError::Malformed(
                    "document changed shape between passes".to_string(),
                )),
            }
        }
        other => Err(RefMapError::Malformed(format!(
            "expected a mapping at the top level, found {}",
            other.kind_name()
        ))),
    }
}

fn check_keys(shape: &Shape) -> Result<()> {
    if let Shape::Map(entries) = shape {
        for (key, value) in entries {
            if !matches!(key, Shape::Scalar(_)) {
                return Err(RefMapError::Malformed(format!(
                    "unsupported {} used as a key",
                    key.kind_name()
                )));
            }
            check_keys(value)?;
        }
    }
    Ok(())
}

/// Whether `value` is a slice of `input` that is not preceded by a quote.
fn is_plain(input: &str, value: &str) -> bool {
    let start = input.as_ptr() as usize;
    let at = value.as_ptr() as usize;
    if at < start || at + value.len() > start + input.len() {
        return false;
    }
    let offset = at - start;
    offset == 0 || !matches!(input.as_bytes().get(offset - 1), Some(b'\'') | Some(b'"'))
}

// ---------------------------------------------------------------
// First pass: shapes
// ---------------------------------------------------------------

#[derive(Debug)]
enum Shape {
    Map(Vec<(Shape, Shape)>),
    Scalar(ScalarKind),
    Other,
}

impl Shape {
    fn kind_name(&self) -> &'static str {
        match self {
            Shape::Map(_) => "mapping",
            Shape::Scalar(ScalarKind::Null) => "null",
            Shape::Scalar(ScalarKind::Bool(_)) => "boolean",
            Shape::Scalar(ScalarKind::Number) => "number",
            Shape::Scalar(ScalarKind::Text) => "string",
            Shape::Other => "sequence or tagged value",
        }
    }
}

impl<'de> Deserialize<'de> for Shape {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ShapeVisitor)
    }
}

struct ShapeVisitor;

impl<'de> Visitor<'de> for ShapeVisitor {
    type Value = Shape;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any YAML node")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Shape, E> {
        Ok(Shape::Scalar(ScalarKind::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> std::result::Result<Shape, E> {
        Ok(Shape::Scalar(ScalarKind::Number))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> std::result::Result<Shape, E> {
        Ok(Shape::Scalar(ScalarKind::Number))
    }

    fn visit_i128<E: de::Error>(self, _: i128) -> std::result::Result<Shape, E> {
        Ok(Shape::Scalar(ScalarKind::Number))
    }

    fn visit_u128<E: de::Error>(self, _: u128) -> std::result::Result<Shape, E> {
        Ok(Shape::Scalar(ScalarKind::Number))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> std::result::Result<Shape, E> {
        Ok(Shape::Scalar(ScalarKind::Number))
    }

    fn visit_str<E: de::Error>(self, _: &str) -> std::result::Result<Shape, E> {
        Ok(Shape::Scalar(ScalarKind::Text))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Shape, E> {
        Ok(Shape::Scalar(ScalarKind::Null))
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Shape, E> {
        Ok(Shape::Scalar(ScalarKind::Null))
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Shape, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Shape::Other)
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Shape, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::new();
        while let Some(entry) = map.next_entry::<Shape, Shape>()? {
            entries.push(entry);
        }
        Ok(Shape::Map(entries))
    }

    fn visit_enum<A>(self, data: A) -> std::result::Result<Shape, A::Error>
    where
        A: EnumAccess<'de>,
    {
        let (_, variant) = data.variant::<IgnoredAny>()?;
        variant.newtype_variant::<IgnoredAny>()?;
        Ok(Shape::Other)
    }
}

// ---------------------------------------------------------------
// Second pass: source text
// ---------------------------------------------------------------

struct NodeSeed<'s> {
    shape: &'s Shape,
    input: &'s str,
}

impl<'de, 's> DeserializeSeed<'de> for NodeSeed<'s> {
    type Value = Node;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Node, D::Error>
    where
        D: Deserializer<'de>,
    {
        match self.shape {
            Shape::Map(entries) => deserializer.deserialize_map(MapVisitor {
                entries,
                input: self.input,
            }),
            Shape::Scalar(kind) => ScalarSeed {
                kind: *kind,
                input: self.input,
            }
            .deserialize(deserializer)
            .map(Node::Scalar),
            Shape::Other => Yaml::deserialize(deserializer).map(Node::Other),
        }
    }
}

struct MapVisitor<'s> {
    entries: &'s [(Shape, Shape)],
    input: &'s str,
}

impl<'de, 's> Visitor<'de> for MapVisitor<'s> {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a mapping with {} entries", self.entries.len())
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Node, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut out = Vec::with_capacity(self.entries.len());
        for (key_shape, value_shape) in self.entries {
            let Shape::Scalar(kind) = key_shape else {
                return Err(de::Error::custom("mapping key is not a scalar"));
            };
            let key = map
                .next_key_seed(ScalarSeed {
                    kind: *kind,
                    input: self.input,
                })?
                .ok_or_else(|| de::Error::custom("mapping ended early"))?;
            let value = map.next_value_seed(NodeSeed {
                shape: value_shape,
                input: self.input,
            })?;
            out.push((key, value));
        }
        Ok(Node::Map(out))
    }
}

struct ScalarSeed<'s> {
    kind: ScalarKind,
    input: &'s str,
}

impl<'de, 's> DeserializeSeed<'de> for ScalarSeed<'s> {
    type Value = Scalar;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Scalar, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(self)
    }
}

impl<'de, 's> Visitor<'de> for ScalarSeed<'s> {
    type Value = Scalar;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar")
    }

    fn visit_borrowed_str<E: de::Error>(self, v: &'de str) -> std::result::Result<Scalar, E> {
        Ok(Scalar {
            kind: self.kind,
            text: v.to_string(),
            plain: is_plain(self.input, v),
        })
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Scalar, E> {
        Ok(Scalar {
            kind: self.kind,
            text: v.to_string(),
            plain: false,
        })
    }
}
