//! Building a [`RefMap`] from parsed YAML.
//!
//! Every reference is read eagerly at load time, so a missing file aborts the
//! whole load and no partially resolved map is ever returned.

use std::fs;
use std::path::Path;

use serde_yaml::Value as Yaml;
use tracing::debug;

use crate::error::{RefMapError, Result};
use crate::map::RefMap;
use crate::marker::RefMarker;
use crate::source::{self, Node, Scalar, ScalarKind};
use crate::value::{Number, Value};

/// Where reference content comes from while loading.
#[derive(Clone, Copy)]
enum Resolve<'a> {
    /// Read each referenced file relative to this directory.
    Files(&'a Path),
    /// Leave content empty; only the raw tree matters.
    Skip,
}

impl Resolve<'_> {
    fn read(self, id: &str) -> Result<String> {
        match self {
            Resolve::Files(base_dir) => read_reference(base_dir, id),
            Resolve::Skip => Ok(String::new()),
        }
    }
}

impl RefMap {
    /// Load a YAML file. References resolve against the file's directory.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        debug!(path = %path.display(), "loading refmap");
        Self::from_yaml_str(&text, base_dir)
    }

    /// Parse YAML text, resolving references against `base_dir`.
    ///
    /// Scalars keep the text they were written with, so writing the map
    /// back reproduces `1.10`, `0x10`, `~` or an empty value unchanged.
    pub fn from_yaml_str(text: &str, base_dir: &Path) -> Result<Self> {
        Ok(parse(text, Resolve::Files(base_dir))?.unwrap_or_default())
    }

    /// Convert an already parsed tree.
    ///
    /// An empty document (`null`) yields an empty map. Nested maps resolve
    /// their references against the same `base_dir`, not a subdirectory.
    pub fn from_value(tree: &Yaml, base_dir: &Path) -> Result<Self> {
        match tree {
            Yaml::Null => Ok(Self::new()),
            Yaml::Mapping(mapping) => from_mapping(mapping, base_dir),
            other => Err(RefMapError::Malformed(format!(
                "expected a mapping at the top level, found {}",
                kind_name(other)
            ))),
        }
    }

    /// Parse without reading any referenced file. `None` for an empty
    /// document.
    pub(crate) fn parse_unresolved(text: &str) -> Result<Option<Self>> {
        parse(text, Resolve::Skip)
    }
}

fn parse(text: &str, resolve: Resolve<'_>) -> Result<Option<RefMap>> {
    match source::parse(text)? {
        Some(entries) => from_entries(entries, resolve).map(Some),
        None => Ok(None),
    }
}

fn from_entries(entries: Vec<(Scalar, Node)>, resolve: Resolve<'_>) -> Result<RefMap> {
    let mut map = RefMap::new();

    for (key, node) in entries {
        // `1` and `'1'` are different YAML keys but the same string key.
        if map.contains_key(&key.text) {
            return Err(duplicate_key(&key.text));
        }
        if key.plain && !key.text.is_empty() {
            map.mark_plain_key(&key.text);
        }
        match node {
            Node::Map(nested) => {
                map.put(key.text, Value::Nested(from_entries(nested, resolve)?));
            }
            Node::Other(yaml) => {
                map.put(key.text, Value::Opaque(yaml));
            }
            Node::Scalar(scalar) => insert_scalar(&mut map, key.text, scalar, resolve)?,
        }
    }

    Ok(map)
}

fn insert_scalar(map: &mut RefMap, key: String, scalar: Scalar, resolve: Resolve<'_>) -> Result<()> {
    match scalar.kind {
        ScalarKind::Number => {
            map.put(key, Value::Number(Number::from_source(scalar.text)));
        }
        ScalarKind::Bool(b) => map.push_sourced(key, Value::Bool(b), scalar.text),
        ScalarKind::Null => map.push_sourced(key, Value::Null, scalar.text),
        ScalarKind::Text => match RefMarker::parse(&scalar.text) {
            Some(marker) => {
                let content = resolve.read(marker.id())?;
                let id = marker.id().to_string();
                map.declare(key, marker);
                map.set_reference_content(id, content);
            }
            None if scalar.plain => {
                let value = Value::String(scalar.text.clone());
                map.push_sourced(key, value, scalar.text);
            }
            None => {
                map.put(key, Value::String(scalar.text));
            }
        },
    }
    Ok(())
}

fn from_mapping(mapping: &serde_yaml::Mapping, base_dir: &Path) -> Result<RefMap> {
    let mut map = RefMap::new();

    for (key, value) in mapping {
        let name = key_to_string(key)?;
        if map.contains_key(&name) {
            return Err(duplicate_key(&name));
        }
        if !matches!(key, Yaml::String(_)) {
            map.mark_plain_key(&name);
        }
        match value {
            Yaml::String(text) => match RefMarker::parse(text) {
                Some(marker) => {
                    let content = read_reference(base_dir, marker.id())?;
                    let id = marker.id().to_string();
                    map.declare(name, marker);
                    map.set_reference_content(id, content);
                }
                None => {
                    map.put(name, Value::String(text.clone()));
                }
            },
            Yaml::Mapping(nested) => {
                map.put(name, Value::Nested(from_mapping(nested, base_dir)?));
            }
            Yaml::Bool(b) => {
                map.put(name, Value::Bool(*b));
            }
            Yaml::Number(n) => {
                map.put(name, Value::Number(n.clone().into()));
            }
            Yaml::Null => {
                map.put(name, Value::Null);
            }
            Yaml::Sequence(_) | Yaml::Tagged(_) => {
                map.put(name, Value::Opaque(value.clone()));
            }
        }
    }

    Ok(map)
}

fn duplicate_key(key: &str) -> RefMapError {
    RefMapError::Malformed(format!("duplicate key {key:?}"))
}

fn read_reference(base_dir: &Path, id: &str) -> Result<String> {
    let path = base_dir.join(id);
    match fs::read_to_string(&path) {
        Ok(content) => {
            debug!(id, path = %path.display(), bytes = content.len(), "resolved reference");
            Ok(content)
        }
        Err(source) => Err(RefMapError::MissingReference {
            id: id.to_string(),
            path,
            source,
        }),
    }
}

fn key_to_string(key: &Yaml) -> Result<String> {
    match key {
        Yaml::String(s) => Ok(s.clone()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Null => Ok("null".to_string()),
        other => Err(RefMapError::Malformed(format!(
            "unsupported {} used as a key",
            kind_name(other)
        ))),
    }
}

fn kind_name(value: &Yaml) -> &'static str {
    match value {
        Yaml::Null => "null",
        Yaml::Bool(_) => "boolean",
        Yaml::Number(_) => "number",
        Yaml::String(_) => "string",
        Yaml::Sequence(_) => "sequence",
        Yaml::Mapping(_) => "mapping",
        Yaml::Tagged(_) => "tagged value",
    }
}
