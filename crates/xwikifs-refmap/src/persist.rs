//! Writing a [`RefMap`] back to disk.
//!
//! The primary file receives the raw tree (markers and nested maps visible)
//! in block style with plain scalars wherever YAML allows them, in insertion
//! order. Scalars and keys that came from a loaded file are written with
//! their original text. Every referenced content string is written to its
//! own file under the primary file's directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value as Yaml};
use tracing::debug;

use crate::error::Result;
use crate::map::{RefMap, Slot};
use crate::value::Value;

impl RefMap {
    /// Rebuild the raw tree, with reference markers in place of content.
    pub fn to_raw_value(&self) -> Yaml {
        let mut mapping = Mapping::new();
        for (key, slot) in self.slots() {
            let value = match slot {
                Slot::Reference(marker) => Yaml::String(marker.raw().to_string()),
                Slot::Value(value) | Slot::Sourced { value, .. } => raw_value(value),
            };
            mapping.insert(Yaml::String(key.to_string()), value);
        }
        Yaml::Mapping(mapping)
    }

    /// Rebuild the tree with every reference replaced by its content.
    pub fn to_resolved_value(&self) -> Yaml {
        let mut mapping = Mapping::new();
        for (key, value) in self.iter() {
            let value = match value.to_owned_value() {
                Value::Nested(nested) => nested.to_resolved_value(),
                other => raw_value(&other),
            };
            mapping.insert(Yaml::String(key.to_string()), value);
        }
        Yaml::Mapping(mapping)
    }

    /// Render the raw tree as YAML text.
    ///
    /// Source text is spliced in after emitting: each preserved scalar or
    /// key is first emitted as a unique placeholder word, then replaced.
    pub fn to_yaml_string(&self) -> Result<String> {
        let raw = serde_yaml::to_string(&self.to_raw_value())?;
        let stem = placeholder_stem(&raw);
        let mut texts = Vec::new();
        let tree = source_tree(self, &stem, &mut texts);
        if texts.is_empty() {
            return Ok(raw);
        }

        let mut out = serde_yaml::to_string(&tree)?;
        for (i, text) in texts.iter().enumerate() {
            let word = format!("{stem}{i}z");
            out = if text.is_empty() {
                out.replacen(&format!(" {word}"), "", 1)
            } else {
                out.replacen(&word, text, 1)
            };
        }
        Ok(out)
    }

    /// Collect every `(id, content)` pair from this map and all nested maps.
    ///
    /// Depth-first in key order; a nested map's content wins over an earlier
    /// entry with the same id.
    pub fn collect_references(&self) -> BTreeMap<String, String> {
        let mut result = BTreeMap::new();
        collect_into(self, &mut result);
        result
    }

    /// Persist to `target` plus one file per reference id.
    ///
    /// Reference files land at `dirname(target)/<id>`; missing intermediate
    /// directories are created.
    pub fn write_yaml(&self, target: &Path) -> Result<()> {
        ensure_parent(target)?;
        fs::write(target, self.to_yaml_string()?)?;

        let base_dir = target.parent().unwrap_or_else(|| Path::new(""));
        for (id, content) in self.collect_references() {
            let path = base_dir.join(&id);
            ensure_parent(&path)?;
            fs::write(&path, content)?;
            debug!(id = %id, path = %path.display(), "wrote reference");
        }
        Ok(())
    }
}

/// Re-emit YAML text in canonical form without reading referenced files.
///
/// Returns `None` for an empty document, which has no canonical form.
pub fn canonical_yaml(text: &str) -> Result<Option<String>> {
    match RefMap::parse_unresolved(text)? {
        Some(map) => map.to_yaml_string().map(Some),
        None => Ok(None),
    }
}

/// A placeholder prefix that occurs nowhere in `emitted`.
fn placeholder_stem(emitted: &str) -> String {
    let mut n = 0usize;
    loop {
        let stem = format!("xwikifs{n}v");
        if !emitted.contains(&stem) {
            return stem;
        }
        n += 1;
    }
}

/// The raw tree with placeholders for every preserved text, which is
/// pushed onto `texts` in placeholder order.
fn source_tree(map: &RefMap, stem: &str, texts: &mut Vec<String>) -> Yaml {
    let mut mapping = Mapping::new();
    for (key, slot) in map.slots() {
        let key_node = if map.is_plain_key(key) {
            placeholder(stem, key, texts)
        } else {
            Yaml::String(key.to_string())
        };
        let value = match slot {
            Slot::Reference(marker) => Yaml::String(marker.raw().to_string()),
            Slot::Sourced { text, .. } => placeholder(stem, text, texts),
            Slot::Value(Value::Number(n)) => placeholder(stem, n.as_str(), texts),
            Slot::Value(Value::Nested(nested)) => source_tree(nested, stem, texts),
            Slot::Value(value) => raw_value(value),
        };
        mapping.insert(key_node, value);
    }
    Yaml::Mapping(mapping)
}

fn placeholder(stem: &str, text: &str, texts: &mut Vec<String>) -> Yaml {
    let node = Yaml::String(format!("{stem}{}z", texts.len()));
    texts.push(text.to_string());
    node
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn raw_value(value: &Value) -> Yaml {
    match value {
        Value::String(s) => Yaml::String(s.clone()),
        Value::Bool(b) => Yaml::Bool(*b),
        Value::Number(n) => n.to_yaml(),
        Value::Nested(map) => map.to_raw_value(),
        Value::Opaque(v) => v.clone(),
        Value::Null => Yaml::Null,
    }
}

fn collect_into(map: &RefMap, out: &mut BTreeMap<String, String>) {
    out.extend(map.references().iter().map(|(k, v)| (k.clone(), v.clone())));
    for (_, value) in map.iter() {
        if let Some(nested) = value.as_map() {
            collect_into(nested, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Number;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    const NESTED: &str = "a: a\nb: -> b\nc:\n  ca: ca\n  cb: -> cb\n  cc:\n    cca: cca\n    ccb: -> ccb\n";

    fn nested_fixture(dir: &Path) {
        write(dir, "test.yaml", NESTED);
        write(dir, "b", "b");
        write(dir, "cb", "cb");
        write(dir, "ccb", "ccb");
    }

    #[test]
    fn collect_references_recurses() {
        let dir = tempfile::tempdir().unwrap();
        nested_fixture(dir.path());
        let map = RefMap::from_yaml_file(&dir.path().join("test.yaml")).unwrap();

        let refs = map.collect_references();
        assert_eq!(refs.len(), 3);
        assert!(refs.contains_key("b"));
        assert!(refs.contains_key("cb"));
        assert!(refs.contains_key("ccb"));
    }

    #[test]
    fn collect_references_later_duplicate_wins() {
        let mut inner = RefMap::new();
        inner.put_reference("x", "same", "inner");
        let mut outer = RefMap::new();
        outer.put_reference("x", "same", "outer");
        outer.put("nested", inner);

        assert_eq!(outer.collect_references().get("same").map(String::as_str), Some("inner"));
    }

    #[test]
    fn write_simple_yaml_round_trips() {
        let src = tempfile::tempdir().unwrap();
        write(src.path(), "test.yaml", "foo: foo\nbar: -> bar\n");
        write(src.path(), "bar", "bar");
        let map = RefMap::from_yaml_file(&src.path().join("test.yaml")).unwrap();

        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("test.yaml");
        map.write_yaml(&target).unwrap();

        assert_eq!(read(&target).trim(), "foo: foo\nbar: -> bar");
        assert_eq!(read(&out.path().join("bar")), "bar");
    }

    #[test]
    fn write_nested_yaml_round_trips() {
        let src = tempfile::tempdir().unwrap();
        nested_fixture(src.path());
        let map = RefMap::from_yaml_file(&src.path().join("test.yaml")).unwrap();

        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("test.yaml");
        map.write_yaml(&target).unwrap();

        assert_eq!(read(&target).trim(), NESTED.trim());
        for id in map.collect_references().keys() {
            assert_eq!(read(&src.path().join(id)).trim(), read(&out.path().join(id)).trim());
        }
    }

    #[test]
    fn write_reference_in_subdirectory() {
        let mut map = RefMap::new();
        map.put("a", "a");
        map.put_reference("b", "data/b", "b");

        let out = tempfile::tempdir().unwrap();
        map.write_yaml(&out.path().join("test.yaml")).unwrap();

        assert_eq!(read(&out.path().join("data/b")), "b");
        assert_eq!(read(&out.path().join("test.yaml")).trim(), "a: a\nb: -> data/b");
    }

    #[test]
    fn raw_marker_spacing_is_preserved() {
        let src = tempfile::tempdir().unwrap();
        write(src.path(), "doc.yaml", "body: ->body.txt\n");
        write(src.path(), "body.txt", "text");
        let map = RefMap::from_yaml_file(&src.path().join("doc.yaml")).unwrap();

        assert_eq!(map.to_yaml_string().unwrap().trim(), "body: ->body.txt");
    }

    #[test]
    fn edited_reference_content_is_flushed() {
        let src = tempfile::tempdir().unwrap();
        write(src.path(), "doc.yaml", "title: Home\ncontent: -> content.txt\n");
        write(src.path(), "content.txt", "old");
        let mut map = RefMap::from_yaml_file(&src.path().join("doc.yaml")).unwrap();

        map.put("content", "new");
        map.write_yaml(&src.path().join("doc.yaml")).unwrap();

        assert_eq!(read(&src.path().join("content.txt")), "new");
        assert_eq!(
            read(&src.path().join("doc.yaml")).trim(),
            "title: Home\ncontent: -> content.txt"
        );
    }

    #[test]
    fn resolved_value_substitutes_content() {
        let mut map = RefMap::new();
        map.put_reference("body", "body.txt", "hello");
        let mut inner = RefMap::new();
        inner.put_reference("x", "x.txt", "deep");
        map.put("inner", inner);

        let expected: Yaml = serde_yaml::from_str("body: hello\ninner:\n  x: deep\n").unwrap();
        assert_eq!(map.to_resolved_value(), expected);
    }

    #[test]
    fn scalar_types_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let text = "count: 3\nratio: 1.5\nhidden: true\nlist:\n- one\n- two\n";
        let map = RefMap::from_yaml_str(text, dir.path()).unwrap();
        assert_eq!(map.to_yaml_string().unwrap(), text);
    }

    #[test]
    fn loaded_scalars_write_back_byte_for_byte() {
        let dir = tempfile::tempdir().unwrap();
        let text = "version: 1.10\nparent:\nt: ~\nx: 0x10\no: 007\n1: one\nbig: 123456789012345678901234567890\nflag: True\nwords: yes please\n";
        let map = RefMap::from_yaml_str(text, dir.path()).unwrap();
        assert_eq!(map.to_yaml_string().unwrap(), text);
    }

    #[test]
    fn nested_source_text_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let text = "outer:\n  ratio: 2.50\n  empty:\n  inner:\n    on: ~\n";
        let map = RefMap::from_yaml_str(text, dir.path()).unwrap();
        assert_eq!(map.to_yaml_string().unwrap(), text);
    }

    #[test]
    fn edited_scalar_uses_emitter_form() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = RefMap::from_yaml_str("a: 1.10\nb: ~\n", dir.path()).unwrap();
        map.put("b", "set");
        map.put("c", Value::Number(Number::from(2.5)));
        assert_eq!(map.to_yaml_string().unwrap(), "a: 1.10\nb: set\nc: 2.5\n");
    }

    #[test]
    fn text_resembling_placeholder_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let text = "xwikifs0v0z: xwikifs0v\nn: 1.0\n";
        let map = RefMap::from_yaml_str(text, dir.path()).unwrap();
        assert_eq!(map.to_yaml_string().unwrap(), text);
    }

    #[test]
    fn sequence_and_quoted_scalars_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a", "x");
        let map = RefMap::from_yaml_str("list:\n- 1.10\nq: \"quoted\"\nm: '-> a'\n", dir.path()).unwrap();
        assert_eq!(map.to_yaml_string().unwrap(), "list:\n- 1.1\nq: quoted\nm: -> a\n");
    }

    #[test]
    fn comments_and_aliases_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let map = RefMap::from_yaml_str("# header\na: &x 1.10 # note\nb: *x\n", dir.path()).unwrap();
        assert_eq!(map.to_yaml_string().unwrap(), "a: 1.10\nb: 1.10\n");
    }

    #[test]
    fn canonical_yaml_skips_references_and_empty_documents() {
        assert_eq!(
            canonical_yaml("body:   ->   missing.txt\nn: 0x1F\n").unwrap().as_deref(),
            Some("body: ->   missing.txt\nn: 0x1F\n")
        );
        assert_eq!(canonical_yaml("").unwrap(), None);
        assert!(canonical_yaml("a: 1\na: 2\n").is_err());
    }
}
