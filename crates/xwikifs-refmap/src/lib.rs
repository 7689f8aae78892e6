//! Reference-resolving key/value maps for XWikiFS.
//!
//! A [`RefMap`] is an ordered YAML mapping in which a string value of the
//! form `-> <id>` stands for the content of an external file named `<id>`.
//! Large text fields (page content, scripts, stylesheets) live in sibling
//! files while the YAML stays small and diff-friendly.
//!
//! # Lifecycle
//!
//! - **Load**: parse YAML, read every referenced file relative to the root
//!   base directory. A missing file fails the whole load.
//! - **Read**: [`RefMap::get`] substitutes content for markers, so callers
//!   never see a raw marker.
//! - **Mutate**: [`RefMap::put`], [`RefMap::put_reference`], [`RefMap::remove`].
//! - **Persist**: [`RefMap::write_yaml`] writes the raw tree plus one file per
//!   reference id, creating subdirectories as needed. Keys and scalars read
//!   from a file keep the text they were written with.
//!
//! # Modules
//!
//! - [`error`] -- Error types for load and persist
//! - [`marker`] -- The `-> <id>` marker grammar
//! - [`value`] -- Owned [`Value`], borrowed [`ValueRef`], text-preserving [`Number`]
//! - [`map`] -- The [`RefMap`] container itself
//!
//! ```
//! use xwikifs_refmap::RefMap;
//!
//! let mut map = RefMap::new();
//! map.put("title", "Welcome");
//! map.put_reference("content", "content.txt", "= Hello =");
//!
//! assert_eq!(map.get_str("content"), Some("= Hello ="));
//! assert_eq!(map.to_yaml_string().unwrap(), "title: Welcome\ncontent: -> content.txt\n");
//! ```

pub mod error;
mod load;
pub mod map;
pub mod marker;
mod persist;
mod source;
pub mod value;

pub use error::{RefMapError, Result};
pub use map::RefMap;
pub use marker::{is_marker, RefMarker, MARKER_TOKEN};
pub use persist::canonical_yaml;
pub use value::{Number, Value, ValueRef};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;
    use std::path::Path;

    /// Build a chain of `depth` nested maps, each declaring one reference,
    /// and write the matching files into `dir`.
    fn nested_chain(dir: &Path, depth: usize) -> String {
        let mut yaml = String::new();
        for level in 0..depth {
            let indent = "  ".repeat(level);
            yaml.push_str(&format!("{indent}plain{level}: p{level}\n"));
            yaml.push_str(&format!("{indent}ref{level}: -> level{level}.txt\n"));
            fs::write(dir.join(format!("level{level}.txt")), format!("content {level}")).unwrap();
            if level + 1 < depth {
                yaml.push_str(&format!("{indent}child:\n"));
            }
        }
        yaml
    }

    #[test]
    fn each_level_owns_one_reference_and_root_collects_all() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = nested_chain(dir.path(), 3);
        let root = RefMap::from_yaml_str(&yaml, dir.path()).unwrap();

        let mut level = &root;
        for depth in 0..3 {
            assert_eq!(level.references().len(), 1);
            let expected = format!("content {depth}");
            assert_eq!(level.get_str(&format!("ref{depth}")), Some(expected.as_str()));
            if depth < 2 {
                level = level.get_map("child").unwrap();
            }
        }
        assert_eq!(root.collect_references().len(), 3);
    }

    #[test]
    fn get_never_returns_a_marker() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = nested_chain(dir.path(), 4);
        let root = RefMap::from_yaml_str(&yaml, dir.path()).unwrap();

        fn check(map: &RefMap) {
            for (_, value) in map.iter() {
                if let Some(text) = value.as_str() {
                    assert!(!is_marker(text), "marker leaked: {text}");
                }
                if let Some(nested) = value.as_map() {
                    check(nested);
                }
            }
        }
        check(&root);
    }

    /// A scalar as it may appear in a hand-written file.
    fn scalar_text() -> impl Strategy<Value = String> {
        prop_oneof![
            "w[a-z]{1,8}( [a-z]{1,5})?",
            "-?[1-9][0-9]{0,5}",
            "[0-9]{1,3}\\.[0-9]{0,2}0",
            "0x[0-9A-F]{1,4}",
            "[0-9]{25,30}",
            Just("~".to_string()),
            Just("null".to_string()),
            Just("True".to_string()),
            Just("false".to_string()),
        ]
    }

    #[derive(Clone, Debug)]
    enum Entry {
        Scalar(String),
        Empty,
        Reference(String),
        Nested(Vec<(String, String)>),
    }

    fn entry() -> impl Strategy<Value = Entry> {
        prop_oneof![
            3 => scalar_text().prop_map(Entry::Scalar),
            1 => Just(Entry::Empty),
            2 => "w[a-z]{1,8}".prop_map(Entry::Reference),
            1 => proptest::collection::btree_map("n[a-z]{1,4}", scalar_text(), 1..4)
                .prop_map(|m| Entry::Nested(m.into_iter().collect())),
        ]
    }

    proptest! {
        #[test]
        fn load_then_persist_round_trips(
            entries in proptest::collection::btree_map("k[a-z]{1,6}|[1-9][0-9]{0,2}", entry(), 1..8)
        ) {
            let src = tempfile::tempdir().unwrap();
            fs::create_dir_all(src.path().join("text")).unwrap();
            let mut yaml = String::new();
            for (key, entry) in &entries {
                match entry {
                    Entry::Scalar(text) => yaml.push_str(&format!("{key}: {text}\n")),
                    Entry::Empty => yaml.push_str(&format!("{key}:\n")),
                    Entry::Reference(word) => {
                        yaml.push_str(&format!("{key}: -> text/{key}.txt\n"));
                        fs::write(src.path().join(format!("text/{key}.txt")), word).unwrap();
                    }
                    Entry::Nested(children) => {
                        yaml.push_str(&format!("{key}:\n"));
                        for (child, text) in children {
                            yaml.push_str(&format!("  {child}: {text}\n"));
                        }
                    }
                }
            }
            fs::write(src.path().join("doc.yaml"), &yaml).unwrap();

            let map = RefMap::from_yaml_file(&src.path().join("doc.yaml")).unwrap();
            let out = tempfile::tempdir().unwrap();
            map.write_yaml(&out.path().join("doc.yaml")).unwrap();

            let written = fs::read_to_string(out.path().join("doc.yaml")).unwrap();
            prop_assert_eq!(written, yaml);
            for id in map.collect_references().keys() {
                prop_assert_eq!(
                    fs::read_to_string(src.path().join(id)).unwrap(),
                    fs::read_to_string(out.path().join(id)).unwrap()
                );
            }
        }
    }
}
