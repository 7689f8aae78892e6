//! Class definitions (`.xwc` files).
//!
//! A class file is a RefMap with top-level attributes and a `properties`
//! map describing each property objects of this class may carry.

use std::path::{Path, PathBuf};

use tracing::debug;
use xwikifs_refmap::RefMap;

use crate::error::{LoadError, LoadResult};

/// Key of the property definitions inside a class file.
pub const PROPERTIES_KEY: &str = "properties";

#[derive(Clone, Debug)]
pub struct ClassModel {
    data: RefMap,
    source: PathBuf,
}

impl ClassModel {
    /// Load a class definition file.
    pub fn load(path: &Path) -> LoadResult<Self> {
        let data = RefMap::from_yaml_file(path).map_err(|e| LoadError::from_refmap(e, path))?;
        let properties = data.get_map(PROPERTIES_KEY).map_or(0, RefMap::len);
        debug!(path = %path.display(), properties, "loaded class");
        Ok(Self::from_refmap(data, path))
    }

    pub fn from_refmap(data: RefMap, source: impl Into<PathBuf>) -> Self {
        Self {
            data,
            source: source.into(),
        }
    }

    /// The `name` attribute in canonical string form.
    pub fn name(&self) -> Option<String> {
        self.data.get("name").and_then(|v| v.to_canonical_string())
    }

    /// Top-level attributes, excluding `properties`, flattened to strings.
    pub fn attributes(&self) -> Vec<(String, String)> {
        flatten(&self.data, Some(PROPERTIES_KEY))
    }

    /// Property definitions in declaration order.
    ///
    /// Entries whose value is not a map are not definitions and are skipped.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &RefMap)> {
        self.data
            .get_map(PROPERTIES_KEY)
            .into_iter()
            .flat_map(|props| props.iter())
            .filter_map(|(name, value)| value.as_map().map(|m| (name, m)))
    }

    pub fn property(&self, name: &str) -> Option<&RefMap> {
        self.data.get_map(PROPERTIES_KEY)?.get_map(name)
    }

    /// The named property's definition flattened to strings.
    pub fn property_attributes(&self, name: &str) -> Option<Vec<(String, String)>> {
        self.property(name).map(|m| flatten(m, None))
    }

    pub fn data(&self) -> &RefMap {
        &self.data
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Flatten a map to `(key, canonical string)` pairs. Null values are dropped.
pub(crate) fn flatten(map: &RefMap, skip: Option<&str>) -> Vec<(String, String)> {
    map.iter()
        .filter(|(key, _)| Some(*key) != skip)
        .filter_map(|(key, value)| value.to_canonical_string().map(|s| (key.to_string(), s)))
        .collect()
}
