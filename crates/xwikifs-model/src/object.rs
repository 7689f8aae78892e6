//! Objects (`.xwo` files) and the per-document class cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use xwikifs_refmap::{RefMap, ValueRef};

use crate::class::ClassModel;
use crate::error::{LoadError, LoadResult};
use crate::identifier::{DocumentReference, ObjectReference};
use crate::layout::Layout;

/// Class definitions already loaded for one document, keyed by path.
///
/// Several objects of the same class share one [`ClassModel`].
#[derive(Debug, Default)]
pub struct ClassCache {
    classes: HashMap<PathBuf, Arc<ClassModel>>,
}

impl ClassCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached class at `path`, loading it on first use.
    pub fn get_or_load(&mut self, path: &Path) -> LoadResult<Arc<ClassModel>> {
        if let Some(class) = self.classes.get(path) {
            return Ok(Arc::clone(class));
        }
        let class = Arc::new(ClassModel::load(path)?);
        self.classes.insert(path.to_path_buf(), Arc::clone(&class));
        Ok(class)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// One instance of a class attached to a document.
#[derive(Clone, Debug)]
pub struct ObjectModel {
    document: DocumentReference,
    reference: ObjectReference,
    class: Arc<ClassModel>,
    properties: RefMap,
    source: PathBuf,
}

impl ObjectModel {
    /// Load an object file belonging to `document`.
    ///
    /// Checks run in order: file name grammar, class file presence, then
    /// the object's own properties against the class.
    pub fn load(
        document: &DocumentReference,
        path: &Path,
        layout: &Layout,
        classes: &mut ClassCache,
    ) -> LoadResult<Self> {
        let file_name = path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
            LoadError::invalid_identifier(&path.display().to_string(), "not a UTF-8 file name")
        })?;
        let reference = ObjectReference::parse(file_name, &layout.object_extension)?;

        let objects_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let class_path = layout.class_info_path(objects_dir, reference.class_name());
        if !class_path.is_file() {
            return Err(LoadError::MissingClass {
                class_name: reference.class_name().to_string(),
                path: class_path,
            });
        }
        let class = classes.get_or_load(&class_path)?;

        let properties =
            RefMap::from_yaml_file(path).map_err(|e| LoadError::from_refmap(e, path))?;
        let object = Self::from_parts(document.clone(), reference, class, properties, path)?;
        debug!(document = %document, object = %object.reference, "loaded object");
        Ok(object)
    }

    /// Assemble an object from already loaded parts.
    ///
    /// Fails with [`LoadError::UndeclaredProperty`] for the first property
    /// the class does not describe.
    pub fn from_parts(
        document: DocumentReference,
        reference: ObjectReference,
        class: Arc<ClassModel>,
        properties: RefMap,
        source: impl Into<PathBuf>,
    ) -> LoadResult<Self> {
        if let Some(undeclared) = properties.keys().find(|k| class.property(k).is_none()) {
            return Err(LoadError::UndeclaredProperty {
                property: undeclared.to_string(),
                class_name: reference.class_name().to_string(),
            });
        }
        Ok(Self {
            document,
            reference,
            class,
            properties,
            source: source.into(),
        })
    }

    /// The owning document.
    pub fn document(&self) -> &DocumentReference {
        &self.document
    }

    pub fn reference(&self) -> &ObjectReference {
        &self.reference
    }

    pub fn class_name(&self) -> &str {
        self.reference.class_name()
    }

    pub fn number(&self) -> u32 {
        self.reference.number()
    }

    pub fn class(&self) -> &ClassModel {
        &self.class
    }

    /// Shared handle to the class, for callers that outlive this object.
    pub fn class_handle(&self) -> Arc<ClassModel> {
        Arc::clone(&self.class)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys()
    }

    /// Resolved value of a property.
    pub fn property(&self, name: &str) -> Option<ValueRef<'_>> {
        self.properties.get(name)
    }

    /// A property in canonical string form.
    pub fn property_text(&self, name: &str) -> Option<String> {
        self.property(name).and_then(|v| v.to_canonical_string())
    }

    pub fn properties(&self) -> &RefMap {
        &self.properties
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}
