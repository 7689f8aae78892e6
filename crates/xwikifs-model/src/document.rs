//! Documents: one directory named `<Space>.<Name>` with an optional data
//! file, an optional class definition, objects and attachments.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;
use xwikifs_refmap::RefMap;

use crate::class::ClassModel;
use crate::error::{LoadError, LoadResult};
use crate::identifier::DocumentReference;
use crate::layout::Layout;
use crate::object::{ClassCache, ObjectModel};
use crate::observer::AssemblyObserver;

/// A file under a document's attachments directory.
///
/// Only the path is held; content and metadata are read on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    path: PathBuf,
}

impl Attachment {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn size(&self) -> io::Result<u64> {
        Ok(fs::metadata(&self.path)?.len())
    }

    pub fn modified(&self) -> io::Result<SystemTime> {
        fs::metadata(&self.path)?.modified()
    }

    pub fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }
}

#[derive(Clone, Debug)]
pub struct DocumentModel {
    reference: DocumentReference,
    directory: PathBuf,
    data: RefMap,
    class: Option<Arc<ClassModel>>,
    objects: Vec<ObjectModel>,
    attachments: Vec<Attachment>,
    last_modified: SystemTime,
}

impl DocumentModel {
    /// Load a document directory.
    ///
    /// The data file and class file are optional. Objects are the files
    /// under the objects directory with the object extension; attachments
    /// are every entry under the attachments directory. Both are sorted by
    /// file name. The first failure aborts the load.
    pub fn from_directory(
        dir: &Path,
        layout: &Layout,
        observer: &dyn AssemblyObserver,
    ) -> LoadResult<Self> {
        if !dir.is_dir() {
            return Err(LoadError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }
        let dir_name = dir.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
            LoadError::invalid_identifier(&dir.display().to_string(), "not a UTF-8 directory name")
        })?;
        let reference = DocumentReference::parse(dir_name)?;
        observer.document_discovered(&reference, dir);

        let last_modified = fs::metadata(dir)?.modified()?;

        let data_path = dir.join(&layout.document_file);
        let data = if data_path.is_file() {
            RefMap::from_yaml_file(&data_path).map_err(|e| LoadError::from_refmap(e, &data_path))?
        } else {
            RefMap::new()
        };

        let class_path = dir.join(&layout.class_file);
        let class = if class_path.is_file() {
            Some(Arc::new(ClassModel::load(&class_path)?))
        } else {
            None
        };

        let mut objects = Vec::new();
        let objects_dir = dir.join(&layout.objects_dir);
        if objects_dir.is_dir() {
            let mut classes = ClassCache::new();
            for path in sorted_entries(&objects_dir)? {
                if !path.is_file() || !layout.is_object_file(&path) {
                    continue;
                }
                let object = ObjectModel::load(&reference, &path, layout, &mut classes)?;
                observer.object_discovered(&reference, &object);
                objects.push(object);
            }
        }

        let attachments_dir = dir.join(&layout.attachments_dir);
        let attachments = if attachments_dir.is_dir() {
            sorted_entries(&attachments_dir)?
                .into_iter()
                .map(Attachment::new)
                .collect()
        } else {
            Vec::new()
        };

        debug!(
            document = %reference,
            objects = objects.len(),
            attachments = attachments.len(),
            "assembled document"
        );

        let document = Self {
            reference,
            directory: dir.to_path_buf(),
            data,
            class,
            objects,
            attachments,
            last_modified,
        };
        observer.document_loaded(&document);
        Ok(document)
    }

    pub fn reference(&self) -> &DocumentReference {
        &self.reference
    }

    pub fn space(&self) -> &str {
        self.reference.space()
    }

    pub fn name(&self) -> &str {
        self.reference.name()
    }

    /// Document data; empty when the directory has no data file.
    pub fn data(&self) -> &RefMap {
        &self.data
    }

    /// A data attribute in canonical string form.
    pub fn data_text(&self, key: &str) -> Option<String> {
        self.data.get(key).and_then(|v| v.to_canonical_string())
    }

    /// The class this document defines, if it has a class file.
    pub fn class(&self) -> Option<&ClassModel> {
        self.class.as_deref()
    }

    pub fn objects(&self) -> &[ObjectModel] {
        &self.objects
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Modification time of the document directory.
    pub fn last_modified(&self) -> SystemTime {
        self.last_modified
    }

    /// Modification time in milliseconds since the Unix epoch.
    pub fn last_modified_millis(&self) -> u128 {
        self.last_modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

/// Entries of `dir` sorted by file name.
pub(crate) fn sorted_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}
