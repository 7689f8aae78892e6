use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::document::{sorted_entries, DocumentModel};
use crate::error::{LoadError, LoadResult};
use crate::identifier::DocumentReference;
use crate::layout::Layout;
use crate::observer::{AssemblyObserver, TracingObserver};

/// Builds every document under a root directory.
pub struct DirectoryAssembler {
    root: PathBuf,
    layout: Layout,
    observer: Arc<dyn AssemblyObserver>,
}

impl DirectoryAssembler {
    /// Fails with [`LoadError::NotADirectory`] if `root` is not a directory.
    pub fn new(root: impl Into<PathBuf>) -> LoadResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(LoadError::NotADirectory { path: root });
        }
        Ok(Self {
            root,
            layout: Layout::default(),
            observer: Arc::new(TracingObserver),
        })
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn AssemblyObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Immediate subdirectories whose name contains a `.`, sorted by name.
    ///
    /// Hidden entries (leading `.`) and plain files are skipped.
    pub fn document_directories(&self) -> LoadResult<Vec<PathBuf>> {
        Ok(sorted_entries(&self.root)?
            .into_iter()
            .filter(|path| path.is_dir())
            .filter(|path| {
                path.file_name()
                    .map(|n| n.to_string_lossy())
                    .is_some_and(|n| !n.starts_with('.') && n.contains('.'))
            })
            .collect())
    }

    /// Load every document. The first failing document aborts assembly.
    pub fn assemble(&self) -> LoadResult<Vec<DocumentModel>> {
        let mut documents = Vec::new();
        for dir in self.document_directories()? {
            documents.push(self.load_directory(&dir)?);
        }
        info!(root = %self.root.display(), documents = documents.len(), "assembly complete");
        Ok(documents)
    }

    /// Load the single document `reference` from under the root.
    pub fn load_document(&self, reference: &DocumentReference) -> LoadResult<DocumentModel> {
        self.load_directory(&self.root.join(reference.to_string()))
    }

    fn load_directory(&self, dir: &Path) -> LoadResult<DocumentModel> {
        DocumentModel::from_directory(dir, &self.layout, self.observer.as_ref()).map_err(|err| {
            self.observer.failure(dir, &err);
            err
        })
    }
}
