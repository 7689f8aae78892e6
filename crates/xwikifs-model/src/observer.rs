use std::path::Path;

use tracing::{debug, info, warn};

use crate::document::DocumentModel;
use crate::error::LoadError;
use crate::identifier::DocumentReference;
use crate::object::ObjectModel;

/// Callbacks fired while documents are assembled from disk.
pub trait AssemblyObserver: Send + Sync {
    /// A document directory was recognised, before anything is read.
    fn document_discovered(&self, reference: &DocumentReference, directory: &Path);
    /// An object file under a document loaded and validated.
    fn object_discovered(&self, document: &DocumentReference, object: &ObjectModel);
    /// A document finished loading, with all objects and attachments.
    fn document_loaded(&self, document: &DocumentModel);
    /// Loading the entry at `path` failed; assembly stops after this call.
    fn failure(&self, path: &Path, error: &LoadError);
}

pub struct NoOpObserver;

impl AssemblyObserver for NoOpObserver {
    fn document_discovered(&self, _reference: &DocumentReference, _directory: &Path) {}

    fn object_discovered(&self, _document: &DocumentReference, _object: &ObjectModel) {}

    fn document_loaded(&self, _document: &DocumentModel) {}

    fn failure(&self, _path: &Path, _error: &LoadError) {}
}

/// Reports assembly progress through `tracing`.
pub struct TracingObserver;

impl AssemblyObserver for TracingObserver {
    fn document_discovered(&self, reference: &DocumentReference, directory: &Path) {
        debug!(document = %reference, directory = %directory.display(), "document discovered");
    }

    fn object_discovered(&self, document: &DocumentReference, object: &ObjectModel) {
        debug!(document = %document, object = %object.reference(), "object discovered");
    }

    fn document_loaded(&self, document: &DocumentModel) {
        info!(
            document = %document.reference(),
            objects = document.objects().len(),
            attachments = document.attachments().len(),
            "document loaded"
        );
    }

    fn failure(&self, path: &Path, error: &LoadError) {
        warn!(path = %path.display(), error = %error, "load failed");
    }
}
