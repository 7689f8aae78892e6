//! Document, class and object models for XWikiFS.
//!
//! A wiki lives on disk as one directory per document, named
//! `<Space>.<Name>`. Inside it:
//!
//! - `document.xwd` -- document data (a RefMap)
//! - `class.xwc` -- the class this document defines, if any
//! - `objects/<Class>-<N>.xwo` -- objects, validated against
//!   `objects/classinfo/<Class>.xwc`
//! - `attachments/` -- arbitrary files
//!
//! # Key Types
//!
//! - [`DirectoryAssembler`] -- Loads every document under a root
//! - [`DocumentModel`] -- One loaded document with its objects and attachments
//! - [`ObjectModel`] -- An object validated against its class
//! - [`ClassModel`] -- A class definition
//! - [`Layout`] -- File and directory naming, overridable from TOML
//! - [`AssemblyObserver`] -- Progress callbacks during assembly

pub mod assembler;
pub mod class;
pub mod document;
pub mod error;
pub mod identifier;
pub mod layout;
pub mod object;
pub mod observer;
pub mod reformat;

pub use assembler::DirectoryAssembler;
pub use class::ClassModel;
pub use document::{Attachment, DocumentModel};
pub use error::{LoadError, LoadResult};
pub use identifier::{DocumentReference, ObjectReference};
pub use layout::Layout;
pub use object::{ClassCache, ObjectModel};
pub use observer::{AssemblyObserver, NoOpObserver, TracingObserver};
pub use reformat::{reformat, ReformatMode, ReformatReport, ReformattedFile};

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    /// A small wiki: a class document, a page using it, and a plain page.
    fn wiki(root: &Path) {
        let tag_class = "name: Blog.TagClass\nproperties:\n  tags:\n    name: tags\n    prettyName: Tags\n";
        write(&root.join("Blog.TagClass"), "document.xwd", "title: Tag class\n");
        write(&root.join("Blog.TagClass"), "class.xwc", tag_class);

        let post = root.join("Blog.FirstPost");
        write(&post, "document.xwd", "title: First post\ncontent: -> content.txt\n");
        write(&post, "content.txt", "Hello **world**");
        write(&post, "objects/classinfo/Blog.TagClass.xwc", tag_class);
        write(&post, "objects/Blog.TagClass-0.xwo", "tags: intro\n");
        write(&post, "attachments/photo.jpg", "jpeg");

        write(&root.join("Main.WebHome"), "document.xwd", "title: Home\n");
    }

    #[test]
    fn assemble_small_wiki() {
        let root = tempfile::tempdir().unwrap();
        wiki(root.path());

        let docs = DirectoryAssembler::new(root.path())
            .unwrap()
            .with_observer(Arc::new(NoOpObserver))
            .assemble()
            .unwrap();
        let names: Vec<String> = docs.iter().map(|d| d.reference().to_string()).collect();
        assert_eq!(names, vec!["Blog.FirstPost", "Blog.TagClass", "Main.WebHome"]);

        let post = &docs[0];
        assert_eq!(post.data().get_str("content"), Some("Hello **world**"));
        assert_eq!(post.objects().len(), 1);
        assert_eq!(post.objects()[0].property_text("tags").as_deref(), Some("intro"));
        assert_eq!(post.attachments()[0].file_name(), "photo.jpg");

        let class_doc = &docs[1];
        let class = class_doc.class().unwrap();
        assert_eq!(
            class.property_attributes("tags").unwrap(),
            vec![
                ("name".to_string(), "tags".to_string()),
                ("prettyName".to_string(), "Tags".to_string()),
            ]
        );
    }

    #[test]
    fn reformat_then_assemble_is_unchanged() {
        let root = tempfile::tempdir().unwrap();
        wiki(root.path());

        let report = reformat(root.path(), &Layout::default(), ReformatMode::Check).unwrap();
        assert!(report.is_clean(), "changed: {:?}", report.changed_paths().collect::<Vec<_>>());
        assert_eq!(report.examined.len(), 6);
    }
}
