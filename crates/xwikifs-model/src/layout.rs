//! On-disk naming conventions for an XWikiFS tree.
//!
//! The defaults match the standard layout. A TOML file can override any
//! field; unknown fields are rejected so typos surface early.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, LoadResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Layout {
    /// Document data file inside a document directory.
    pub document_file: String,
    /// Class definition file inside a document directory.
    pub class_file: String,
    /// Subdirectory holding object files.
    pub objects_dir: String,
    /// Subdirectory holding attachments.
    pub attachments_dir: String,
    /// Subdirectory of the objects directory holding class copies.
    pub classinfo_dir: String,
    /// Extension of document files, without the dot.
    pub document_extension: String,
    /// Extension of object files, without the dot.
    pub object_extension: String,
    /// Extension of class files, without the dot.
    pub class_extension: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            document_file: "document.xwd".into(),
            class_file: "class.xwc".into(),
            objects_dir: "objects".into(),
            attachments_dir: "attachments".into(),
            classinfo_dir: "classinfo".into(),
            document_extension: "xwd".into(),
            object_extension: "xwo".into(),
            class_extension: "xwc".into(),
        }
    }
}

impl Layout {
    pub fn from_toml_str(text: &str) -> LoadResult<Self> {
        toml::from_str(text).map_err(|e| LoadError::Config(e.to_string()))
    }

    /// Read a layout override file.
    pub fn from_toml_file(path: &Path) -> LoadResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|e| LoadError::Config(format!("{}: {e}", path.display())))
    }

    /// Where the class definition for `class_name` lives, given the
    /// directory containing the object file.
    pub fn class_info_path(&self, objects_dir: &Path, class_name: &str) -> PathBuf {
        objects_dir
            .join(&self.classinfo_dir)
            .join(format!("{class_name}.{}", self.class_extension))
    }

    pub fn is_object_file(&self, path: &Path) -> bool {
        has_extension(path, &self.object_extension)
    }

    /// True for document, object and class files.
    pub fn is_model_file(&self, path: &Path) -> bool {
        [
            &self.document_extension,
            &self.object_extension,
            &self.class_extension,
        ]
        .iter()
        .any(|ext| has_extension(path, ext))
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let layout = Layout::default();
        assert_eq!(layout.document_file, "document.xwd");
        assert_eq!(layout.class_file, "class.xwc");
        assert_eq!(layout.objects_dir, "objects");
        assert_eq!(layout.attachments_dir, "attachments");
        assert_eq!(layout.classinfo_dir, "classinfo");
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let layout = Layout::from_toml_str("objects_dir = \"objs\"\n").unwrap();
        assert_eq!(layout.objects_dir, "objs");
        assert_eq!(layout.document_file, "document.xwd");
    }

    #[test]
    fn unknown_field_rejected() {
        let err = Layout::from_toml_str("object_dir = \"objs\"\n").unwrap_err();
        assert!(matches!(err, LoadError::Config(_)));
    }

    #[test]
    fn class_info_path_joins_classinfo() {
        let layout = Layout::default();
        let path = layout.class_info_path(Path::new("Main.WebHome/objects"), "XWiki.TagClass");
        assert_eq!(
            path,
            PathBuf::from("Main.WebHome/objects/classinfo/XWiki.TagClass.xwc")
        );
    }

    #[test]
    fn model_file_detection() {
        let layout = Layout::default();
        assert!(layout.is_model_file(Path::new("a/document.xwd")));
        assert!(layout.is_model_file(Path::new("a/objects/X.Y-0.xwo")));
        assert!(layout.is_model_file(Path::new("a/class.xwc")));
        assert!(!layout.is_model_file(Path::new("a/attachments/logo.png")));
        assert!(layout.is_object_file(Path::new("X.Y-0.xwo")));
        assert!(!layout.is_object_file(Path::new("X.Y-0.xwc")));
    }

    #[test]
    fn config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xwikifs.toml");
        fs::write(&path, "attachments_dir = \"files\"\n").unwrap();
        let layout = Layout::from_toml_file(&path).unwrap();
        assert_eq!(layout.attachments_dir, "files");
    }
}
