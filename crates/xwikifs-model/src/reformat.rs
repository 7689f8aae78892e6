//! Rewriting model files into canonical YAML.
//!
//! Every document, object and class file under the root is parsed and
//! re-emitted the way RefMap persistence writes it. Plain scalars keep their
//! text, so `1.10` or `0x10` is never rewritten. Reference markers are kept
//! as text; referenced files are never touched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{LoadError, LoadResult};
use crate::layout::Layout;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReformatMode {
    /// Rewrite files whose canonical form differs.
    Write,
    /// Only report which files would change.
    Check,
}

/// A file whose canonical form differs from what was on disk.
#[derive(Clone, Debug, Serialize)]
pub struct ReformattedFile {
    pub path: PathBuf,
    #[serde(skip)]
    pub original: String,
    #[serde(skip)]
    pub canonical: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ReformatReport {
    /// Model files parsed.
    pub examined: Vec<PathBuf>,
    pub changed: Vec<ReformattedFile>,
}

impl ReformatReport {
    pub fn is_clean(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn changed_paths(&self) -> impl Iterator<Item = &Path> {
        self.changed.iter().map(|f| f.path.as_path())
    }
}

/// Canonicalise every model file under `root`.
///
/// Hidden directories are not descended into. Empty files are left as is.
pub fn reformat(root: &Path, layout: &Layout, mode: ReformatMode) -> LoadResult<ReformatReport> {
    let mut report = ReformatReport::default();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name().to_string_lossy().as_ref()));

    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        let path = entry.path();
        if !entry.file_type().is_file() || !layout.is_model_file(path) {
            continue;
        }

        let text = fs::read_to_string(path)?;
        let canonical = xwikifs_refmap::canonical_yaml(&text)
            .map_err(|e| LoadError::from_refmap(e, path))?;
        report.examined.push(path.to_path_buf());
        let Some(canonical) = canonical else {
            continue;
        };
        if canonical == text {
            continue;
        }

        debug!(path = %path.display(), "not canonical");
        if mode == ReformatMode::Write {
            fs::write(path, &canonical)?;
        }
        report.changed.push(ReformattedFile {
            path: path.to_path_buf(),
            original: text,
            canonical,
        });
    }

    info!(
        examined = report.examined.len(),
        changed = report.changed.len(),
        ?mode,
        "reformat finished"
    );
    Ok(report)
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
