//! Reference marker grammar.
//!
//! A scalar string is a reference marker when:
//! - Its trimmed form starts with the two characters `->`
//! - The reference id is everything after the *last* `->`, trimmed
//!
//! Ids are relative paths (`body`, `data/b`, `i18n/fr/content.txt`) resolved
//! against the base directory of the top-level load, never against the
//! nesting level at which the marker appears.

use std::fmt;

/// The two-character token that introduces a reference.
pub const MARKER_TOKEN: &str = "->";

/// A parsed reference marker.
///
/// Keeps the raw text it was parsed from so that a loaded map writes back
/// byte-for-byte, even when the source used unusual spacing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefMarker {
    raw: String,
    id: String,
}

impl RefMarker {
    /// Build the canonical marker `-> <id>` for a reference id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            raw: format!("{MARKER_TOKEN} {id}"),
            id,
        }
    }

    /// Parse a scalar string, returning `None` if it is not a marker.
    ///
    /// # Examples
    ///
    /// ```
    /// use xwikifs_refmap::RefMarker;
    ///
    /// let marker = RefMarker::parse("  -> data/b ").unwrap();
    /// assert_eq!(marker.id(), "data/b");
    /// assert!(RefMarker::parse("plain text").is_none());
    /// assert!(RefMarker::parse("a -> b").is_none());
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        if !is_marker(value) {
            return None;
        }
        // `is_marker` guarantees at least one occurrence.
        let start = value.rfind(MARKER_TOKEN)? + MARKER_TOKEN.len();
        Some(Self {
            raw: value.to_string(),
            id: value[start..].trim().to_string(),
        })
    }

    /// The reference id (a relative path).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The marker text as it appears in the raw tree.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for RefMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Returns `true` if the string matches the marker grammar.
pub fn is_marker(value: &str) -> bool {
    value.trim().starts_with(MARKER_TOKEN)
}
