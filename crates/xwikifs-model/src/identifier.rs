//! Names derived from directory and file names.
//!
//! A document directory is named `<Space>.<Name>`, split at the first `.`.
//! An object file is named `<ClassName>-<Number>.<ext>`, where the class
//! name itself contains a `.` and the split happens at the first `-`.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{LoadError, LoadResult};

/// The `Space.Name` identity of a document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DocumentReference {
    space: String,
    name: String,
}

impl DocumentReference {
    pub fn new(space: impl Into<String>, name: impl Into<String>) -> LoadResult<Self> {
        let space = space.into();
        let name = name.into();
        if space.is_empty() || name.is_empty() {
            return Err(LoadError::invalid_identifier(
                &format!("{space}.{name}"),
                "space and name must both be non-empty",
            ));
        }
        Ok(Self { space, name })
    }

    /// Parse a document directory name.
    ///
    /// Everything after the first `.` belongs to the name, so
    /// `Main.Sub.Page` is space `Main`, name `Sub.Page`.
    pub fn parse(dir_name: &str) -> LoadResult<Self> {
        match dir_name.split_once('.') {
            Some((space, name)) => Self::new(space, name),
            None => Err(LoadError::invalid_identifier(
                dir_name,
                "expected <Space>.<Name>",
            )),
        }
    }

    pub fn space(&self) -> &str {
        &self.space
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.space, self.name)
    }
}

impl FromStr for DocumentReference {
    type Err = LoadError;

    fn from_str(s: &str) -> LoadResult<Self> {
        Self::parse(s)
    }
}

/// The `(class, number)` identity of an object within its document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectReference {
    class_name: String,
    number: u32,
}

impl ObjectReference {
    /// Parse an object file name such as `XWiki.TagClass-0.xwo`.
    pub fn parse(file_name: &str, extension: &str) -> LoadResult<Self> {
        let stem = file_name
            .strip_suffix(extension)
            .and_then(|s| s.strip_suffix('.'))
            .ok_or_else(|| {
                LoadError::invalid_identifier(file_name, format!("expected a .{extension} file"))
            })?;

        let (class_name, number) = stem.split_once('-').ok_or_else(|| {
            LoadError::invalid_identifier(file_name, "expected <ClassName>-<Number>")
        })?;

        if !class_name.contains('.') {
            return Err(LoadError::invalid_identifier(
                file_name,
                "class name must be <Space>.<Class>",
            ));
        }
        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LoadError::invalid_identifier(
                file_name,
                "object number must be a non-negative integer",
            ));
        }
        let number = number.parse::<u32>().map_err(|e| {
            LoadError::invalid_identifier(file_name, format!("object number: {e}"))
        })?;

        Ok(Self {
            class_name: class_name.to_string(),
            number,
        })
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn number(&self) -> u32 {
        self.number
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.class_name, self.number)
    }
}
