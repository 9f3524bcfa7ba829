//! Typed addressing for form fields.
//!
//! Comments can be anchored to a top-level field (`surname`), a whole
//! repeatable section (`workHistory`) or a single field inside one entry of a
//! section (`workHistory.0.companyName`). The dotted string form is only used
//! at the storage and wire boundary.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Zero-based position of an entry inside a repeatable section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryIndex(pub usize);

impl EntryIndex {
    /// One-based number shown to people.
    pub fn ordinal(&self) -> usize {
        self.0 + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Field(String),
    Section(String),
    Entry {
        section: String,
        index: EntryIndex,
        field: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldPathError {
    #[error("field path is empty")]
    Empty,
    #[error("field path segment is empty")]
    EmptySegment,
    #[error("invalid entry index '{0}'")]
    BadIndex(String),
    #[error("entry path must name a field")]
    Incomplete,
    #[error("field path has too many segments")]
    TooDeep,
}

impl FieldPath {
    pub fn field(name: impl Into<String>) -> Self {
        FieldPath::Field(name.into())
    }

    pub fn entry(section: impl Into<String>, index: usize, field: impl Into<String>) -> Self {
        FieldPath::Entry {
            section: section.into(),
            index: EntryIndex(index),
            field: field.into(),
        }
    }

    /// Top-level key the path lives under.
    pub fn root_key(&self) -> &str {
        match self {
            FieldPath::Field(name) | FieldPath::Section(name) => name,
            FieldPath::Entry { section, .. } => section,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Field(name) | FieldPath::Section(name) => f.write_str(name),
            FieldPath::Entry {
                section,
                index,
                field,
            } => write!(f, "{}.{}.{}", section, index.0, field),
        }
    }
}

impl FromStr for FieldPath {
    type Err = FieldPathError;

    /// A single segment parses as [`FieldPath::Field`]; whether it names a
    /// section is decided by the registry when the path is resolved.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FieldPathError::Empty);
        }

        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(FieldPathError::EmptySegment);
        }

        match parts.as_slice() {
            [name] => Ok(FieldPath::Field((*name).to_string())),
            [section, index, field] => {
                let index: usize = index
                    .parse()
                    .map_err(|_| FieldPathError::BadIndex((*index).to_string()))?;
                Ok(FieldPath::entry(*section, index, *field))
            }
            [_, _] => Err(FieldPathError::Incomplete),
            _ => Err(FieldPathError::TooDeep),
        }
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
