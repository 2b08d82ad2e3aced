//! Note domain record.
//!
//! # Responsibility
//! - Define the study note filed under one topic.
//! - Validate user-supplied fields before they reach the record format.
//!
//! # Invariants
//! - `importance` stays within `MIN_IMPORTANCE..=MAX_IMPORTANCE`.
//! - No field contains the record separator, the prerequisite delimiter or a
//!   line break, so every valid note encodes to exactly one record line.

use crate::model::topic::Topic;
use crate::storage::codec::{PREREQUISITE_DELIMITER, RECORD_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MIN_IMPORTANCE: u8 = 1;
pub const MAX_IMPORTANCE: u8 = 10;
pub const DEFAULT_IMPORTANCE: u8 = 5;

/// Validation failure for a note about to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyName,
    ImportanceOutOfRange(u8),
    /// `field` holds a token reserved by the record format.
    ReservedToken { field: &'static str, value: String },
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "note name cannot be empty"),
            Self::ImportanceOutOfRange(value) => write!(
                f,
                "importance {value} is not in the valid {MIN_IMPORTANCE}-{MAX_IMPORTANCE} range"
            ),
            Self::ReservedToken { field, value } => {
                write!(f, "{field} `{value}` contains a reserved character sequence")
            }
        }
    }
}

impl Error for NoteValidationError {}

/// One study note tagged to a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Store-wide unique key.
    pub name: String,
    pub topic: Topic,
    /// 1 (least) to 10 (most important).
    pub importance: u8,
    /// Names of notes to study before this one.
    pub prerequisites: Vec<String>,
}

impl Note {
    /// Creates a note with default importance and no prerequisites.
    pub fn new(name: impl Into<String>, topic: Topic) -> Self {
        Self {
            name: name.into(),
            topic,
            importance: DEFAULT_IMPORTANCE,
            prerequisites: Vec::new(),
        }
    }

    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_prerequisites<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerequisites = prerequisites.into_iter().map(Into::into).collect();
        self
    }

    /// Checks that this note can be stored and read back unchanged.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.name.trim().is_empty() {
            return Err(NoteValidationError::EmptyName);
        }
        if !(MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(&self.importance) {
            return Err(NoteValidationError::ImportanceOutOfRange(self.importance));
        }
        check_reserved("name", &self.name)?;
        for prerequisite in &self.prerequisites {
            if prerequisite.trim().is_empty() {
                return Err(NoteValidationError::ReservedToken {
                    field: "prerequisite",
                    value: prerequisite.clone(),
                });
            }
            check_reserved("prerequisite", prerequisite)?;
        }
        Ok(())
    }
}

fn check_reserved(field: &'static str, value: &str) -> Result<(), NoteValidationError> {
    let reserved = value.contains(RECORD_SEPARATOR)
        || value.contains(PREREQUISITE_DELIMITER)
        || value.contains(['\n', '\r']);
    if reserved {
        return Err(NoteValidationError::ReservedToken {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
