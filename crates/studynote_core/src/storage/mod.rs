//! Plain-text persistence for study notes.
//!
//! # Responsibility
//! - Encode notes as delimited record lines, one backing file per topic.
//! - Detect and drop corrupted records on read, reporting counts upward.
//! - Swap the active storage root into and out of a disposable sandbox.
//! - Export the active topic files to a separate folder.
//!
//! # Invariants
//! - A topic file's in-memory records equal its on-disk records after every
//!   successful mutation.
//! - A topic file only holds records of its own topic.
//! - Storage failures are returned to the caller, never fatal to the process.

use crate::model::note::NoteValidationError;
use crate::model::topic::Topic;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

pub mod codec;
pub mod manager;
pub mod topic_file;

pub use codec::{decode_note, encode_note, CorruptRecord};
pub use manager::{ExportReport, InitReport, SandboxCleanup, StorageManager};
pub use topic_file::TopicFile;

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer failure.
#[derive(Debug)]
pub enum StorageError {
    Io { path: PathBuf, source: io::Error },
    /// Backing file vanished between initialization and read.
    FileNotFound(PathBuf),
    UnknownTopic(Topic),
    /// Topic file was never read successfully; writes would clobber it.
    TopicNotLoaded(Topic),
    RejectedRecord {
        topic: Topic,
        reason: String,
    },
    DuplicateName(String),
    InvalidNote(NoteValidationError),
    NotInTestMode,
    AlreadyInTestMode,
    /// Sandbox root equals, contains or lies inside the production root.
    SandboxOverlapsProduction(PathBuf),
    /// Export folder resolves to the active storage root.
    ExportOverlapsStorage(PathBuf),
}

impl StorageError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            return Self::FileNotFound(path.to_path_buf());
        }
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "i/o error at `{}`: {source}", path.display()),
            Self::FileNotFound(path) => write!(f, "file not found: `{}`", path.display()),
            Self::UnknownTopic(topic) => write!(f, "no backing file for topic {topic}"),
            Self::TopicNotLoaded(topic) => write!(
                f,
                "{} could not be loaded and is read-only until restart",
                topic.file_name()
            ),
            Self::RejectedRecord { topic, reason } => {
                write!(f, "record rejected by {}: {reason}", topic.file_name())
            }
            Self::DuplicateName(name) => write!(f, "a note named `{name}` already exists"),
            Self::InvalidNote(err) => write!(f, "{err}"),
            Self::NotInTestMode => write!(f, "test mode has not been started"),
            Self::AlreadyInTestMode => write!(f, "test mode is already active"),
            Self::SandboxOverlapsProduction(path) => write!(
                f,
                "sandbox root `{}` must not overlap the production root",
                path.display()
            ),
            Self::ExportOverlapsStorage(path) => write!(
                f,
                "export folder `{}` must differ from the storage folder",
                path.display()
            ),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidNote(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for StorageError {
    fn from(value: NoteValidationError) -> Self {
        Self::InvalidNote(value)
    }
}
