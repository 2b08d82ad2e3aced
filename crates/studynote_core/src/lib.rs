//! Core domain logic for the study-note tracker.
//! This crate owns the record format and every storage invariant.

pub mod config;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;

pub use config::AppConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{
    Note, NoteValidationError, DEFAULT_IMPORTANCE, MAX_IMPORTANCE, MIN_IMPORTANCE,
};
pub use model::topic::{Topic, TopicNotes};
pub use service::note_service::{NoteService, NoteServiceError, ServiceResult};
pub use storage::{
    CorruptRecord, ExportReport, InitReport, SandboxCleanup, StorageError, StorageManager,
    StorageResult, TopicFile,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
