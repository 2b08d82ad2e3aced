//! Storage root orchestration.
//!
//! # Responsibility
//! - Own one [`TopicFile`] per known topic under the active storage root.
//! - Route adds, broadcast deletes and bulk-decode every topic.
//! - Swap between the production root and the disposable test sandbox.
//! - Copy the active topic files into the export folder on request.
//!
//! # Invariants
//! - Exactly one root is active; the mode tag carries only the mappings valid
//!   in that mode.
//! - Production files are never touched while sandboxed.
//! - The sandbox root never equals, contains or lies inside the production
//!   root.
//! - Note names are unique across all topics of the active root.

use crate::model::note::Note;
use crate::model::topic::{Topic, TopicNotes};
use crate::storage::codec::encode_note;
use crate::storage::topic_file::TopicFile;
use crate::storage::{StorageError, StorageResult};
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

type TopicFiles = BTreeMap<Topic, TopicFile>;

const DEFAULT_EXPORT_DIR: &str = "export";

/// Active storage mode with the mappings valid in it.
#[derive(Debug)]
enum StorageMode {
    Normal {
        files: TopicFiles,
    },
    Sandboxed {
        /// Production mapping parked until test mode ends.
        production: TopicFiles,
        files: TopicFiles,
    },
}

/// Outcome of (re)attaching to a storage root.
#[derive(Debug, Default)]
pub struct InitReport {
    /// Set when the root directory did not exist and was created.
    pub folder_created: bool,
    /// Folder creation failure; topic files are still attempted.
    pub folder_error: Option<StorageError>,
    /// Topics that dropped corrupted records on read, with counts.
    pub corrupted: Vec<(Topic, usize)>,
    /// Topics whose backing file could not be created or read.
    pub failures: Vec<(Topic, StorageError)>,
}

impl InitReport {
    pub fn total_corrupted(&self) -> usize {
        self.corrupted.iter().map(|(_, count)| count).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.folder_error.is_none() && self.corrupted.is_empty() && self.failures.is_empty()
    }
}

/// Outcome of deleting the sandbox root when test mode ends.
#[derive(Debug, Default)]
pub struct SandboxCleanup {
    /// Files left behind, with the failure that kept them.
    pub failed_files: Vec<(PathBuf, io::Error)>,
    pub dir_removed: bool,
}

impl SandboxCleanup {
    pub fn is_complete(&self) -> bool {
        self.failed_files.is_empty() && self.dir_removed
    }
}

/// Outcome of copying the active topic files into the export folder.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Set when the export folder was missing and had to be recreated.
    pub folder_recreated: bool,
    /// Copied files, at their export location.
    pub exported: Vec<PathBuf>,
    pub failures: Vec<(Topic, StorageError)>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns the topic-to-file mapping and the active storage root.
#[derive(Debug)]
pub struct StorageManager {
    production_root: PathBuf,
    sandbox_root: PathBuf,
    export_root: PathBuf,
    topics: Vec<Topic>,
    mode: StorageMode,
}

impl StorageManager {
    /// Creates a manager in normal mode. Nothing touches disk until
    /// [`StorageManager::initialize`].
    pub fn new(production_root: impl Into<PathBuf>, sandbox_root: impl Into<PathBuf>) -> Self {
        Self {
            production_root: production_root.into(),
            sandbox_root: sandbox_root.into(),
            export_root: PathBuf::from(DEFAULT_EXPORT_DIR),
            topics: Topic::ALL.to_vec(),
            mode: StorageMode::Normal {
                files: TopicFiles::new(),
            },
        }
    }

    /// Replaces the folder [`StorageManager::export`] copies into.
    pub fn with_export_root(mut self, export_root: impl Into<PathBuf>) -> Self {
        self.export_root = export_root.into();
        self
    }

    pub fn active_root(&self) -> &Path {
        match self.mode {
            StorageMode::Normal { .. } => &self.production_root,
            StorageMode::Sandboxed { .. } => &self.sandbox_root,
        }
    }

    pub fn production_root(&self) -> &Path {
        &self.production_root
    }

    pub fn sandbox_root(&self) -> &Path {
        &self.sandbox_root
    }

    pub fn export_root(&self) -> &Path {
        &self.export_root
    }

    pub fn is_test_mode(&self) -> bool {
        matches!(self.mode, StorageMode::Sandboxed { .. })
    }

    /// Topic file bound to `topic` under the active root, if initialized.
    pub fn topic_file(&self, topic: Topic) -> Option<&TopicFile> {
        self.files().get(&topic)
    }

    /// Attaches to the active root: creates the folder and any missing topic
    /// file, then reads every topic.
    ///
    /// Idempotent for an unchanged root. Failures land in the report instead
    /// of aborting, so one unreadable topic does not hide the others.
    pub fn initialize(&mut self) -> InitReport {
        let mut report = InitReport::default();
        let root = self.active_root().to_path_buf();
        info!(
            "event=storage_init module=storage status=start root={} test_mode={}",
            root.display(),
            self.is_test_mode()
        );

        match create_folder(&root) {
            Ok(created) => report.folder_created = created,
            Err(err) => {
                error!(
                    "event=folder_create module=storage status=error root={} error={}",
                    root.display(),
                    err
                );
                report.folder_error = Some(err);
            }
        }

        let mut files = TopicFiles::new();
        for topic in self.topics.clone() {
            let topic_file = match self.create_single_file(topic) {
                Ok(topic_file) => topic_file,
                Err(err) => {
                    report.failures.push((topic, err));
                    TopicFile::new(topic, root.join(topic.file_name()))
                }
            };
            files.insert(topic, topic_file);
        }

        for (topic, topic_file) in files.iter_mut() {
            if report.failures.iter().any(|(failed, _)| failed == topic) {
                continue;
            }
            match topic_file.read_file() {
                Ok(0) => {}
                Ok(count) => report.corrupted.push((*topic, count)),
                Err(err) => {
                    error!(
                        "event=topic_read module=storage status=error topic={} error={}",
                        topic, err
                    );
                    report.failures.push((*topic, err));
                }
            }
        }

        *self.files_mut() = files;
        info!(
            "event=storage_init module=storage status=ok root={} corrupted={} failures={}",
            root.display(),
            report.total_corrupted(),
            report.failures.len()
        );
        report
    }

    /// Creates `<topic>.txt` under the active root when absent and returns a
    /// topic file bound to it either way.
    pub fn create_single_file(&self, topic: Topic) -> StorageResult<TopicFile> {
        let path = self.active_root().join(topic.file_name());
        let mut topic_file = TopicFile::new(topic, path.clone());
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                info!(
                    "event=file_create module=storage status=ok topic={} path={}",
                    topic,
                    path.display()
                );
                topic_file.set_file(path);
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
            Err(err) => {
                error!(
                    "event=file_create module=storage status=error topic={} error={}",
                    topic, err
                );
                return Err(StorageError::io(&path, err));
            }
        }
        Ok(topic_file)
    }

    /// Appends `note` to its topic's file.
    ///
    /// # Errors
    /// - `InvalidNote` when the note cannot be encoded faithfully.
    /// - `DuplicateName` when any topic already holds the name.
    /// - `UnknownTopic` before initialization.
    /// - `Io` when the append fails; memory is left unchanged.
    pub fn add_entry(&mut self, note: &Note) -> StorageResult<()> {
        note.validate()?;
        if self.contains_name(&note.name) {
            return Err(StorageError::DuplicateName(note.name.clone()));
        }

        let topic_file = self
            .files_mut()
            .get_mut(&note.topic)
            .ok_or(StorageError::UnknownTopic(note.topic))?;
        if let Err(err) = topic_file.write_note_to_file(encode_note(note)) {
            error!(
                "event=entry_add module=storage status=error topic={} error={}",
                note.topic, err
            );
            return Err(err);
        }
        info!(
            "event=entry_add module=storage status=ok topic={}",
            note.topic
        );
        Ok(())
    }

    /// Removes the note called `name` from whichever topic holds it.
    ///
    /// Returns `Ok(false)` when no topic held the name. Topics whose file
    /// could not be loaded are skipped.
    pub fn delete_entry(&mut self, name: &str) -> StorageResult<bool> {
        let mut removed = false;
        for (topic, topic_file) in self.files_mut().iter_mut() {
            if !topic_file.is_loaded() {
                warn!(
                    "event=entry_delete module=storage status=skipped topic={} reason=not_loaded",
                    topic
                );
                continue;
            }
            match topic_file.delete_entry(name) {
                Ok(hit) => removed |= hit,
                Err(err) => {
                    error!(
                        "event=entry_delete module=storage status=error topic={} removed_elsewhere={} error={}",
                        topic, removed, err
                    );
                    return Err(err);
                }
            }
        }
        info!(
            "event=entry_delete module=storage status=ok removed={}",
            removed
        );
        Ok(removed)
    }

    /// Empties one topic's backing file.
    pub fn delete_all_entry(&mut self, topic: Topic) -> StorageResult<()> {
        self.files_mut()
            .get_mut(&topic)
            .ok_or(StorageError::UnknownTopic(topic))?
            .clear_file()?;
        info!(
            "event=topic_clear module=storage status=ok topic={}",
            topic
        );
        Ok(())
    }

    /// Decodes every topic of the active root.
    pub fn decode_all(&self) -> BTreeMap<Topic, TopicNotes> {
        self.files()
            .iter()
            .map(|(topic, topic_file)| (*topic, topic_file.convert_file_to_topic()))
            .collect()
    }

    /// Returns whether any topic of the active root holds `name`.
    pub fn contains_name(&self, name: &str) -> bool {
        self.files().values().any(|topic_file| topic_file.contains(name))
    }

    /// Parks the production mapping and attaches to a fresh sandbox root.
    ///
    /// Anything left in the sandbox root by an earlier session is deleted
    /// first, so test mode always starts empty.
    ///
    /// # Errors
    /// - `AlreadyInTestMode` when already sandboxed.
    /// - `SandboxOverlapsProduction` when either root contains the other, so
    ///   the stale-sandbox sweep can never reach production files.
    pub fn enter_test_mode(&mut self) -> StorageResult<InitReport> {
        if roots_overlap(&self.sandbox_root, &self.production_root) {
            return Err(StorageError::SandboxOverlapsProduction(
                self.sandbox_root.clone(),
            ));
        }

        let production = match std::mem::replace(
            &mut self.mode,
            StorageMode::Normal {
                files: TopicFiles::new(),
            },
        ) {
            StorageMode::Normal { files } => files,
            sandboxed @ StorageMode::Sandboxed { .. } => {
                self.mode = sandboxed;
                return Err(StorageError::AlreadyInTestMode);
            }
        };
        self.mode = StorageMode::Sandboxed {
            production,
            files: TopicFiles::new(),
        };

        // Leftovers from a session that never exited test mode.
        let stale = self.delete_test_data();
        if !stale.is_complete() {
            warn!(
                "event=test_mode_enter module=storage status=degraded stale_files={}",
                stale.failed_files.len()
            );
        }
        info!(
            "event=test_mode_enter module=storage status=start sandbox={}",
            self.sandbox_root.display()
        );
        Ok(self.initialize())
    }

    /// Restores the production mapping and deletes the sandbox tree.
    ///
    /// Cleanup failures are reported but do not block the switch back.
    ///
    /// # Errors
    /// - `NotInTestMode` when test mode was never entered.
    pub fn exit_test_mode(&mut self) -> StorageResult<SandboxCleanup> {
        let production = match std::mem::replace(
            &mut self.mode,
            StorageMode::Normal {
                files: TopicFiles::new(),
            },
        ) {
            StorageMode::Sandboxed { production, .. } => production,
            normal @ StorageMode::Normal { .. } => {
                self.mode = normal;
                return Err(StorageError::NotInTestMode);
            }
        };
        self.mode = StorageMode::Normal { files: production };

        let cleanup = self.delete_test_data();
        info!(
            "event=test_mode_exit module=storage status={} failed_files={} dir_removed={}",
            if cleanup.is_complete() { "ok" } else { "degraded" },
            cleanup.failed_files.len(),
            cleanup.dir_removed
        );
        Ok(cleanup)
    }

    /// Copies every topic file of the active root into the export folder.
    ///
    /// A missing export folder is recreated first. Per-topic copy failures
    /// land in the report; the remaining topics are still exported.
    ///
    /// # Errors
    /// - `ExportOverlapsStorage` when the export folder is the active root.
    /// - `Io` when the export folder cannot be created.
    pub fn export(&self) -> StorageResult<ExportReport> {
        let root = self.active_root();
        if resolve_root(&self.export_root) == resolve_root(root) {
            return Err(StorageError::ExportOverlapsStorage(self.export_root.clone()));
        }

        let mut report = ExportReport::default();
        if !self.export_root.is_dir() {
            warn!(
                "event=export module=storage status=recreate_folder root={}",
                self.export_root.display()
            );
            fs::create_dir_all(&self.export_root)
                .map_err(|err| StorageError::io(&self.export_root, err))?;
            report.folder_recreated = true;
        }

        for (topic, topic_file) in self.files() {
            let target = self.export_root.join(topic.file_name());
            match fs::copy(topic_file.path(), &target) {
                Ok(_) => report.exported.push(target),
                Err(err) => {
                    warn!(
                        "event=export module=storage status=error topic={} error={}",
                        topic, err
                    );
                    report
                        .failures
                        .push((*topic, StorageError::io(topic_file.path(), err)));
                }
            }
        }
        info!(
            "event=export module=storage status={} root={} exported={} failures={}",
            if report.is_complete() { "ok" } else { "degraded" },
            self.export_root.display(),
            report.exported.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Deletes every file in the sandbox root, then the root itself.
    fn delete_test_data(&self) -> SandboxCleanup {
        let mut cleanup = SandboxCleanup::default();
        let entries = match fs::read_dir(&self.sandbox_root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                cleanup.dir_removed = true;
                return cleanup;
            }
            Err(err) => {
                warn!(
                    "event=sandbox_delete module=storage status=error root={} error={}",
                    self.sandbox_root.display(),
                    err
                );
                cleanup.failed_files.push((self.sandbox_root.clone(), err));
                return cleanup;
            }
        };

        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(err) => {
                    cleanup.failed_files.push((self.sandbox_root.clone(), err));
                    continue;
                }
            };
            let removed = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            if let Err(err) = removed {
                warn!(
                    "event=sandbox_delete module=storage status=error path={} error={}",
                    path.display(),
                    err
                );
                cleanup.failed_files.push((path, err));
            }
        }

        match fs::remove_dir(&self.sandbox_root) {
            Ok(()) => cleanup.dir_removed = true,
            Err(err) => warn!(
                "event=sandbox_delete module=storage status=error root={} error={}",
                self.sandbox_root.display(),
                err
            ),
        }
        cleanup
    }

    fn files(&self) -> &TopicFiles {
        match &self.mode {
            StorageMode::Normal { files } | StorageMode::Sandboxed { files, .. } => files,
        }
    }

    fn files_mut(&mut self) -> &mut TopicFiles {
        match &mut self.mode {
            StorageMode::Normal { files } | StorageMode::Sandboxed { files, .. } => files,
        }
    }
}

/// Ensures `root` exists. Returns `true` when it had to be created.
fn create_folder(root: &Path) -> StorageResult<bool> {
    if root.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(root).map_err(|err| StorageError::io(root, err))?;
    info!(
        "event=folder_create module=storage status=ok root={}",
        root.display()
    );
    Ok(true)
}

/// Returns whether either root is the other or one of its ancestors.
fn roots_overlap(left: &Path, right: &Path) -> bool {
    let left = resolve_root(left);
    let right = resolve_root(right);
    left.starts_with(&right) || right.starts_with(&left)
}

/// Absolute form of `path` with its closest existing ancestor canonicalized.
///
/// Roots that do not exist yet still compare by where they would be created.
fn resolve_root(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = fs::canonicalize(existing) {
            return missing
                .iter()
                .rev()
                .fold(canonical, |resolved, part| resolved.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(part)) => {
                missing.push(part.to_os_string());
                existing = parent;
            }
            _ => return absolute,
        }
    }
}
