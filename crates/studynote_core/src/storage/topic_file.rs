//! Per-topic backing file.
//!
//! # Responsibility
//! - Cache the raw record lines of one topic in memory.
//! - Append, delete-by-name and clear against the backing file.
//! - Materialize retained records into a [`TopicNotes`] aggregate.
//!
//! # Invariants
//! - `records` only holds lines that decode to a note of `topic`.
//! - Memory is updated only after the matching disk write succeeded.
//! - Mutations are refused until the backing file was read successfully.
//! - File handles never outlive the call that opened them.

use crate::model::topic::{Topic, TopicNotes};
use crate::storage::codec::{decode_note, record_name};
use crate::storage::{StorageError, StorageResult};
use log::{debug, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// In-memory view of one `<TOPIC>.txt` file.
#[derive(Debug)]
pub struct TopicFile {
    path: PathBuf,
    topic: Topic,
    records: Vec<String>,
    loaded: bool,
}

impl TopicFile {
    /// Binds a topic to its backing path without touching disk.
    pub fn new(topic: Topic, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            topic,
            records: Vec::new(),
            loaded: false,
        }
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw record lines currently retained, in file order.
    pub fn records(&self) -> &[String] {
        &self.records
    }

    /// Whether the backing file has been read since the last rebind.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Returns whether a retained record carries `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.records
            .iter()
            .any(|line| record_name(line) == Some(name))
    }

    /// Rebinds this topic to a new backing file.
    ///
    /// Cached records belonged to the previous file and are dropped.
    pub fn set_file(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
        self.records.clear();
        self.loaded = false;
    }

    /// Loads the backing file, returning how many corrupted lines were dropped.
    ///
    /// Corrupted lines, including lines that are not valid UTF-8, are left on
    /// disk until the next full rewrite. Blank lines are skipped without
    /// counting.
    ///
    /// # Errors
    /// - `FileNotFound` when the backing file disappeared.
    /// - `Io` for any other read failure. Cached records are left untouched
    ///   but the file counts as unloaded until a later read succeeds.
    pub fn read_file(&mut self) -> StorageResult<usize> {
        self.loaded = false;
        let file = File::open(&self.path).map_err(|err| StorageError::io(&self.path, err))?;
        let reader = BufReader::new(file);

        let mut records = Vec::new();
        let mut corrupted = 0usize;
        for chunk in reader.split(b'\n') {
            let mut bytes = chunk.map_err(|err| StorageError::io(&self.path, err))?;
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
            let line = match String::from_utf8(bytes) {
                Ok(line) => line,
                Err(err) => {
                    corrupted += 1;
                    debug!(
                        "event=record_corrupt module=storage topic={} reason=invalid_utf8 error={}",
                        self.topic,
                        err.utf8_error()
                    );
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match decode_note(&line) {
                Ok(note) if note.topic == self.topic => records.push(line),
                Ok(note) => {
                    corrupted += 1;
                    debug!(
                        "event=record_foreign_topic module=storage topic={} found={}",
                        self.topic, note.topic
                    );
                }
                Err(reason) => {
                    corrupted += 1;
                    debug!(
                        "event=record_corrupt module=storage topic={} reason={}",
                        self.topic, reason
                    );
                }
            }
        }

        if corrupted > 0 {
            warn!(
                "event=topic_read module=storage status=degraded topic={} kept={} corrupted={}",
                self.topic,
                records.len(),
                corrupted
            );
        }
        self.records = records;
        self.loaded = true;
        Ok(corrupted)
    }

    /// Appends one encoded record to the backing file and the cache.
    ///
    /// A missing final newline left by an earlier writer is restored first so
    /// the new record starts on its own line. A failed write is rolled back to
    /// the previous file length so no half-written line survives.
    ///
    /// # Errors
    /// - `TopicNotLoaded` before a successful [`TopicFile::read_file`].
    /// - `RejectedRecord` when `line` is not a valid record of this topic.
    /// - `Io` when the append fails; memory is left unchanged.
    pub fn write_note_to_file(&mut self, line: String) -> StorageResult<()> {
        self.ensure_loaded()?;
        self.check_record(&line)?;

        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| StorageError::io(&self.path, err))?;
        let original_len = file
            .metadata()
            .map_err(|err| StorageError::io(&self.path, err))?
            .len();
        let needs_newline = original_len > 0
            && !ends_with_newline(&mut file).map_err(|err| StorageError::io(&self.path, err))?;

        let mut payload = String::with_capacity(line.len() + 2);
        if needs_newline {
            debug!(
                "event=topic_append module=storage topic={} repaired_newline=true",
                self.topic
            );
            payload.push('\n');
        }
        payload.push_str(&line);
        payload.push('\n');

        let written = file
            .write_all(payload.as_bytes())
            .and_then(|()| file.sync_data());
        if let Err(err) = written {
            if let Err(rollback) = file.set_len(original_len) {
                warn!(
                    "event=topic_append_rollback module=storage status=error topic={} error={}",
                    self.topic, rollback
                );
            }
            return Err(StorageError::io(&self.path, err));
        }

        self.records.push(line);
        Ok(())
    }

    /// Removes every record named `name` and rewrites the backing file.
    ///
    /// Returns `false` without touching disk when nothing matched.
    ///
    /// # Errors
    /// - `TopicNotLoaded` before a successful [`TopicFile::read_file`]; the
    ///   rewrite would otherwise replace records that were never loaded.
    pub fn delete_entry(&mut self, name: &str) -> StorageResult<bool> {
        self.ensure_loaded()?;
        let retained: Vec<String> = self
            .records
            .iter()
            .filter(|line| record_name(line) != Some(name))
            .cloned()
            .collect();
        if retained.len() == self.records.len() {
            return Ok(false);
        }

        rewrite_records(&self.path, &retained)?;
        self.records = retained;
        Ok(true)
    }

    /// Truncates the backing file and drops every cached record.
    pub fn clear_file(&mut self) -> StorageResult<()> {
        self.ensure_loaded()?;
        File::create(&self.path).map_err(|err| StorageError::io(&self.path, err))?;
        self.records.clear();
        Ok(())
    }

    /// Decodes the retained records into a topic aggregate.
    pub fn convert_file_to_topic(&self) -> TopicNotes {
        let mut notes = TopicNotes::new(self.topic);
        // Retained lines were validated on read or write.
        notes.notes = self
            .records
            .iter()
            .filter_map(|line| decode_note(line).ok())
            .collect();
        notes
    }

    fn ensure_loaded(&self) -> StorageResult<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(StorageError::TopicNotLoaded(self.topic))
        }
    }

    fn check_record(&self, line: &str) -> StorageResult<()> {
        let rejected = |reason: String| StorageError::RejectedRecord {
            topic: self.topic,
            reason,
        };
        if line.contains(['\n', '\r']) {
            return Err(rejected("record spans more than one line".to_string()));
        }
        let note = decode_note(line).map_err(|err| rejected(err.to_string()))?;
        if note.topic != self.topic {
            return Err(rejected(format!("record belongs to {}", note.topic)));
        }
        Ok(())
    }
}

/// Reads the last byte of a non-empty file.
fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Replaces the whole file with `records`: temp file, fsync, rename.
fn rewrite_records(path: &Path, records: &[String]) -> StorageResult<()> {
    let tmp_path = path.with_extension("tmp");
    let write_tmp = || -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        {
            let mut writer = BufWriter::new(&mut file);
            for record in records {
                writer.write_all(record.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        file.sync_all()
    };

    if let Err(err) = write_tmp() {
        let _ = fs::remove_file(&tmp_path);
        return Err(StorageError::io(&tmp_path, err));
    }
    fs::rename(&tmp_path, path).map_err(|err| {
        let _ = fs::remove_file(&tmp_path);
        StorageError::io(path, err)
    })
}
