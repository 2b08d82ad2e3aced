//! Study-note use-case service.
//!
//! # Responsibility
//! - Keep a decoded view of every topic in sync with storage.
//! - Provide add/remove/list/filter and prerequisite ordering use-cases.
//! - Drive test-mode transitions and refresh the view afterwards.
//! - Hand exports of the active topic files to storage.
//!
//! # Invariants
//! - The in-memory view is re-read from storage after every mutation.
//! - New notes may only list prerequisites that already exist.
//! - Ordering never loops: prerequisite cycles are reported as errors.

use crate::model::note::{Note, NoteValidationError};
use crate::model::topic::{Topic, TopicNotes};
use crate::storage::{ExportReport, InitReport, SandboxCleanup, StorageError, StorageManager};
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, NoteServiceError>;

/// Errors from note service operations.
#[derive(Debug)]
pub enum NoteServiceError {
    InvalidNote(NoteValidationError),
    DuplicateName(String),
    /// `prerequisite` does not name an existing note.
    UnknownPrerequisite {
        note: String,
        prerequisite: String,
    },
    NoteNotFound(String),
    /// Ordering reached `name` again while resolving its own prerequisites.
    PrerequisiteCycle(String),
    Storage(StorageError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNote(err) => write!(f, "{err}"),
            Self::DuplicateName(name) => write!(f, "a note named `{name}` already exists"),
            Self::UnknownPrerequisite { note, prerequisite } => write!(
                f,
                "prerequisite `{prerequisite}` of `{note}` is not a saved note"
            ),
            Self::NoteNotFound(name) => write!(f, "note not found: `{name}`"),
            Self::PrerequisiteCycle(name) => {
                write!(f, "prerequisites of `{name}` form a cycle")
            }
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidNote(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for NoteServiceError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::DuplicateName(name) => Self::DuplicateName(name),
            StorageError::InvalidNote(err) => Self::InvalidNote(err),
            other => Self::Storage(other),
        }
    }
}

impl From<NoteValidationError> for NoteServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::InvalidNote(value)
    }
}

/// Note service facade over a [`StorageManager`].
#[derive(Debug)]
pub struct NoteService {
    storage: StorageManager,
    topics: BTreeMap<Topic, TopicNotes>,
}

impl NoteService {
    /// Wraps an uninitialized storage manager.
    pub fn new(storage: StorageManager) -> Self {
        Self {
            storage,
            topics: BTreeMap::new(),
        }
    }

    /// Attaches storage to its active root and loads every topic.
    pub fn initialize(&mut self) -> InitReport {
        let report = self.storage.initialize();
        self.reload();
        report
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    pub fn is_test_mode(&self) -> bool {
        self.storage.is_test_mode()
    }

    /// Saves a new note.
    ///
    /// # Errors
    /// - `InvalidNote`, `DuplicateName` or `UnknownPrerequisite` before disk
    ///   is touched.
    /// - `Storage` when the append fails.
    pub fn add_note(&mut self, note: Note) -> ServiceResult<()> {
        note.validate()?;
        if self.find(&note.name).is_some() {
            return Err(NoteServiceError::DuplicateName(note.name));
        }
        if let Some(missing) = note
            .prerequisites
            .iter()
            .find(|prerequisite| self.find(prerequisite).is_none())
        {
            return Err(NoteServiceError::UnknownPrerequisite {
                note: note.name.clone(),
                prerequisite: missing.clone(),
            });
        }

        self.storage.add_entry(&note)?;
        self.reload();
        info!(
            "event=note_add module=service status=ok topic={}",
            note.topic
        );
        Ok(())
    }

    /// Removes the note called `name`, returning it.
    ///
    /// Notes that listed it as a prerequisite keep the dangling name; ordering
    /// skips names that are no longer saved.
    pub fn remove_note(&mut self, name: &str) -> ServiceResult<Note> {
        let note = self
            .find(name)
            .cloned()
            .ok_or_else(|| NoteServiceError::NoteNotFound(name.to_string()))?;
        if !self.storage.delete_entry(name)? {
            warn!("event=note_remove module=service status=error error_code=view_out_of_sync");
        }
        self.reload();
        info!(
            "event=note_remove module=service status=ok topic={}",
            note.topic
        );
        Ok(note)
    }

    /// Drops every note of `topic`, returning how many were removed.
    pub fn clear_topic(&mut self, topic: Topic) -> ServiceResult<usize> {
        let removed = self.topics.get(&topic).map_or(0, TopicNotes::len);
        self.storage.delete_all_entry(topic)?;
        self.reload();
        Ok(removed)
    }

    pub fn find(&self, name: &str) -> Option<&Note> {
        self.topics
            .values()
            .flat_map(TopicNotes::iter)
            .find(|note| note.name == name)
    }

    /// Every note, grouped by topic in [`Topic::ALL`] order.
    pub fn list_notes(&self) -> Vec<&Note> {
        Topic::ALL
            .iter()
            .filter_map(|topic| self.topics.get(topic))
            .flat_map(TopicNotes::iter)
            .collect()
    }

    pub fn filter_by_topic(&self, topic: Topic) -> Vec<&Note> {
        self.topics
            .get(&topic)
            .map(|notes| notes.iter().collect())
            .unwrap_or_default()
    }

    /// Notes by importance, highest first, ties by name.
    pub fn filter_by_importance(&self, topic: Option<Topic>) -> Vec<&Note> {
        let mut notes = match topic {
            Some(topic) => self.filter_by_topic(topic),
            None => self.list_notes(),
        };
        notes.sort_by(|a, b| {
            b.importance
                .cmp(&a.importance)
                .then_with(|| a.name.cmp(&b.name))
        });
        notes
    }

    /// Transitive prerequisites of `name` in study order, ending with `name`.
    pub fn topo_order(&self, name: &str) -> ServiceResult<Vec<&Note>> {
        let index = self.name_index();
        let Some((&key, _)) = index.get_key_value(name) else {
            return Err(NoteServiceError::NoteNotFound(name.to_string()));
        };

        let mut visiting = BTreeSet::new();
        let mut done = BTreeSet::new();
        let mut order = Vec::new();
        visit(key, &index, &mut visiting, &mut done, &mut order)?;
        Ok(order)
    }

    /// Every note in an order that lists prerequisites first.
    ///
    /// Among notes whose prerequisites are all placed, names sort ascending.
    pub fn topo_order_all(&self) -> ServiceResult<Vec<&Note>> {
        let index = self.name_index();
        let mut pending: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for (name, note) in &index {
            let known: BTreeSet<&str> = note
                .prerequisites
                .iter()
                .map(String::as_str)
                .filter(|prerequisite| index.contains_key(prerequisite))
                .collect();
            for &prerequisite in &known {
                dependents.entry(prerequisite).or_default().push(*name);
            }
            pending.insert(*name, known.len());
        }

        let mut ready: BTreeSet<&str> = pending
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut order = Vec::with_capacity(index.len());
        while let Some(name) = ready.pop_first() {
            order.push(index[name]);
            for &dependent in dependents.get(name).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if order.len() < index.len() {
            let stuck = index
                .keys()
                .find(|name| pending.get(*name).is_some_and(|count| *count > 0))
                .map_or_else(String::new, |name| (*name).to_string());
            return Err(NoteServiceError::PrerequisiteCycle(stuck));
        }
        Ok(order)
    }

    /// Switches storage to the sandbox and loads its (empty) contents.
    pub fn enter_test_mode(&mut self) -> ServiceResult<InitReport> {
        let report = self.storage.enter_test_mode()?;
        self.reload();
        Ok(report)
    }

    /// Switches storage back to production and reloads the saved notes.
    pub fn exit_test_mode(&mut self) -> ServiceResult<SandboxCleanup> {
        let cleanup = self.storage.exit_test_mode()?;
        self.reload();
        Ok(cleanup)
    }

    /// Copies the active topic files into the configured export folder.
    pub fn export(&self) -> ServiceResult<ExportReport> {
        Ok(self.storage.export()?)
    }

    fn reload(&mut self) {
        self.topics = self.storage.decode_all();
    }

    fn name_index(&self) -> BTreeMap<&str, &Note> {
        self.topics
            .values()
            .flat_map(TopicNotes::iter)
            .map(|note| (note.name.as_str(), note))
            .collect()
    }
}

fn visit<'a>(
    name: &'a str,
    index: &BTreeMap<&'a str, &'a Note>,
    visiting: &mut BTreeSet<&'a str>,
    done: &mut BTreeSet<&'a str>,
    order: &mut Vec<&'a Note>,
) -> ServiceResult<()> {
    if done.contains(name) {
        return Ok(());
    }
    if !visiting.insert(name) {
        return Err(NoteServiceError::PrerequisiteCycle(name.to_string()));
    }

    let Some(note) = index.get(name).copied() else {
        visiting.remove(name);
        return Ok(());
    };
    for prerequisite in &note.prerequisites {
        if index.contains_key(prerequisite.as_str()) {
            visit(prerequisite, index, visiting, done, order)?;
        }
    }

    visiting.remove(name);
    done.insert(name);
    order.push(note);
    Ok(())
}
