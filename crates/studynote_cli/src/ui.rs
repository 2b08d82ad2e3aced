//! User-facing messages.
//!
//! Every message block is framed by a divider line. Output goes to any
//! `Write` sink so command execution can be checked against a buffer.

use std::io::{self, Write};
use studynote_core::{ExportReport, InitReport, Note, SandboxCleanup, Topic};

const DIVIDER: &str = "======================================================";

pub struct Ui<W: Write> {
    out: W,
}

impl<W: Write> Ui<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Prints `lines` between two dividers.
    pub fn block<S: AsRef<str>>(&mut self, lines: &[S]) -> io::Result<()> {
        writeln!(self.out, "{DIVIDER}")?;
        for line in lines {
            writeln!(self.out, "{}", line.as_ref())?;
        }
        writeln!(self.out, "{DIVIDER}")?;
        self.out.flush()
    }

    pub fn welcome(&mut self) -> io::Result<()> {
        self.block(&["Hello! Welcome to StudyNote!"])
    }

    pub fn goodbye(&mut self) -> io::Result<()> {
        self.block(&["Thank you for using StudyNote! Study hard!"])
    }

    /// Startup warnings for corrupted records and unreadable topic files.
    pub fn init_report(&mut self, report: &InitReport) -> io::Result<()> {
        if let Some(err) = &report.folder_error {
            self.block(&[format!("Folder not created: {err}")])?;
        }
        for (topic, count) in &report.corrupted {
            let entries = if *count == 1 {
                "corrupted save entry"
            } else {
                "corrupted entries"
            };
            self.block(&[
                format!("{count} {entries} detected in {}.", topic.file_name()),
                "Note that the corrupted entries are discarded!".to_string(),
            ])?;
        }
        for (topic, err) in &report.failures {
            self.block(&[format!("Could not load {}: {err}", topic.file_name())])?;
        }
        Ok(())
    }

    pub fn add_success(&mut self, name: &str, topic: Topic) -> io::Result<()> {
        self.block(&[format!("Successfully added {name} into {topic}.")])
    }

    pub fn remove_success(&mut self, name: &str) -> io::Result<()> {
        self.block(&[format!("Successfully removed {name}.")])
    }

    pub fn clear_success(&mut self, topic: Topic, removed: usize) -> io::Result<()> {
        self.block(&[format!("Removed {removed} note(s) from {topic}.")])
    }

    pub fn export_result(&mut self, report: &ExportReport) -> io::Result<()> {
        let mut lines = Vec::new();
        if report.folder_recreated {
            lines.push("The export folder seems to be missing.".to_string());
            lines.push("The export folder has been recreated.".to_string());
        }
        for (topic, err) in &report.failures {
            lines.push(format!("Export failed for {}: {err}", topic.file_name()));
        }
        if report.is_complete() {
            lines.push(format!(
                "Successfully exported {} file(s).",
                report.exported.len()
            ));
        }
        self.block(&lines)
    }

    /// Prints a numbered listing, or `empty_message` when there is nothing.
    pub fn notes(&mut self, header: &str, notes: &[&Note], empty_message: &str) -> io::Result<()> {
        if notes.is_empty() {
            return self.block(&[empty_message]);
        }
        self.block(&[header])?;
        for (idx, note) in notes.iter().enumerate() {
            writeln!(
                self.out,
                "{}. {} [{}] importance={}",
                idx + 1,
                note.name,
                note.topic,
                note.importance
            )?;
        }
        self.out.flush()
    }

    pub fn test_mode_start(&mut self, report: &InitReport) -> io::Result<()> {
        self.block(&["Starting test mode."])?;
        self.init_report(report)
    }

    pub fn test_mode_end(&mut self, cleanup: &SandboxCleanup) -> io::Result<()> {
        let mut lines = vec!["Ending test mode.".to_string()];
        for (path, err) in &cleanup.failed_files {
            lines.push(format!("Delete failed for {}: {err}", path.display()));
        }
        if !cleanup.dir_removed {
            lines.push("Test data folder could not be removed.".to_string());
        }
        self.block(&lines)
    }

    pub fn error(&mut self, message: impl std::fmt::Display) -> io::Result<()> {
        self.block(&[
            format!("Unsuccessful! {message}"),
            "Type 'help' for additional assistance.".to_string(),
        ])
    }

    pub fn help(&mut self, command: Option<&str>) -> io::Result<()> {
        match command {
            None => self.block(&[
                "The available COMMAND_TYPE(s) are:",
                "[add]: add a note to a topic",
                "[remove]: remove a note by name",
                "[list]: display all notes",
                "[filter]: filter notes by topic or importance",
                "[topo]: list notes in prerequisite order",
                "[clear]: remove every note of one topic",
                "[export]: copy every topic file into the export folder",
                "[test-mode] / [exit-test-mode]: work in a disposable sandbox",
                "[exit]: close the application",
                "For more help on a specific command, type `help c/COMMAND_TYPE`",
            ]),
            Some("add") => self.block(&[
                "This function adds a note and tags it to a topic.".to_string(),
                "The syntax for the 'add' command is: add n/NAME t/TOPIC [i/IMPORTANCE] [p/PREREQ,...]".to_string(),
                "IMPORTANCE is 1-10 and defaults to 5.".to_string(),
                "PREREQ names must already be saved notes.".to_string(),
                format!("Valid TOPICs are {}.", topic_list()),
            ]),
            Some("remove") => self.block(&[
                "This function removes a note from its topic.",
                "The syntax for the 'remove' command is: remove n/NAME.",
            ]),
            Some("list") => self.block(&[
                "This function lists all stored notes.",
                "The syntax for the 'list' command is: list.",
            ]),
            Some("filter") => self.block(&[
                "This function filters by topic or importance.",
                "The syntax for the 'filter' command is: filter k/KEYWORD [t/TOPIC]",
                "KEYWORD has to be either 'topic' or 'importance'.",
                "TOPIC is required when KEYWORD is 'topic'.",
            ]),
            Some("topo") => self.block(&[
                "This function prints notes in the order they should be studied.",
                "The syntax for the 'topo' command is: topo [n/NAME].",
                "With NAME, only NAME and its prerequisites are printed.",
            ]),
            Some("clear") => self.block(&[
                "This function removes every note of one topic.",
                "The syntax for the 'clear' command is: clear t/TOPIC.",
            ]),
            Some("export") => self.block(&[
                "This function copies every topic file into the export folder.",
                "The syntax for the 'export' command is: export.",
                "A missing export folder is recreated.",
            ]),
            Some("exit") => self.block(&[
                "This function exits the application.",
                "The syntax for the 'exit' command is: exit.",
            ]),
            Some(other) => self.error(format!("there is no help page for `{other}`.")),
        }
    }
}

fn topic_list() -> String {
    Topic::ALL
        .iter()
        .map(|topic| format!("'{topic}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
