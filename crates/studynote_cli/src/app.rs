//! Command execution against the note service.

use crate::command::{Command, FilterKeyword};
use crate::ui::Ui;
use log::{info, warn};
use std::io::{self, Write};
use studynote_core::{Note, NoteService};

/// Whether the prompt loop keeps reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Runs one command and reports its outcome through `ui`.
///
/// Service failures become user-facing messages; only output errors are
/// returned.
pub fn execute<W: Write>(
    command: Command,
    service: &mut NoteService,
    ui: &mut Ui<W>,
) -> io::Result<Flow> {
    match command {
        Command::Add {
            name,
            topic,
            importance,
            prerequisites,
        } => {
            let mut note = Note::new(name.clone(), topic).with_prerequisites(prerequisites);
            if let Some(importance) = importance {
                note = note.with_importance(importance);
            }
            match service.add_note(note) {
                Ok(()) => ui.add_success(&name, topic)?,
                Err(err) => {
                    warn!("event=command_add module=cli status=error error={}", err);
                    ui.error(err)?;
                }
            }
        }
        Command::Remove { name } => match service.remove_note(&name) {
            Ok(_) => ui.remove_success(&name)?,
            Err(err) => ui.error(err)?,
        },
        Command::List => {
            ui.notes(
                "Here are all your notes:",
                &service.list_notes(),
                "You have no notes! Type 'help c/add' to learn how to add one.",
            )?;
        }
        Command::Filter { keyword, topic } => {
            let notes = match (keyword, topic) {
                (FilterKeyword::Topic, Some(topic)) => service.filter_by_topic(topic),
                (FilterKeyword::Topic, None) => service.list_notes(),
                (FilterKeyword::Importance, topic) => service.filter_by_importance(topic),
            };
            ui.notes(
                "Here are the filtered notes:",
                &notes,
                "There are no notes to filter! Type 'help c/add' to learn how to add one.",
            )?;
        }
        Command::Topo { name } => {
            let ordered = match &name {
                Some(name) => service.topo_order(name),
                None => service.topo_order_all(),
            };
            match ordered {
                Ok(notes) => ui.notes(
                    "Here are the topologically sorted notes:",
                    &notes,
                    "You have no notes at the moment.",
                )?,
                Err(err) => ui.error(err)?,
            }
        }
        Command::Clear { topic } => match service.clear_topic(topic) {
            Ok(removed) => ui.clear_success(topic, removed)?,
            Err(err) => ui.error(err)?,
        },
        Command::Export => match service.export() {
            Ok(report) => {
                info!(
                    "event=command_export module=cli status=ok exported={}",
                    report.exported.len()
                );
                ui.export_result(&report)?;
            }
            Err(err) => ui.error(err)?,
        },
        Command::Help { command } => ui.help(command.as_deref())?,
        Command::TestMode => match service.enter_test_mode() {
            Ok(report) => {
                info!("event=command_test_mode module=cli status=ok");
                ui.test_mode_start(&report)?;
            }
            Err(err) => ui.error(err)?,
        },
        Command::ExitTestMode => match service.exit_test_mode() {
            Ok(cleanup) => {
                info!("event=command_exit_test_mode module=cli status=ok");
                ui.test_mode_end(&cleanup)?;
            }
            Err(err) => ui.error(err)?,
        },
        Command::Exit => {
            // Leaving the process from inside test mode must not leave the
            // sandbox behind.
            if service.is_test_mode() {
                let cleanup = service.exit_test_mode().map_err(io::Error::other)?;
                ui.test_mode_end(&cleanup)?;
            }
            ui.goodbye()?;
            return Ok(Flow::Exit);
        }
    }
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::{execute, Flow};
    use crate::command::parse_command;
    use crate::ui::Ui;
    use studynote_core::{NoteService, StorageManager};
    use tempfile::TempDir;

    fn service_in(dir: &TempDir) -> NoteService {
        let storage = StorageManager::new(dir.path().join("data"), dir.path().join("testdata"))
            .with_export_root(dir.path().join("export"));
        let mut service = NoteService::new(storage);
        service.initialize();
        service
    }

    fn run(service: &mut NoteService, line: &str) -> (Flow, String) {
        let mut ui = Ui::new(Vec::new());
        let command = parse_command(line).expect("valid command");
        let flow = execute(command, service, &mut ui).expect("write to buffer");
        (flow, String::from_utf8(ui.into_inner()).expect("utf-8 output"))
    }

    #[test]
    fn add_then_remove_prints_success_messages() {
        let dir = TempDir::new().expect("tempdir");
        let mut service = service_in(&dir);

        let (_, added) = run(&mut service, "add n/queue t/LINKED_LIST");
        assert!(added.contains("Successfully added queue into LINKED_LIST."));

        let (_, removed) = run(&mut service, "remove n/queue");
        assert_eq!(
            removed,
            "======================================================\n\
             Successfully removed queue.\n\
             ======================================================\n"
        );
    }

    #[test]
    fn removing_unknown_note_reports_failure() {
        let dir = TempDir::new().expect("tempdir");
        let mut service = service_in(&dir);

        let (flow, output) = run(&mut service, "remove n/ghost");
        assert_eq!(flow, Flow::Continue);
        assert!(output.contains("Unsuccessful! note not found: `ghost`"));
    }

    #[test]
    fn list_numbers_notes_in_topic_order() {
        let dir = TempDir::new().expect("tempdir");
        let mut service = service_in(&dir);
        run(&mut service, "add n/prim t/MINIMUM_SPANNING_TREE i/3");
        run(&mut service, "add n/merge t/SORTING i/8");

        let (_, output) = run(&mut service, "list");
        assert!(output.contains("1. merge [SORTING] importance=8"));
        assert!(output.contains("2. prim [MINIMUM_SPANNING_TREE] importance=3"));
    }

    #[test]
    fn exit_inside_test_mode_cleans_sandbox() {
        let dir = TempDir::new().expect("tempdir");
        let mut service = service_in(&dir);
        run(&mut service, "test-mode");
        assert!(dir.path().join("testdata").is_dir());

        let (flow, output) = run(&mut service, "exit");
        assert_eq!(flow, Flow::Exit);
        assert!(output.contains("Ending test mode."));
        assert!(!dir.path().join("testdata").exists());
    }

    #[test]
    fn export_recreates_folder_and_copies_topic_files() {
        let dir = TempDir::new().expect("tempdir");
        let mut service = service_in(&dir);
        run(&mut service, "add n/queue t/LINKED_LIST");

        let (_, output) = run(&mut service, "export");

        assert!(output.contains("The export folder has been recreated."));
        assert!(output.contains("Successfully exported 10 file(s)."));
        let exported = std::fs::read_to_string(dir.path().join("export").join("LINKED_LIST.txt"))
            .expect("exported file");
        assert_eq!(exported, "queue&@*LINKED_LIST&@*5&@*\n");

        let (_, again) = run(&mut service, "export");
        assert!(!again.contains("recreated"));
        assert!(again.contains("Successfully exported 10 file(s)."));
    }

    #[test]
    fn exit_test_mode_without_start_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        let mut service = service_in(&dir);

        let (_, output) = run(&mut service, "exit-test-mode");
        assert!(output.contains("Unsuccessful! test mode has not been started"));
    }
}
