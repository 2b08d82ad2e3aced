//! Interactive study-note tracker.
//!
//! # Responsibility
//! - Load configuration, start logging and attach storage.
//! - Read commands from stdin until `exit` or end of input.

mod app;
mod command;
mod ui;

use app::{execute, Flow};
use command::parse_command;
use log::{error, info};
use std::io::{self, BufRead};
use std::process::ExitCode;
use studynote_core::{init_logging, AppConfig, NoteService, StorageManager};
use ui::Ui;

fn main() -> ExitCode {
    let config = AppConfig::from_env();
    start_logging(&config);

    let storage = StorageManager::new(&config.data_dir, &config.test_dir)
        .with_export_root(&config.export_dir);
    let mut service = NoteService::new(storage);
    let mut ui = Ui::new(io::stdout().lock());

    match run(&mut service, &mut ui) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=app_exit module=cli status=error error={}", err);
            eprintln!("studynote: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run<W: io::Write>(service: &mut NoteService, ui: &mut Ui<W>) -> io::Result<()> {
    ui.welcome()?;
    let report = service.initialize();
    ui.init_report(&report)?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let flow = match parse_command(&line) {
            Ok(command) => execute(command, service, ui)?,
            Err(err) => {
                ui.error(err)?;
                Flow::Continue
            }
        };
        if flow == Flow::Exit {
            info!("event=app_exit module=cli status=ok");
            return Ok(());
        }
    }

    // End of input behaves like `exit`.
    execute(command::Command::Exit, service, ui)?;
    info!("event=app_exit module=cli status=ok reason=eof");
    Ok(())
}

/// Logging failures are reported on stderr; the tracker still runs.
fn start_logging(config: &AppConfig) {
    let log_dir = match std::env::current_dir() {
        Ok(cwd) => config.absolute_log_dir(&cwd),
        Err(err) => {
            eprintln!("studynote: logging disabled, cannot resolve working directory: {err}");
            return;
        }
    };
    if let Err(err) = init_logging(&config.log_level, &log_dir) {
        eprintln!("studynote: logging disabled: {err}");
    }
}
