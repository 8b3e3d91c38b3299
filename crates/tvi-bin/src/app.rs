//! Startup wiring and the read-key, interpret, redraw loop.

use crate::cli::Args;
use anyhow::{Context, Result};
use core_actions::{FileStore, FsStore, Session};
use core_config::Config;
use core_render::{RenderEngine, View, compose};
use core_terminal::{CrosstermBackend, HeadlessDriver, Input, LaunchMode, TerminalDriver};
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info};

/// Build the session for `mode`, run it to the end, and return the exit
/// status. The terminal is restored before any stdout payload is written.
pub fn run(args: &Args, config: &Config, mode: LaunchMode) -> Result<i32> {
    let stdin_is_buffer = matches!(mode, LaunchMode::StdinBuffer { .. });
    let stdin_text = if stdin_is_buffer {
        Some(io::read_to_string(io::stdin()).context("reading the buffer from stdin")?)
    } else {
        None
    };
    let mut editor = config.editor().clone();
    editor.start_in_insert |= args.insert;
    let targets = args.targets(stdin_is_buffer);
    info!(target: "runtime", ?mode, files = targets.len(), "launch");

    let (status, mut store) = match mode {
        LaunchMode::Interactive { screen_on_tty } | LaunchMode::StdinBuffer { screen_on_tty } => {
            let mut driver = CrosstermBackend::new(screen_on_tty)?;
            let session = open_session(&driver, FsStore::new(stdin_text), &editor, targets, args)?;
            driver.enter()?;
            let outcome = drive(&mut driver, session);
            driver.leave()?;
            outcome?
        }
        LaunchMode::PipeFilter => {
            let pipe = &config.file.pipe;
            let mut driver = HeadlessDriver::from_reader(io::stdin(), pipe.columns, pipe.rows)
                .with_interrupt(install_interrupt_flag()?);
            let session = open_session(&driver, FsStore::new(stdin_text), &editor, targets, args)?;
            drive(&mut driver, session)?
        }
    };

    if let Some(payload) = store.take_stdout_payload() {
        let mut out = io::stdout().lock();
        out.write_all(payload.as_bytes())?;
        out.flush()?;
    }
    Ok(status)
}

fn open_session<D, S>(
    driver: &D,
    store: S,
    editor: &core_config::EditorConfig,
    targets: Vec<core_state::FileTarget>,
    args: &Args,
) -> Result<Session<S>>
where
    D: TerminalDriver + ?Sized,
    S: FileStore,
{
    let (_, rows) = driver.size();
    let mut session = Session::open(store, editor, targets, text_rows(rows))?;
    for cmd in &args.commands {
        debug!(target: "runtime", cmd = cmd.as_str(), "startup_command");
        session.run_ex(cmd);
    }
    Ok(session)
}

fn text_rows(rows: u16) -> usize {
    (rows as usize).saturating_sub(1).max(1)
}

/// SIGINT raises a flag the pipe driver turns into `⌃C`; a second SIGINT
/// before the first was consumed exits with status 1.
fn install_interrupt_flag() -> Result<Arc<AtomicBool>> {
    use signal_hook::consts::SIGINT;
    let flag = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register_conditional_shutdown(SIGINT, 1, Arc::clone(&flag))?;
    signal_hook::flag::register(SIGINT, Arc::clone(&flag))?;
    Ok(flag)
}

/// Run `session` against `driver` until it quits. Returns the exit status
/// and the store, which may hold a stdout payload.
pub fn drive<D, S>(driver: &mut D, mut session: Session<S>) -> Result<(i32, S)>
where
    D: TerminalDriver + ?Sized,
    S: FileStore,
{
    let mut engine = RenderEngine::new();
    paint(driver, &mut engine, &session)?;
    while !session.is_finished() {
        match driver.next_input()? {
            Some(Input::Key(key)) => session.handle_key(&key),
            Some(Input::Resize { rows, .. }) => {
                session.resize(text_rows(rows));
                engine.invalidate();
            }
            None => {
                info!(target: "runtime", "end_of_input");
                session.end_of_input();
            }
        }
        if session.is_finished() {
            break;
        }
        if session.take_bell() {
            driver.bell()?;
        }
        if session.take_redraw() {
            engine.invalidate();
        }
        paint(driver, &mut engine, &session)?;
    }
    let status = session.exit_status().unwrap_or(0);
    info!(target: "runtime", status, "session_finished");
    Ok((status, session.into_store()))
}

fn paint<D, S>(driver: &mut D, engine: &mut RenderEngine, session: &Session<S>) -> Result<()>
where
    D: TerminalDriver + ?Sized,
    S: FileStore,
{
    let (cols, rows) = driver.size();
    let frame = compose(&View::of(session), cols, rows);
    engine.render(driver, &frame)
}
