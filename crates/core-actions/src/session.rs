//! Session: the buffer arena, the file list, and everything one key touches.
//!
//! Keys go to the [`Interpreter`] with an [`Env`] borrowed from here; the
//! [`Request`]s it leaves behind (write, quit, next file, edit) are carried
//! out against the [`FileStore`] in order, stopping at the first failure so
//! `:wq` never quits after a failed write.

use crate::dispatcher::{Effects, Env, Settings};
use crate::ex::ExError;
use crate::interpreter::{Interpreter, Mode};
use crate::io_ops::{FileError, FileStore};
use crate::search::SearchEngine;
use crate::{Request, StatusMessage};
use core_config::EditorConfig;
use core_events::KeyEvent;
use core_state::{FileTarget, TextBuffer, Viewport};
use std::path::PathBuf;
use tracing::{debug, info};

pub struct Session<S: FileStore> {
    store: S,
    buffers: Vec<TextBuffer>,
    focus: usize,
    /// Files named at startup, walked by `:n`.
    files: Vec<FileTarget>,
    file_index: usize,
    interp: Interpreter,
    search: SearchEngine,
    viewport: Viewport,
    settings: Settings,
    message: Option<StatusMessage>,
    bell: bool,
    redraw: bool,
    exit: Option<i32>,
}

impl<S: FileStore> Session<S> {
    /// Open the first of `files` (or a scratch buffer). A missing file
    /// becomes a new empty buffer; any other load failure is returned.
    pub fn open(store: S, cfg: &EditorConfig, files: Vec<FileTarget>, rows: usize) -> Result<Self, FileError> {
        let mut session = Self {
            store,
            buffers: Vec::new(),
            focus: 0,
            files,
            file_index: 0,
            interp: Interpreter::new(),
            search: SearchEngine::new(cfg.wrapscan, cfg.ignorecase, cfg.regex),
            viewport: Viewport::new(0, rows),
            settings: Settings::from_config(cfg),
            message: None,
            bell: false,
            redraw: true,
            exit: None,
        };
        let buf = match session.files.first().cloned() {
            Some(target) => session.load(target)?,
            None => TextBuffer::default().with_undo_limit(session.settings.undolevels),
        };
        session.buffers.push(buf);
        if cfg.start_in_insert {
            session.start_insert();
        }
        info!(target: "runtime", files = session.files.len(), "session_opened");
        Ok(session)
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffers[self.focus]
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn search(&self) -> &SearchEngine {
        &self.search
    }

    pub fn mode(&self) -> Mode {
        self.interp.mode()
    }

    pub fn message(&self) -> Option<&StatusMessage> {
        self.message.as_ref()
    }

    pub fn command_line(&self) -> Option<String> {
        self.interp.command_line()
    }

    pub fn pending_keys(&self) -> &str {
        self.interp.pending_keys()
    }

    /// `Some(status)` once the session has quit.
    pub fn exit_status(&self) -> Option<i32> {
        self.exit
    }

    pub fn is_finished(&self) -> bool {
        self.exit.is_some()
    }

    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell)
    }

    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Screen rows available for text changed (the status row excluded).
    pub fn resize(&mut self, rows: usize) {
        self.viewport.set_height(rows);
        let line = self.buffers[self.focus].cursor().line;
        self.viewport.clamp_cursor_into_view(line);
        self.redraw = true;
    }

    pub fn handle_key(&mut self, key: &KeyEvent) {
        if self.is_finished() {
            return;
        }
        self.message = None;
        let mut env = Env::new(
            &mut self.buffers[self.focus],
            &mut self.search,
            &mut self.viewport,
            &mut self.settings,
        );
        self.interp.handle_key(&mut env, key);
        let fx = env.fx;
        self.apply(fx);
    }

    /// Run an ex command line as if typed after `:` (startup `-c` commands).
    pub fn run_ex(&mut self, line: &str) {
        if self.is_finished() {
            return;
        }
        let mut env = Env::new(
            &mut self.buffers[self.focus],
            &mut self.search,
            &mut self.viewport,
            &mut self.settings,
        );
        self.interp.run_ex(&mut env, line);
        let fx = env.fx;
        self.apply(fx);
    }

    pub fn start_insert(&mut self) {
        let mut env = Env::new(
            &mut self.buffers[self.focus],
            &mut self.search,
            &mut self.viewport,
            &mut self.settings,
        );
        self.interp.start_insert(&mut env);
        let fx = env.fx;
        self.apply(fx);
    }

    /// Input ran out: finish whatever was typed, then quit without writing.
    pub fn end_of_input(&mut self) {
        if self.is_finished() {
            return;
        }
        let mut env = Env::new(
            &mut self.buffers[self.focus],
            &mut self.search,
            &mut self.viewport,
            &mut self.settings,
        );
        self.interp.end_of_input(&mut env);
        info!(target: "runtime", dirty = self.buffers[self.focus].is_dirty(), "end_of_input");
        self.exit = Some(0);
    }

    fn apply(&mut self, fx: Effects) {
        if fx.message.is_some() {
            self.message = fx.message;
        }
        self.bell |= fx.bell;
        self.redraw |= fx.redraw;
        for request in fx.requests {
            debug!(target: "runtime", ?request, "request");
            if let Err(e) = self.carry_out(request) {
                self.message = Some(StatusMessage::error(e.to_string()));
                break;
            }
            if self.is_finished() {
                break;
            }
        }
        let line = self.buffers[self.focus].cursor().line;
        self.viewport.clamp_cursor_into_view(line);
    }

    fn carry_out(&mut self, request: Request) -> Result<(), ExError> {
        match request {
            Request::Write {
                path,
                force,
                only_if_dirty,
            } => {
                if only_if_dirty && !self.buffer().is_dirty() {
                    return Ok(());
                }
                self.write(path, force)
            }
            Request::Quit { force, status } => {
                if !force {
                    if self.buffer().is_dirty() {
                        return Err(ExError::NoWriteSinceChange);
                    }
                    let more = self.files.len().saturating_sub(self.file_index + 1);
                    if more > 0 {
                        return Err(ExError::MoreFiles(more));
                    }
                }
                info!(target: "runtime", status, force, "quit");
                self.exit = Some(status);
                Ok(())
            }
            Request::Next { force } => {
                self.check_discard(force)?;
                let next = self.file_index + 1;
                let target = self.files.get(next).cloned().ok_or(ExError::NoMoreFiles)?;
                self.switch_to(target)?;
                self.file_index = next;
                Ok(())
            }
            Request::Edit { path: None, force } => {
                self.check_discard(force)?;
                let target = self.buffer().meta.target.clone().ok_or(ExError::NoFileName)?;
                let buf = self.load(target)?;
                self.buffers[self.focus] = buf;
                self.after_switch();
                Ok(())
            }
            Request::Edit { path: Some(path), force } => {
                self.check_discard(force)?;
                self.switch_to(FileTarget::Path(path))
            }
        }
    }

    fn check_discard(&self, force: bool) -> Result<(), ExError> {
        if !force && self.buffer().is_dirty() {
            return Err(ExError::NoWriteSinceChange);
        }
        Ok(())
    }

    fn write(&mut self, path: Option<PathBuf>, force: bool) -> Result<(), ExError> {
        let own = self.buffer().meta.target.clone();
        let target = match path {
            Some(p) => FileTarget::Path(p),
            None => own.clone().ok_or(ExError::NoFileName)?,
        };
        let to_own = own.as_ref() == Some(&target);
        if let FileTarget::Path(p) = &target
            && !to_own
            && !force
            && self.store.exists(p)
        {
            return Err(ExError::FileExists);
        }
        let buf = &mut self.buffers[self.focus];
        let text = buf.file_text();
        self.store.save(&target, &text)?;
        if to_own || own.is_none() {
            buf.meta.target = Some(target.clone());
            buf.mark_saved();
        }
        let lines = buf.line_count();
        self.message = Some(StatusMessage::info(format!(
            "\"{}\" {lines}L, {}C written",
            target.display_name(),
            text.chars().count()
        )));
        Ok(())
    }

    /// Focus `target`, reusing a clean arena buffer for it when there is one.
    /// A dirty buffer left behind is dropped, its changes discarded.
    fn switch_to(&mut self, target: FileTarget) -> Result<(), ExError> {
        let existing = self
            .buffers
            .iter()
            .position(|b| b.meta.target.as_ref() == Some(&target) && !b.is_dirty());
        let next = match existing {
            Some(i) => i,
            None => {
                let buf = self.load(target)?;
                self.buffers.push(buf);
                self.buffers.len() - 1
            }
        };
        self.focus_on(next);
        Ok(())
    }

    fn focus_on(&mut self, mut next: usize) {
        if self.focus != next && self.buffers[self.focus].is_dirty() {
            debug!(target: "runtime", index = self.focus, "dirty_buffer_discarded");
            self.buffers.remove(self.focus);
            if self.focus < next {
                next -= 1;
            }
        }
        self.focus = next;
        self.after_switch();
    }

    fn after_switch(&mut self) {
        self.viewport.top = 0;
        let line = self.buffers[self.focus].cursor().line;
        self.viewport.clamp_cursor_into_view(line);
        self.redraw = true;
    }

    fn load(&mut self, target: FileTarget) -> Result<TextBuffer, FileError> {
        let name = target.display_name();
        let (mut buf, message) = match self.store.load(&target) {
            Ok(doc) => {
                let chars: usize = doc.lines.iter().map(|l| l.chars().count() + 1).sum();
                let lines = doc.lines.len();
                let buf = TextBuffer::from_document(doc, Some(target.clone()));
                (buf, format!("\"{name}\" {lines}L, {chars}C"))
            }
            Err(FileError::NotFound(_)) if matches!(target, FileTarget::Path(_)) => {
                let mut buf = TextBuffer::default();
                buf.meta.target = Some(target.clone());
                (buf, format!("\"{name}\" [New File]"))
            }
            Err(e) => return Err(e),
        };
        if target == FileTarget::Stdio {
            buf.mark_dirty();
        }
        self.message = Some(StatusMessage::info(message));
        Ok(buf.with_undo_limit(self.settings.undolevels))
    }
}
