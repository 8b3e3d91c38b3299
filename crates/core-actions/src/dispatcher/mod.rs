//! Dispatcher applying [`Command`](crate::Command) values to editor state.
//!
//! Sub-modules by concern:
//! * `motion`   - cursor movement and target resolution
//! * `operator` - `d c y < >` over motions and whole lines
//! * `edit`     - single-key edits (`x X D C s S J p P ~ r`)
//! * `insert`   - entering Insert/Replace and the keys typed there
//! * `undo`     - undo / redo
//! * `view`     - scrolling, marks, file info
//!
//! Handlers never change the interpreter mode themselves; they report what
//! should happen next through [`DispatchResult`].

use crate::search::SearchEngine;
use crate::{Command, Request, StatusMessage};
use core_config::EditorConfig;
use core_state::{BufferError, TextBuffer, Viewport};
use core_text::motion::FindSpec;
use tracing::error;

pub(crate) mod edit;
pub(crate) mod insert;
pub(crate) mod motion;
pub(crate) mod operator;
pub(crate) mod undo;
pub(crate) mod view;

/// Changes spanning more lines than this are reported on the status row.
const REPORT_THRESHOLD: usize = 2;

/// Options changed by `:set` that are not search flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub number: bool,
    pub shiftwidth: usize,
    pub undolevels: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl Settings {
    pub fn from_config(cfg: &EditorConfig) -> Self {
        Self {
            number: cfg.number,
            shiftwidth: cfg.shiftwidth.max(1),
            undolevels: cfg.undolevels,
        }
    }
}

/// Side effects a key produced for the session to act on.
#[derive(Debug, Default)]
pub struct Effects {
    pub message: Option<StatusMessage>,
    pub bell: bool,
    pub requests: Vec<Request>,
    /// Repaint everything (`⌃L`, buffer switches).
    pub redraw: bool,
}

/// Everything a key may touch, borrowed from the session for one key.
pub struct Env<'a> {
    pub buf: &'a mut TextBuffer,
    pub search: &'a mut SearchEngine,
    pub viewport: &'a mut Viewport,
    pub settings: &'a mut Settings,
    pub fx: Effects,
}

impl<'a> Env<'a> {
    pub fn new(
        buf: &'a mut TextBuffer,
        search: &'a mut SearchEngine,
        viewport: &'a mut Viewport,
        settings: &'a mut Settings,
    ) -> Self {
        Self {
            buf,
            search,
            viewport,
            settings,
            fx: Effects::default(),
        }
    }

    pub fn bell(&mut self) {
        self.fx.bell = true;
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.fx.message = Some(StatusMessage::info(text));
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.fx.message = Some(StatusMessage::warning(text));
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.fx.message = Some(StatusMessage::error(text));
    }

    /// Line-count feedback (`3 fewer lines`) once a change spans enough lines.
    pub(crate) fn report_lines(&mut self, n: usize, what: &str) {
        if n > REPORT_THRESHOLD {
            self.info(format!("{n} {what}"));
        }
    }

    /// Surface a buffer error. Out-of-range positions are bugs in the caller.
    pub(crate) fn buffer_error(&mut self, e: BufferError) {
        if e.is_contract_violation() {
            error!(target: "actions.dispatch", error = %e, "contract_violation");
            debug_assert!(false, "buffer contract violated: {e}");
        }
        self.bell();
        self.error(e.to_string());
    }
}

/// `j`/`k` column memory and the last `f t F T`, kept across commands.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct MotionMemory {
    pub last_find: Option<FindSpec>,
    /// `usize::MAX` after `$`: stick to line ends.
    pub sticky_col: Option<usize>,
}

/// How an insert session should start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InsertStart {
    pub replace: bool,
    pub count: usize,
    /// `o`/`O`: each count repetition opens a fresh line first.
    pub open_line: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DispatchResult {
    Done,
    /// Nothing happened; the bell has been rung.
    Failed,
    Insert(InsertStart),
}

/// Route a buffer command to its handler. Meta keys belong to the
/// interpreter and are rejected here.
pub(crate) fn dispatch(env: &mut Env, cmd: Command, mem: &mut MotionMemory) -> DispatchResult {
    match cmd {
        Command::Move { motion, count } => motion::handle_move(env, motion, count, mem),
        Command::Operate {
            op,
            motion,
            count,
            register,
        } => operator::handle_operate(env, op, motion, count, register, mem),
        Command::OperateLine { op, count, register } => operator::handle_operate_lines(env, op, count, register),
        Command::Edit { kind, count, register } => edit::handle_edit(env, kind, count, register, mem),
        Command::Enter { entry, count } => insert::enter(env, entry, count),
        Command::Meta { .. } => DispatchResult::Failed,
    }
}
