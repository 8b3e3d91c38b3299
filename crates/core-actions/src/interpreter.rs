//! The modal state machine.
//!
//! One key at a time goes to whichever state is active: Normal keys through
//! the [`KeyTranslator`], Insert/Replace keys into the insert session, and
//! `:`/`/`/`?` keys into the command line. Undo grouping is decided here:
//! every change command opens a group, which closes when the command is
//! done, or on `Esc` when the command started an insert.

use crate::dispatcher::insert::{self, InsertSession};
use crate::dispatcher::motion::mark_jump;
use crate::dispatcher::{DispatchResult, Env, MotionMemory, dispatch, undo, view};
use crate::ex::substitute::{ConfirmSession, ConfirmStep};
use crate::ex::{ExOutcome, ExProcessor, toggle_option};
use crate::key_translator::{KeyTranslator, Translation};
use crate::search::word_at;
use crate::{Command, InsertEntry, MetaKey, OperatorKind, Request};
use core_events::{KeyCode, KeyEvent};
use tracing::{debug, trace};

/// What the user is typing into, as shown on the status row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Insert,
    Replace,
    OperatorPending(OperatorKind),
    ExEntry(String),
    SearchEntry { forward: bool, text: String },
    ConfirmSubstitute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Ex,
    Search { forward: bool, count: Option<usize> },
}

#[derive(Debug)]
struct LineEntry {
    kind: LineKind,
    text: String,
}

#[derive(Debug)]
enum State {
    Normal,
    Insert(InsertSession),
    Line(LineEntry),
    Confirm(ConfirmSession),
}

/// What `.` replays: the command plus the keys its insert session took.
#[derive(Debug, Clone)]
struct LastChange {
    command: Command,
    keys: Vec<KeyEvent>,
}

#[derive(Debug)]
pub struct Interpreter {
    state: State,
    translator: KeyTranslator,
    mem: MotionMemory,
    last_change: Option<LastChange>,
    /// The command that opened the running insert session.
    insert_origin: Option<Command>,
    /// `⌃O`: the insert session parked for one Normal command.
    suspended: Option<InsertSession>,
    ex: ExProcessor,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            state: State::Normal,
            translator: KeyTranslator::new(),
            mem: MotionMemory::default(),
            last_change: None,
            insert_origin: None,
            suspended: None,
            ex: ExProcessor::default(),
        }
    }

    pub fn mode(&self) -> Mode {
        match &self.state {
            State::Normal => self
                .translator
                .pending_operator()
                .map_or(Mode::Normal, Mode::OperatorPending),
            State::Insert(s) if s.start.replace => Mode::Replace,
            State::Insert(_) => Mode::Insert,
            State::Line(entry) => match entry.kind {
                LineKind::Ex => Mode::ExEntry(entry.text.clone()),
                LineKind::Search { forward, .. } => Mode::SearchEntry {
                    forward,
                    text: entry.text.clone(),
                },
            },
            State::Confirm(_) => Mode::ConfirmSubstitute,
        }
    }

    /// The command line being typed, prompt char included.
    pub fn command_line(&self) -> Option<String> {
        let State::Line(entry) = &self.state else {
            return None;
        };
        let prompt = match entry.kind {
            LineKind::Ex => ':',
            LineKind::Search { forward: true, .. } => '/',
            LineKind::Search { forward: false, .. } => '?',
        };
        Some(format!("{prompt}{}", entry.text))
    }

    pub fn pending_keys(&self) -> &str {
        self.translator.pending_keys()
    }

    /// Start in Insert mode, as if `i` had been typed.
    pub fn start_insert(&mut self, env: &mut Env) {
        self.run_command(
            env,
            Command::Enter {
                entry: InsertEntry::Insert,
                count: 1,
            },
        );
    }

    pub fn handle_key(&mut self, env: &mut Env, key: &KeyEvent) {
        trace!(target: "actions.translate", %key, "key");
        let from_insert = matches!(self.state, State::Insert(_));
        match std::mem::replace(&mut self.state, State::Normal) {
            State::Normal => self.normal_key(env, key),
            State::Insert(s) => self.insert_key(env, s, key),
            State::Line(entry) => self.line_key(env, entry, key),
            State::Confirm(session) => self.confirm_key(env, session, key),
        }
        if !from_insert
            && matches!(self.state, State::Normal)
            && self.translator.is_idle()
            && let Some(s) = self.suspended.take()
        {
            debug!(target: "actions.dispatch", "insert_resumed");
            self.state = State::Insert(s);
        }
    }

    /// End of input acts like `Esc` in whatever state is active.
    pub fn end_of_input(&mut self, env: &mut Env) {
        match std::mem::replace(&mut self.state, State::Normal) {
            State::Insert(s) => self.finish_insert(env, s),
            State::Confirm(session) => self.finish_confirm(env, session),
            State::Normal | State::Line(_) => {}
        }
        if self.suspended.take().is_some() {
            env.buf.end_group();
        }
        self.translator.reset();
    }

    /// Run one ex command line as a single change.
    pub fn run_ex(&mut self, env: &mut Env, line: &str) {
        debug!(target: "actions.ex", line, "run");
        env.buf.begin_group();
        match self.ex.execute(env, line) {
            Ok(ExOutcome::Done) => env.buf.end_group(),
            Ok(ExOutcome::Confirm(session)) => {
                self.state = State::Confirm(session);
                return;
            }
            Err(e) => {
                env.buf.end_group();
                env.error(e.to_string());
            }
        }
        settle_cursor(env);
    }

    fn normal_key(&mut self, env: &mut Env, key: &KeyEvent) {
        match self.translator.translate(key) {
            Translation::Pending => {}
            Translation::Ready(cmd) => self.run_command(env, cmd),
            Translation::Cancelled { pending: Some(keys) } => env.info(format!("Cancelled {keys}")),
            Translation::Cancelled { pending: None } => {
                if self.suspended.is_none() {
                    env.info(if key.code == KeyCode::Esc {
                        "Press ZZ to save changes and quit"
                    } else {
                        "Press ZQ to lose changes and quit"
                    });
                }
            }
            Translation::Invalid => env.bell(),
        }
    }

    fn run_command(&mut self, env: &mut Env, cmd: Command) {
        trace!(target: "actions.dispatch", ?cmd, "command");
        match cmd {
            Command::Meta { key, count } => self.run_meta(env, key, count),
            Command::Move { .. } => {
                dispatch(env, cmd, &mut self.mem);
            }
            _ => {
                env.buf.begin_group();
                self.mem.sticky_col = None;
                match dispatch(env, cmd, &mut self.mem) {
                    DispatchResult::Insert(start) => self.begin_insert(env, InsertSession::new(start), cmd),
                    DispatchResult::Done => {
                        env.buf.end_group();
                        if cmd.is_repeatable() {
                            self.last_change = Some(LastChange {
                                command: cmd,
                                keys: Vec::new(),
                            });
                        }
                    }
                    DispatchResult::Failed => env.buf.end_group(),
                }
            }
        }
    }

    fn begin_insert(&mut self, env: &mut Env, session: InsertSession, origin: Command) {
        // A command run from `⌃O` that opens its own insert replaces the parked one.
        if self.suspended.take().is_some() {
            env.buf.end_group();
        }
        self.insert_origin = Some(origin);
        self.state = State::Insert(session);
    }

    fn insert_key(&mut self, env: &mut Env, mut s: InsertSession, key: &KeyEvent) {
        if !s.awaiting_literal() {
            if key.is_cancel() {
                self.finish_insert(env, s);
                return;
            }
            if key.is_ctrl('o') {
                debug!(target: "actions.dispatch", "insert_suspended");
                self.suspended = Some(s);
                return;
            }
        }
        insert::type_key(env, &mut s, key);
        self.state = State::Insert(s);
    }

    fn finish_insert(&mut self, env: &mut Env, s: InsertSession) {
        insert::finish(env, &s);
        env.buf.end_group();
        if let Some(command) = self.insert_origin.take() {
            self.last_change = Some(LastChange { command, keys: s.typed });
        }
    }

    fn repeat_change(&mut self, env: &mut Env, count: Option<usize>) {
        let Some(last) = self.last_change.as_mut() else {
            env.bell();
            return;
        };
        if let Some(n) = count {
            last.command = last.command.with_count(n);
        }
        let LastChange { command, keys } = last.clone();
        debug!(target: "actions.dispatch", ?command, keys = keys.len(), "repeat");
        env.buf.begin_group();
        if let DispatchResult::Insert(start) = dispatch(env, command, &mut self.mem) {
            insert::replay_session(env, start, &keys);
        }
        env.buf.end_group();
    }

    fn run_meta(&mut self, env: &mut Env, key: MetaKey, count: Option<usize>) {
        let n = count.unwrap_or(1).max(1);
        match key {
            MetaKey::Undo => {
                undo::handle_undo(env, n);
            }
            MetaKey::Redo => {
                undo::handle_redo(env, n);
            }
            MetaKey::RepeatChange => self.repeat_change(env, count),
            MetaKey::SearchPrompt { forward } => {
                self.state = State::Line(LineEntry {
                    kind: LineKind::Search { forward, count },
                    text: String::new(),
                });
            }
            MetaKey::SearchNext => {
                let forward = env.search.is_forward();
                self.run_search(env, forward, n);
            }
            MetaKey::SearchPrevious => {
                let forward = !env.search.is_forward();
                self.run_search(env, forward, n);
            }
            MetaKey::SearchWord { forward } => {
                let Some(word) = word_at(env.buf.text(), env.buf.cursor()) else {
                    env.bell();
                    env.error("No string under cursor");
                    return;
                };
                match env.search.set_word(&word, forward) {
                    Ok(()) => self.run_search(env, forward, n),
                    Err(e) => env.error(e.to_string()),
                }
            }
            MetaKey::ExPrompt => {
                let text = match count {
                    Some(1) => ".".to_string(),
                    Some(n) => format!(".,.+{}", n - 1),
                    None => String::new(),
                };
                self.state = State::Line(LineEntry {
                    kind: LineKind::Ex,
                    text,
                });
            }
            MetaKey::SetMark(name) => {
                view::set_mark(env, name);
            }
            MetaKey::PageDown => {
                view::page(env, n as isize);
            }
            MetaKey::PageUp => {
                view::page(env, -(n as isize));
            }
            MetaKey::ScrollDown => {
                view::scroll(env, n as isize);
            }
            MetaKey::ScrollUp => {
                view::scroll(env, -(n as isize));
            }
            MetaKey::Place(placement) => {
                view::place(env, placement, count);
            }
            MetaKey::Redraw => env.fx.redraw = true,
            MetaKey::FileInfo => {
                view::file_info(env);
            }
            MetaKey::WriteQuit => {
                env.fx.requests.push(Request::Write {
                    path: None,
                    force: false,
                    only_if_dirty: true,
                });
                env.fx.requests.push(Request::Quit {
                    force: false,
                    status: exit_status(count),
                });
            }
            MetaKey::QuitDiscard => env.fx.requests.push(Request::Quit {
                force: true,
                status: exit_status(count),
            }),
            MetaKey::Toggle(option) => match toggle_option(env, option.name()) {
                Ok(shown) => env.info(shown),
                Err(e) => env.error(e.to_string()),
            },
        }
    }

    /// `count` matches of the current pattern from the cursor.
    fn run_search(&mut self, env: &mut Env, forward: bool, count: usize) {
        let from = env.buf.cursor();
        let mut pos = from;
        let mut wrapped = false;
        for _ in 0..count {
            match env.search.find(env.buf.text(), pos, forward) {
                Ok(Some(hit)) => {
                    wrapped |= hit.wrapped;
                    pos = hit.pos;
                }
                Ok(None) => {
                    let pattern = env.search.last_pattern().unwrap_or_default().to_string();
                    env.bell();
                    env.error(format!("Pattern not found: {pattern}"));
                    return;
                }
                Err(e) => {
                    env.bell();
                    env.error(e.to_string());
                    return;
                }
            }
        }
        mark_jump(env, from);
        let dest = env.buf.text().clamp_normal(pos);
        env.buf.set_cursor_clamped(dest);
        self.mem.sticky_col = None;
        if wrapped {
            env.warn(if forward {
                "search hit BOTTOM, continuing at TOP"
            } else {
                "search hit TOP, continuing at BOTTOM"
            });
        }
    }

    fn line_key(&mut self, env: &mut Env, mut entry: LineEntry, key: &KeyEvent) {
        if key.is_cancel() {
            return;
        }
        if key.code == KeyCode::Enter || key.is_ctrl('m') || key.is_ctrl('j') {
            self.submit_line(env, entry);
            return;
        }
        if key.code == KeyCode::Backspace || key.is_ctrl('h') {
            if entry.text.pop().is_none() {
                return;
            }
        } else if key.is_ctrl('u') {
            entry.text.clear();
        } else if let Some(c) = key.printable() {
            entry.text.push(c);
        } else if key.code == KeyCode::Tab {
            entry.text.push('\t');
        } else {
            env.bell();
        }
        self.state = State::Line(entry);
    }

    fn submit_line(&mut self, env: &mut Env, entry: LineEntry) {
        match entry.kind {
            LineKind::Ex => self.run_ex(env, &entry.text),
            LineKind::Search { forward, count } => {
                if let Err(e) = env.search.set_pattern(&entry.text, forward) {
                    env.bell();
                    env.error(e.to_string());
                    return;
                }
                self.run_search(env, forward, count.unwrap_or(1).max(1));
            }
        }
    }

    fn confirm_key(&mut self, env: &mut Env, mut session: ConfirmSession, key: &KeyEvent) {
        match session.respond(env, key) {
            ConfirmStep::Continue => self.state = State::Confirm(session),
            ConfirmStep::Finished => self.finish_confirm(env, session),
        }
    }

    fn finish_confirm(&mut self, env: &mut Env, session: ConfirmSession) {
        session.finish(env);
        env.buf.end_group();
        settle_cursor(env);
    }
}

fn exit_status(count: Option<usize>) -> i32 {
    count.map_or(0, |n| i32::try_from(n).unwrap_or(i32::MAX))
}

fn settle_cursor(env: &mut Env) {
    let pos = env.buf.text().clamp_normal(env.buf.cursor());
    env.buf.set_cursor_clamped(pos);
}

