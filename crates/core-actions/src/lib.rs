//! Key interpretation and command execution.
//!
//! * `key_translator` turns Normal-mode keys into [`Command`] values.
//! * `interpreter` owns the mode machine and routes keys by mode.
//! * `dispatcher` applies commands to a [`core_state::TextBuffer`].
//! * `search` and `ex` implement `/ ? n N * #` and the `:` command line.
//! * `session` ties buffers, files and the interpreter together.

pub mod dispatcher;
pub mod ex;
pub mod interpreter;
pub mod io_ops;
pub mod key_translator;
pub mod search;
pub mod session;
mod span_resolver;

pub use dispatcher::{Effects, Env, Settings};
pub use ex::ExError;
pub use interpreter::{Interpreter, Mode};
pub use io_ops::{FileError, FileStore, FsStore, MemoryStore};
pub use key_translator::{KeyClass, KeyTranslator, Translation};
pub use search::{SearchEngine, SearchError, SearchHit};
pub use session::Session;

use core_state::Placement;
use core_text::motion::Motion;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Delete,
    Change,
    Yank,
    ShiftLeft,
    ShiftRight,
}

impl OperatorKind {
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'd' => Self::Delete,
            'c' => Self::Change,
            'y' => Self::Yank,
            '<' => Self::ShiftLeft,
            '>' => Self::ShiftRight,
            _ => return None,
        })
    }

    pub fn key(self) -> char {
        match self {
            Self::Delete => 'd',
            Self::Change => 'c',
            Self::Yank => 'y',
            Self::ShiftLeft => '<',
            Self::ShiftRight => '>',
        }
    }
}

/// A motion as typed: either a buffer-only motion or a mark jump, which
/// needs the buffer's mark table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionSpec {
    Basic(Motion),
    /// `'x` (linewise) or `` `x `` (exact); `name` is `None` until typed.
    Mark { name: Option<char>, exact: bool },
}

/// Single-key edits that do not go through operator-pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    DeleteUnder,
    DeleteBefore,
    DeleteToEnd,
    ChangeToEnd,
    SubstituteChar,
    SubstituteLine,
    Join,
    PasteAfter,
    PasteBefore,
    ToggleCase,
    ReplaceChar(Option<char>),
}

/// How a key enters Insert or Replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertEntry {
    Insert,
    Append,
    InsertAtFirstNonBlank,
    AppendAtEnd,
    OpenBelow,
    OpenAbove,
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKey {
    Undo,
    Redo,
    RepeatChange,
    SearchPrompt { forward: bool },
    SearchNext,
    SearchPrevious,
    SearchWord { forward: bool },
    ExPrompt,
    SetMark(Option<char>),
    PageDown,
    PageUp,
    ScrollDown,
    ScrollUp,
    Place(Placement),
    Redraw,
    FileInfo,
    WriteQuit,
    QuitDiscard,
    /// `\n`, `\i`, `\F`: flip an option without typing `:set`.
    Toggle(ToggleOption),
}

/// Boolean options with a `\` chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOption {
    Number,
    IgnoreCase,
    Regex,
}

impl ToggleOption {
    /// The option's `:set` name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::IgnoreCase => "ignorecase",
            Self::Regex => "regex",
        }
    }
}

/// A complete Normal-mode command. Counts are `None` when not typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move {
        motion: MotionSpec,
        count: Option<usize>,
    },
    Operate {
        op: OperatorKind,
        motion: MotionSpec,
        count: Option<usize>,
        register: Option<char>,
    },
    /// Doubled operator (`dd`, `cc`, `yy`, `<<`, `>>`, and `Y`, `S`).
    OperateLine {
        op: OperatorKind,
        count: usize,
        register: Option<char>,
    },
    Edit {
        kind: EditKind,
        count: usize,
        register: Option<char>,
    },
    Enter {
        entry: InsertEntry,
        count: usize,
    },
    Meta {
        key: MetaKey,
        count: Option<usize>,
    },
}

impl Command {
    /// Whether `.` should replay this command.
    pub fn is_repeatable(&self) -> bool {
        match self {
            Command::Operate { op, .. } | Command::OperateLine { op, .. } => *op != OperatorKind::Yank,
            Command::Edit { .. } | Command::Enter { .. } => true,
            Command::Move { .. } | Command::Meta { .. } => false,
        }
    }

    /// The same command with the count replaced, as `.` does with a new count.
    pub fn with_count(self, n: usize) -> Self {
        match self {
            Command::Move { motion, .. } => Command::Move {
                motion,
                count: Some(n),
            },
            Command::Operate {
                op, motion, register, ..
            } => Command::Operate {
                op,
                motion,
                count: Some(n),
                register,
            },
            Command::OperateLine { op, register, .. } => Command::OperateLine { op, count: n, register },
            Command::Edit { kind, register, .. } => Command::Edit { kind, count: n, register },
            Command::Enter { entry, .. } => Command::Enter { entry, count: n },
            Command::Meta { key, .. } => Command::Meta { key, count: Some(n) },
        }
    }
}

/// Work only the session can do: files and the session lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Write {
        path: Option<PathBuf>,
        force: bool,
        /// `:x`/`ZZ` skip the write when nothing changed.
        only_if_dirty: bool,
    },
    Quit {
        force: bool,
        status: i32,
    },
    Next {
        force: bool,
    },
    Edit {
        path: Option<PathBuf>,
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Warning,
    Error,
}

/// One line of feedback for the status row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: MessageKind,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: MessageKind::Info,
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: MessageKind::Warning,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: MessageKind::Error,
        }
    }
}
