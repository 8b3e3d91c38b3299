//! Insert and Replace sessions.
//!
//! Entering positions the cursor (and opens a line for `o`/`O`), then every
//! key typed goes through [`type_key`], which records it so a count or `.`
//! can replay the same text. [`finish`] applies the count and steps the
//! cursor back onto the text the way `Esc` does.

use super::{DispatchResult, Env, InsertStart};
use crate::InsertEntry;
use core_events::{KeyCode, KeyEvent};
use core_state::{BufferError, LAST_INSERT};
use core_text::Position;
use tracing::{debug, trace};

#[derive(Debug)]
pub(crate) struct InsertSession {
    pub start: InsertStart,
    /// Keys typed so far, replayed by counts and by `.`.
    pub typed: Vec<KeyEvent>,
    /// Replace mode: what each overwrite covered (`None` = appended).
    replaced: Vec<Option<char>>,
    literal_next: bool,
}

impl InsertSession {
    pub fn new(start: InsertStart) -> Self {
        Self {
            start,
            typed: Vec::new(),
            replaced: Vec::new(),
            literal_next: false,
        }
    }

    /// `⌃V` was typed and the next key goes in as-is.
    pub fn awaiting_literal(&self) -> bool {
        self.literal_next
    }
}

/// What an Insert-mode key does to the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertKey {
    Char(char),
    Newline,
    Backspace,
    Literal,
}

fn classify(key: &KeyEvent) -> Option<InsertKey> {
    if key.is_ctrl('v') {
        return Some(InsertKey::Literal);
    }
    if key.is_ctrl('h') {
        return Some(InsertKey::Backspace);
    }
    if key.is_ctrl('j') || key.is_ctrl('m') {
        return Some(InsertKey::Newline);
    }
    if key.is_ctrl('i') {
        return Some(InsertKey::Char('\t'));
    }
    match key.code {
        KeyCode::Enter => Some(InsertKey::Newline),
        KeyCode::Backspace => Some(InsertKey::Backspace),
        KeyCode::Tab => Some(InsertKey::Char('\t')),
        _ => key.printable().map(InsertKey::Char),
    }
}

pub(crate) fn enter(env: &mut Env, entry: InsertEntry, count: usize) -> DispatchResult {
    let cursor = env.buf.cursor();
    let len = env.buf.line_len(cursor.line);
    let pos = match entry {
        InsertEntry::Insert | InsertEntry::Replace => Ok(cursor),
        InsertEntry::Append => Ok(Position::new(cursor.line, (cursor.col + 1).min(len))),
        InsertEntry::InsertAtFirstNonBlank => {
            let text = env.buf.text().line(cursor.line).unwrap_or_default();
            let col = text.chars().position(|c| !c.is_whitespace()).unwrap_or(len);
            Ok(Position::new(cursor.line, col))
        }
        InsertEntry::AppendAtEnd => Ok(Position::new(cursor.line, len)),
        InsertEntry::OpenBelow => open_line(env, true),
        InsertEntry::OpenAbove => open_line(env, false),
    };
    let pos = match pos {
        Ok(p) => p,
        Err(e) => {
            env.buffer_error(e);
            return DispatchResult::Failed;
        }
    };
    env.buf.set_cursor_clamped(pos);
    if let Err(e) = env.buf.set_mark(LAST_INSERT, env.buf.cursor()) {
        env.buffer_error(e);
    }
    debug!(target: "actions.dispatch", ?entry, count, "insert_enter");
    DispatchResult::Insert(InsertStart {
        replace: entry == InsertEntry::Replace,
        count: count.max(1),
        open_line: matches!(entry, InsertEntry::OpenBelow | InsertEntry::OpenAbove),
    })
}

fn open_line(env: &mut Env, below: bool) -> Result<Position, BufferError> {
    let line = env.buf.cursor().line;
    if below {
        let len = env.buf.line_len(line);
        env.buf.insert_text(Position::new(line, len), "\n")
    } else {
        env.buf.insert_text(Position::new(line, 0), "\n")?;
        Ok(Position::new(line, 0))
    }
}

/// Apply and record one Insert/Replace key. Keys with no meaning here ring
/// the bell and are not recorded.
pub(crate) fn type_key(env: &mut Env, s: &mut InsertSession, key: &KeyEvent) {
    if apply_key(env, s, key) {
        s.typed.push(*key);
    }
}

fn apply_key(env: &mut Env, s: &mut InsertSession, key: &KeyEvent) -> bool {
    if s.literal_next {
        s.literal_next = false;
        return match key.literal_char() {
            Some(c) => put_char(env, s, c),
            None => {
                env.bell();
                false
            }
        };
    }
    match classify(key) {
        Some(InsertKey::Literal) => {
            s.literal_next = true;
            true
        }
        Some(InsertKey::Char(c)) => put_char(env, s, c),
        Some(InsertKey::Newline) => newline(env, s),
        Some(InsertKey::Backspace) => backspace(env, s),
        None => {
            env.bell();
            false
        }
    }
}

fn put_char(env: &mut Env, s: &mut InsertSession, c: char) -> bool {
    let cursor = env.buf.cursor();
    let len = env.buf.line_len(cursor.line);
    let mut buf = [0u8; 4];
    let text: &str = c.encode_utf8(&mut buf);
    let result = if s.start.replace && cursor.col < len {
        let old = env.buf.text().char_at(cursor);
        s.replaced.push(old);
        env.buf
            .replace_range(cursor, Position::new(cursor.line, cursor.col + 1), text)
    } else {
        if s.start.replace {
            s.replaced.push(None);
        }
        env.buf.insert_text(cursor, text)
    };
    settle(env, result)
}

fn newline(env: &mut Env, s: &mut InsertSession) -> bool {
    // Overwritten chars cannot be restored across a line break.
    s.replaced.clear();
    let cursor = env.buf.cursor();
    let result = env.buf.insert_text(cursor, "\n");
    settle(env, result)
}

fn backspace(env: &mut Env, s: &mut InsertSession) -> bool {
    let cursor = env.buf.cursor();
    if cursor.col == 0 {
        env.bell();
        return false;
    }
    let prev = Position::new(cursor.line, cursor.col - 1);
    let result = if s.start.replace {
        match s.replaced.pop() {
            Some(Some(old)) => env.buf.replace_range(prev, cursor, &old.to_string()).map(|_| prev),
            Some(None) => env.buf.delete_range(prev, cursor, false).map(|_| prev),
            None => Ok(prev),
        }
    } else {
        env.buf.delete_range(prev, cursor, false).map(|_| prev)
    };
    settle(env, result)
}

fn settle(env: &mut Env, result: Result<Position, BufferError>) -> bool {
    match result {
        Ok(pos) => {
            env.buf.set_cursor_clamped(pos);
            true
        }
        Err(e) => {
            env.buffer_error(e);
            false
        }
    }
}

/// Run recorded keys through a fresh session.
fn replay(env: &mut Env, start: InsertStart, keys: &[KeyEvent]) {
    let mut scratch = InsertSession::new(start);
    for key in keys {
        apply_key(env, &mut scratch, key);
    }
}

/// `Esc`: repeat the text `count - 1` more times, then step left.
pub(crate) fn finish(env: &mut Env, s: &InsertSession) {
    for _ in 1..s.start.count {
        if s.start.open_line {
            match open_line(env, true) {
                Ok(pos) => env.buf.set_cursor_clamped(pos),
                Err(e) => {
                    env.buffer_error(e);
                    break;
                }
            }
        }
        replay(env, s.start, &s.typed);
    }
    let c = env.buf.cursor();
    let pos = env.buf.text().clamp_normal(Position::new(c.line, c.col.saturating_sub(1)));
    env.buf.set_cursor_clamped(pos);
    trace!(target: "actions.dispatch", keys = s.typed.len(), count = s.start.count, "insert_finish");
}

/// `.` on an insert: type the recorded keys once, then finish as `Esc` would.
pub(crate) fn replay_session(env: &mut Env, start: InsertStart, keys: &[KeyEvent]) {
    replay(env, start, keys);
    let mut s = InsertSession::new(start);
    s.typed = keys.to_vec();
    finish(env, &s);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Settings;
    use crate::search::SearchEngine;
    use core_events::parse_keys;
    use core_state::{TextBuffer, Viewport};

    fn run(lines: &[&str], entry: InsertEntry, count: usize, keys: &str) -> TextBuffer {
        let mut buf = TextBuffer::from_lines(lines);
        let mut search = SearchEngine::default();
        let mut viewport = Viewport::default();
        let mut settings = Settings::default();
        let mut env = Env::new(&mut buf, &mut search, &mut viewport, &mut settings);
        let DispatchResult::Insert(start) = enter(&mut env, entry, count) else {
            panic!("insert did not start");
        };
        let mut s = InsertSession::new(start);
        for key in parse_keys(keys).unwrap() {
            type_key(&mut env, &mut s, &key);
        }
        finish(&mut env, &s);
        buf
    }

    #[test]
    fn count_repeats_typed_text() {
        let buf = run(&["ab"], InsertEntry::Insert, 3, "x");
        assert_eq!(buf.lines(), vec!["xxxab"]);
        assert_eq!(buf.cursor(), Position::new(0, 2));
    }

    #[test]
    fn open_below_with_count_opens_each_line() {
        let buf = run(&["a"], InsertEntry::OpenBelow, 2, "z");
        assert_eq!(buf.lines(), vec!["a", "z", "z"]);
    }

    #[test]
    fn replace_backspace_restores() {
        let buf = run(&["abcd"], InsertEntry::Replace, 1, "XYZ<BS><BS>");
        assert_eq!(buf.lines(), vec!["Xbcd"]);
    }

    #[test]
    fn replace_past_end_appends() {
        let buf = run(&["ab"], InsertEntry::Replace, 1, "wxyz");
        assert_eq!(buf.lines(), vec!["wxyz"]);
    }

    #[test]
    fn literal_next_inserts_control_char() {
        let buf = run(&[""], InsertEntry::Insert, 1, "<C-v><C-a>");
        assert_eq!(buf.lines(), vec!["\u{1}"]);
    }

    #[test]
    fn enter_splits_line() {
        let buf = run(&["abcd"], InsertEntry::Append, 1, "<CR>");
        assert_eq!(buf.lines(), vec!["a", "bcd"]);
        assert_eq!(buf.cursor(), Position::new(1, 0));
    }
}
