//! Editable buffer state: text, cursor, marks, registers, undo history.
//!
//! [`TextBuffer`] is the only way the rest of the editor mutates text. Every
//! mutation is expressed as "replace lines `[a, b)` with these lines", which
//! is recorded with its inverse before the cursor is re-clamped, so undo and
//! redo are exact.

use core_text::{Buffer, Position, motion::first_non_blank};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::ops::Range;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, trace};

pub mod line_ending;
pub mod marks;
pub mod registers;
pub mod undo;
pub mod viewport;

pub use line_ending::{Document, LineEnding, join_document, split_document};
pub use marks::{LAST_INSERT, Marks, PREVIOUS_CONTEXT};
pub use registers::{PasteError, RegisterContent, RegisterKind, RegisterName, Registers};
pub use undo::{LineChange, UNDO_HISTORY_MAX, UndoEngine, UndoGroup};
pub use viewport::{Placement, Viewport};

/// Where a buffer is read from and written back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileTarget {
    Path(PathBuf),
    /// Read from stdin; saved to stdout.
    Stdio,
}

impl FileTarget {
    pub fn display_name(&self) -> String {
        match self {
            FileTarget::Path(p) => p.display().to_string(),
            FileTarget::Stdio => "-".to_string(),
        }
    }
}

/// How the buffer maps back onto its file.
#[derive(Debug, Clone, Default)]
pub struct FileMeta {
    pub target: Option<FileTarget>,
    pub line_ending: LineEnding,
    pub had_trailing_newline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("position {line}:{col} is out of range")]
    OutOfRange { line: usize, col: usize },
    #[error("invalid mark name {0:?}")]
    InvalidMark(char),
    #[error(transparent)]
    Register(#[from] PasteError),
}

impl BufferError {
    /// Out-of-range positions mean a caller computed coordinates wrongly.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, BufferError::OutOfRange { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteSide {
    Before,
    After,
}

pub struct TextBuffer {
    text: Buffer,
    cursor: Position,
    marks: Marks,
    pub registers: Registers,
    undo: UndoEngine,
    dirty: bool,
    saved_hash: Option<u64>,
    pub meta: FileMeta,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new(Buffer::default())
    }
}

impl TextBuffer {
    /// A clean buffer over `text` with no file behind it.
    pub fn new(text: Buffer) -> Self {
        let saved_hash = Some(content_hash(&text));
        Self {
            text,
            cursor: Position::origin(),
            marks: Marks::default(),
            registers: Registers::new(),
            undo: UndoEngine::default(),
            dirty: false,
            saved_hash,
            meta: FileMeta {
                had_trailing_newline: true,
                ..FileMeta::default()
            },
        }
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(Buffer::from_lines(lines))
    }

    pub fn from_document(doc: Document, target: Option<FileTarget>) -> Self {
        let mut buf = Self::from_lines(&doc.lines);
        buf.meta = FileMeta {
            target,
            line_ending: doc.line_ending,
            had_trailing_newline: doc.had_trailing_newline,
        };
        buf
    }

    pub fn with_undo_limit(mut self, limit: usize) -> Self {
        self.undo = UndoEngine::new(limit);
        self
    }

    pub fn text(&self) -> &Buffer {
        &self.text
    }

    pub fn lines(&self) -> Vec<String> {
        self.text.to_lines()
    }

    pub fn line_count(&self) -> usize {
        self.text.line_count()
    }

    pub fn line_at(&self, idx: usize) -> Result<String, BufferError> {
        self.text
            .line(idx)
            .ok_or(BufferError::OutOfRange { line: idx, col: 0 })
    }

    pub fn line_len(&self, idx: usize) -> usize {
        self.text.line_len(idx)
    }

    /// File text as it would be written: original line ending, and a final
    /// terminator when the source had one (new buffers always get one).
    pub fn file_text(&self) -> String {
        join_document(&self.lines(), self.meta.line_ending, self.meta.had_trailing_newline)
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn set_cursor(&mut self, pos: Position) -> Result<(), BufferError> {
        self.check_pos(pos)?;
        self.cursor = pos;
        Ok(())
    }

    pub fn set_cursor_clamped(&mut self, pos: Position) {
        self.cursor = self.text.clamp(pos);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.saved_hash = Some(content_hash(&self.text));
        self.dirty = false;
    }

    /// Dirty until the next save regardless of undo (stdin-fed buffers).
    pub fn mark_dirty(&mut self) {
        self.saved_hash = None;
        self.dirty = true;
    }

    pub fn set_mark(&mut self, name: char, pos: Position) -> Result<(), BufferError> {
        self.check_pos(pos)?;
        if self.marks.set(name, pos) {
            Ok(())
        } else {
            Err(BufferError::InvalidMark(name))
        }
    }

    /// Mark position clamped into the current text.
    pub fn get_mark(&self, name: char) -> Option<Position> {
        self.marks.get(name).map(|p| self.text.clamp(p))
    }

    fn check_line(&self, line: usize) -> Result<(), BufferError> {
        if line < self.text.line_count() {
            Ok(())
        } else {
            Err(BufferError::OutOfRange { line, col: 0 })
        }
    }

    fn check_pos(&self, pos: Position) -> Result<(), BufferError> {
        self.check_line(pos.line)?;
        if pos.col > self.text.line_len(pos.line) {
            return Err(BufferError::OutOfRange {
                line: pos.line,
                col: pos.col,
            });
        }
        Ok(())
    }

    /// Replace lines `[start, end)` with `after`, recording the inverse.
    fn apply(&mut self, start: usize, end: usize, mut after: Vec<String>) -> Vec<String> {
        if start == 0 && end >= self.text.line_count() && after.is_empty() {
            after.push(String::new());
        }
        let before = self.text.replace_lines(start..end, &after);
        if before != after {
            trace!(target: "state.buffer", start, removed = before.len(), inserted = after.len(), "apply");
            self.undo.record(
                LineChange {
                    start,
                    before: before.clone(),
                    after,
                },
                self.cursor,
            );
            self.dirty = true;
        }
        self.cursor = self.text.clamp(self.cursor);
        before
    }

    /// Insert `text` (may contain `\n`) at `pos`; returns the position just
    /// past the inserted text.
    pub fn insert_text(&mut self, pos: Position, text: &str) -> Result<Position, BufferError> {
        self.replace_range(pos, pos, text)
    }

    /// Remove `[start, end)` charwise, or whole lines `start.line..=end.line`.
    /// Returns what was removed for the caller to store in a register.
    pub fn delete_range(
        &mut self,
        start: Position,
        end: Position,
        linewise: bool,
    ) -> Result<RegisterContent, BufferError> {
        let (start, end) = ordered(start, end);
        self.check_pos_or_line(start, linewise)?;
        self.check_pos_or_line(end, linewise)?;
        if linewise {
            let removed = self.apply(start.line, end.line + 1, Vec::new());
            return Ok(RegisterContent::linewise(&removed));
        }
        let removed = self.text.slice(start, end);
        if !removed.is_empty() {
            self.replace_range(start, end, "")?;
        }
        Ok(RegisterContent::charwise(removed))
    }

    fn check_pos_or_line(&self, pos: Position, linewise: bool) -> Result<(), BufferError> {
        if linewise {
            self.check_line(pos.line)
        } else {
            self.check_pos(pos)
        }
    }

    /// Replace `[start, end)` with `text` as one change; returns the position
    /// just past the inserted text.
    pub fn replace_range(&mut self, start: Position, end: Position, text: &str) -> Result<Position, BufferError> {
        let (start, end) = ordered(start, end);
        self.check_pos(start)?;
        self.check_pos(end)?;
        let first = self.text.line(start.line).unwrap_or_default();
        let last = self.text.line(end.line).unwrap_or_default();
        let combined = format!(
            "{}{}{}",
            &first[..byte_of(&first, start.col)],
            text,
            &last[byte_of(&last, end.col)..]
        );
        let after: Vec<String> = combined.split('\n').map(str::to_string).collect();
        let inserted_rows = text.split('\n').count();
        let tail_cols = text.rsplit('\n').next().unwrap_or("").chars().count();
        let end_pos = if inserted_rows == 1 {
            Position::new(start.line, start.col + tail_cols)
        } else {
            Position::new(start.line + inserted_rows - 1, tail_cols)
        };
        self.apply(start.line, end.line + 1, after);
        Ok(end_pos)
    }

    /// Replace whole lines; used by ex commands that rewrite line ranges.
    pub fn replace_lines(&mut self, range: Range<usize>, lines: Vec<String>) -> Result<Vec<String>, BufferError> {
        if range.start > range.end || range.end > self.text.line_count() {
            return Err(BufferError::OutOfRange {
                line: range.end,
                col: 0,
            });
        }
        Ok(self.apply(range.start, range.end, lines))
    }

    /// Copy a span into a register without changing the text.
    pub fn yank(
        &mut self,
        start: Position,
        end: Position,
        linewise: bool,
        register: Option<char>,
    ) -> Result<RegisterContent, BufferError> {
        let (start, end) = ordered(start, end);
        self.check_pos_or_line(start, linewise)?;
        self.check_pos_or_line(end, linewise)?;
        let content = if linewise {
            let lines: Vec<String> = (start.line..=end.line)
                .filter_map(|l| self.text.line(l))
                .collect();
            RegisterContent::linewise(&lines)
        } else {
            RegisterContent::charwise(self.text.slice(start, end))
        };
        self.registers.write_yank(content.clone(), register)?;
        Ok(content)
    }

    /// Put register contents `count` times before or after the cursor and
    /// move the cursor the way `p`/`P` do.
    pub fn paste(&mut self, register: Option<char>, side: PasteSide, count: usize) -> Result<Position, BufferError> {
        let content = self.registers.read(register)?;
        let count = count.max(1);
        let cur = self.cursor;
        if content.is_linewise() {
            let lines: Vec<String> = std::iter::repeat_n(content.lines(), count).flatten().collect();
            let at = match side {
                PasteSide::After => cur.line + 1,
                PasteSide::Before => cur.line,
            };
            self.apply(at, at, lines);
            self.cursor = Position::new(at, first_non_blank(&self.text, at));
            return Ok(self.cursor);
        }
        let text = content.text.repeat(count);
        let at = match side {
            PasteSide::Before => cur,
            PasteSide::After => Position::new(cur.line, (cur.col + 1).min(self.text.line_len(cur.line))),
        };
        let end = self.replace_range(at, at, &text)?;
        self.cursor = if text.contains('\n') {
            at
        } else {
            Position::new(end.line, end.col.saturating_sub(1))
        };
        Ok(self.cursor)
    }

    /// Join `count` lines (at least two) starting at `line`. With `spaces`,
    /// leading blanks of each joined line collapse to one separating space.
    /// Returns the join column, or `None` when there is no following line.
    pub fn join_lines(&mut self, line: usize, count: usize, spaces: bool) -> Result<Option<Position>, BufferError> {
        self.check_line(line)?;
        let last = line.saturating_add(count.max(2) - 1).min(self.text.last_line());
        if last == line {
            return Ok(None);
        }
        let mut joined = self.text.line(line).unwrap_or_default();
        let mut col = 0;
        for l in line + 1..=last {
            let next = self.text.line(l).unwrap_or_default();
            let piece = if spaces { next.trim_start() } else { next.as_str() };
            col = joined.chars().count();
            let needs_space = spaces
                && !piece.is_empty()
                && !joined.is_empty()
                && !joined.ends_with([' ', '\t'])
                && !piece.starts_with(')');
            if needs_space {
                joined.push(' ');
            }
            joined.push_str(piece);
        }
        self.apply(line, last + 1, vec![joined]);
        self.cursor = self.text.clamp(Position::new(line, col));
        Ok(Some(self.cursor))
    }

    /// Group subsequent changes into one undo step until `end_group`.
    pub fn begin_group(&mut self) {
        self.undo.begin_group(self.cursor);
    }

    pub fn end_group(&mut self) {
        self.undo.end_group();
    }

    pub fn end_all_groups(&mut self) {
        self.undo.end_all_groups();
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.undo.redo_depth()
    }

    pub fn undo(&mut self) -> bool {
        let Some(group) = self.undo.take_undo() else {
            return false;
        };
        for ch in group.changes.iter().rev() {
            self.text
                .replace_lines(ch.start..ch.start + ch.after.len(), &ch.before);
        }
        self.cursor = self.text.clamp(group.cursor);
        debug!(target: "state.undo", changes = group.changes.len(), "undo");
        self.undo.push_redo(group);
        self.refresh_dirty();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(group) = self.undo.take_redo() else {
            return false;
        };
        for ch in &group.changes {
            self.text
                .replace_lines(ch.start..ch.start + ch.before.len(), &ch.after);
        }
        self.cursor = self.text.clamp(group.cursor);
        debug!(target: "state.undo", changes = group.changes.len(), "redo");
        self.undo.push_undo_from_redo(group);
        self.refresh_dirty();
        true
    }

    fn refresh_dirty(&mut self) {
        self.dirty = self.saved_hash != Some(content_hash(&self.text));
    }
}

fn ordered(a: Position, b: Position) -> (Position, Position) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Byte offset of char column `col` in `s` (clamped to the end).
pub fn byte_of(s: &str, col: usize) -> usize {
    s.char_indices().nth(col).map_or(s.len(), |(b, _)| b)
}

fn content_hash(buf: &Buffer) -> u64 {
    let mut h = DefaultHasher::new();
    for line in buf.lines() {
        line.hash(&mut h);
    }
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tb(lines: &[&str]) -> TextBuffer {
        TextBuffer::from_lines(lines.iter().copied())
    }

    fn p(line: usize, col: usize) -> Position {
        Position::new(line, col)
    }

    #[test]
    fn insert_multiline_text() {
        let mut b = tb(&["abcd"]);
        let end = b.insert_text(p(0, 2), "X\nYZ").unwrap();
        assert_eq!(b.lines(), vec!["abX", "YZcd"]);
        assert_eq!(end, p(1, 2));
        assert!(b.is_dirty());
    }

    #[test]
    fn delete_charwise_across_lines() {
        let mut b = tb(&["abc", "def"]);
        let removed = b.delete_range(p(1, 1), p(0, 1), false).unwrap();
        assert_eq!(removed.text, "bc\nd");
        assert_eq!(b.lines(), vec!["aef"]);
    }

    #[test]
    fn delete_every_line_leaves_one_empty_line() {
        let mut b = tb(&["only"]);
        let removed = b.delete_range(p(0, 0), p(0, 0), true).unwrap();
        assert!(removed.is_linewise());
        assert_eq!(b.lines(), vec![""]);
        assert_eq!(b.cursor(), p(0, 0));
        assert!(b.undo());
        assert_eq!(b.lines(), vec!["only"]);
    }

    #[test]
    fn out_of_range_is_reported() {
        let mut b = tb(&["ab"]);
        assert_eq!(
            b.insert_text(p(3, 0), "x"),
            Err(BufferError::OutOfRange { line: 3, col: 0 })
        );
        assert!(b.set_cursor(p(0, 3)).is_err());
        assert!(b.set_cursor(p(0, 2)).is_ok());
        assert!(b.line_at(1).unwrap_err().is_contract_violation());
    }

    #[test]
    fn undo_redo_restore_text_and_cursor() {
        let mut b = tb(&["one", "two"]);
        b.set_cursor(p(1, 1)).unwrap();
        b.delete_range(p(1, 0), p(1, 3), false).unwrap();
        assert_eq!(b.lines(), vec!["one", ""]);
        assert!(b.undo());
        assert_eq!(b.lines(), vec!["one", "two"]);
        assert_eq!(b.cursor(), p(1, 1));
        assert!(!b.is_dirty());
        assert!(b.redo());
        assert_eq!(b.lines(), vec!["one", ""]);
        assert!(!b.redo());
    }

    #[test]
    fn grouped_changes_undo_together() {
        let mut b = tb(&["abc"]);
        b.begin_group();
        b.insert_text(p(0, 0), "x").unwrap();
        b.insert_text(p(0, 1), "y").unwrap();
        b.end_group();
        assert_eq!(b.lines(), vec!["xyabc"]);
        assert_eq!(b.undo_depth(), 1);
        b.undo();
        assert_eq!(b.lines(), vec!["abc"]);
    }

    #[test]
    fn noop_edit_records_nothing() {
        let mut b = tb(&["abc"]);
        b.delete_range(p(0, 1), p(0, 1), false).unwrap();
        b.insert_text(p(0, 0), "").unwrap();
        assert_eq!(b.undo_depth(), 0);
        assert!(!b.is_dirty());
    }

    #[test]
    fn paste_charwise_after_and_before() {
        let mut b = tb(&["abc"]);
        b.registers
            .write_yank(RegisterContent::charwise("XY"), None)
            .unwrap();
        let at = b.paste(None, PasteSide::After, 1).unwrap();
        assert_eq!(b.lines(), vec!["aXYbc"]);
        assert_eq!(at, p(0, 2));
        b.set_cursor(p(0, 0)).unwrap();
        b.paste(None, PasteSide::Before, 2).unwrap();
        assert_eq!(b.lines(), vec!["XYXYaXYbc"]);
    }

    #[test]
    fn paste_linewise_below_and_above() {
        let mut b = tb(&["a", "b"]);
        b.yank(p(1, 0), p(1, 0), true, Some('q')).unwrap();
        b.set_cursor(p(0, 0)).unwrap();
        b.paste(Some('q'), PasteSide::After, 1).unwrap();
        assert_eq!(b.lines(), vec!["a", "b", "b"]);
        assert_eq!(b.cursor(), p(1, 0));
        b.paste(Some('q'), PasteSide::Before, 1).unwrap();
        assert_eq!(b.lines(), vec!["a", "b", "b", "b"]);
    }

    #[test]
    fn paste_from_empty_register_fails() {
        let mut b = tb(&["a"]);
        let err = b.paste(Some('z'), PasteSide::After, 1).unwrap_err();
        assert_eq!(err, BufferError::Register(PasteError::Empty('z')));
        assert_eq!(err.to_string(), "Nothing in register z");
    }

    #[test]
    fn join_collapses_leading_blanks() {
        let mut b = tb(&["foo", "   bar", "", "baz"]);
        let at = b.join_lines(0, 3, true).unwrap();
        assert_eq!(b.lines(), vec!["foo bar", "baz"]);
        assert_eq!(at, Some(p(0, 7)));
        assert_eq!(b.join_lines(1, 2, true).unwrap(), None);
    }

    #[test]
    fn join_count_saturates_at_last_line() {
        let mut b = tb(&["a", "b", "c"]);
        b.join_lines(1, usize::MAX, false).unwrap();
        assert_eq!(b.lines(), vec!["a", "bc"]);
    }

    #[test]
    fn marks_are_clamped_on_read() {
        let mut b = tb(&["abc", "def", "ghi"]);
        b.set_mark('a', p(2, 2)).unwrap();
        b.delete_range(p(1, 0), p(2, 0), true).unwrap();
        assert_eq!(b.get_mark('a'), Some(p(0, 2)));
        assert_eq!(b.set_mark('!', p(0, 0)), Err(BufferError::InvalidMark('!')));
    }

    #[test]
    fn stdin_buffers_stay_dirty_until_saved() {
        let mut b = tb(&["x"]);
        b.mark_dirty();
        assert!(b.is_dirty());
        b.insert_text(p(0, 0), "y").unwrap();
        b.undo();
        assert!(b.is_dirty());
        b.mark_saved();
        assert!(!b.is_dirty());
    }

    #[test]
    fn file_text_keeps_line_ending() {
        let doc = split_document("a\r\nb\r\n");
        let b = TextBuffer::from_document(doc, Some(FileTarget::Path("f".into())));
        assert_eq!(b.file_text(), "a\r\nb\r\n");
    }
}
