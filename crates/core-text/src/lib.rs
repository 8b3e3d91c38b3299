//! Rope-based text buffer abstraction.
//!
//! Lines are stored joined by `\n` without a final terminator, so the rope
//! always reports at least one line. Columns count Unicode scalar values.

use ropey::Rope;
use std::ops::Range;

pub mod motion;
pub mod width;

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone, Debug, Default)]
pub struct Buffer {
    rope: Rope,
}

/// A position inside a buffer expressed as (line index, char offset within that line).
///
/// Ordering is document order: line first, then column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
    pub const fn origin() -> Self {
        Self { line: 0, col: 0 }
    }
    pub fn clamp_to<F>(&mut self, line_count: usize, mut line_len_fn: F)
    where
        F: FnMut(usize) -> usize,
    {
        if line_count == 0 {
            self.line = 0;
            self.col = 0;
            return;
        }
        if self.line >= line_count {
            self.line = line_count - 1;
        }
        let max_len = line_len_fn(self.line);
        if self.col > max_len {
            self.col = max_len;
        }
    }
}

impl Buffer {
    /// Build a buffer from text whose lines are separated by `\n`. A trailing
    /// newline produces a final empty line; callers strip it first when it is
    /// a file terminator.
    pub fn from_text(content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
        }
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        for (i, line) in lines.into_iter().enumerate() {
            if i > 0 {
                text.push('\n');
            }
            text.push_str(line.as_ref());
        }
        Self::from_text(&text)
    }

    /// Total number of lines in the buffer (never zero).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Return the requested line as an owned `String`, without its newline.
    pub fn line(&self, idx: usize) -> Option<String> {
        if idx >= self.rope.len_lines() {
            return None;
        }
        let mut s = self.rope.line(idx).to_string();
        if s.ends_with('\n') {
            s.pop();
        }
        Some(s)
    }

    /// Char length of a line (excluding the newline); 0 when out of range.
    pub fn line_len(&self, idx: usize) -> usize {
        if idx >= self.rope.len_lines() {
            return 0;
        }
        let line = self.rope.line(idx);
        let len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// Char at a position, `None` at or past the end of the line.
    pub fn char_at(&self, pos: Position) -> Option<char> {
        if pos.col >= self.line_len(pos.line) {
            return None;
        }
        Some(self.rope.char(self.rope.line_to_char(pos.line) + pos.col))
    }

    pub fn is_line_empty(&self, idx: usize) -> bool {
        self.line_len(idx) == 0
    }

    pub fn last_line(&self) -> usize {
        self.line_count() - 1
    }

    /// Position one past the last char of the buffer.
    pub fn end(&self) -> Position {
        let last = self.last_line();
        Position::new(last, self.line_len(last))
    }

    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.line_count()).filter_map(move |i| self.line(i))
    }

    pub fn to_lines(&self) -> Vec<String> {
        self.lines().collect()
    }

    pub fn clamp(&self, mut pos: Position) -> Position {
        pos.clamp_to(self.line_count(), |l| self.line_len(l));
        pos
    }

    /// Clamp a position to Normal-mode rules: the cursor rests on a character,
    /// so the column is at most `len - 1` (0 on an empty line).
    pub fn clamp_normal(&self, pos: Position) -> Position {
        let mut pos = self.clamp(pos);
        pos.col = pos.col.min(self.line_len(pos.line).saturating_sub(1));
        pos
    }

    fn char_index(&self, pos: Position) -> usize {
        let pos = self.clamp(pos);
        self.rope.line_to_char(pos.line) + pos.col
    }

    /// Text in `[start, end)`; crossing lines yields embedded `\n`.
    pub fn slice(&self, start: Position, end: Position) -> String {
        let (s, e) = (self.char_index(start), self.char_index(end));
        if s >= e {
            return String::new();
        }
        self.rope.slice(s..e).to_string()
    }

    /// Replace lines `range` with `lines`, returning the removed lines.
    ///
    /// An empty `range` inserts before `range.start` (or appends when it equals
    /// `line_count`). Removing every line without replacement leaves the single
    /// empty line the rope always keeps.
    pub fn replace_lines(&mut self, range: Range<usize>, lines: &[String]) -> Vec<String> {
        let total = self.line_count();
        let end = range.end.min(total);
        let start = range.start.min(end);
        let removed: Vec<String> = (start..end).filter_map(|i| self.line(i)).collect();
        if start == end && lines.is_empty() {
            return removed;
        }
        let mut text = lines.join("\n");
        let (from, to) = if end < total {
            if !lines.is_empty() {
                text.push('\n');
            }
            (self.rope.line_to_char(start), self.rope.line_to_char(end))
        } else if start == end {
            text.insert(0, '\n');
            (self.rope.len_chars(), self.rope.len_chars())
        } else if lines.is_empty() && start > 0 {
            // Drop the newline that terminated the line before the range.
            (self.rope.line_to_char(start) - 1, self.rope.len_chars())
        } else {
            (self.rope.line_to_char(start), self.rope.len_chars())
        };
        self.rope.remove(from..to);
        self.rope.insert(from, &text);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(b: &Buffer) -> Vec<String> {
        b.to_lines()
    }

    #[test]
    fn create_buffer_and_read_line() {
        let b = Buffer::from_text("hello\nworld");
        assert_eq!(b.line_count(), 2);
        assert_eq!(b.line(0).unwrap(), "hello");
        assert_eq!(b.line(1).unwrap(), "world");
        assert_eq!(b.line(2), None);
    }

    #[test]
    fn empty_buffer_has_one_line() {
        let b = Buffer::from_text("");
        assert_eq!(b.line_count(), 1);
        assert_eq!(b.line_len(0), 0);
        assert_eq!(b.end(), Position::origin());
    }

    #[test]
    fn line_len_counts_chars() {
        let b = Buffer::from_lines(["añb", "漢字"]);
        assert_eq!(b.line_len(0), 3);
        assert_eq!(b.line_len(1), 2);
        assert_eq!(b.char_at(Position::new(1, 1)), Some('字'));
        assert_eq!(b.char_at(Position::new(1, 2)), None);
    }

    #[test]
    fn slice_crosses_lines() {
        let b = Buffer::from_lines(["abc", "def"]);
        assert_eq!(b.slice(Position::new(0, 1), Position::new(1, 2)), "bc\nde");
        assert_eq!(b.slice(Position::new(1, 2), Position::new(0, 1)), "");
    }

    #[test]
    fn replace_middle_lines() {
        let mut b = Buffer::from_lines(["a", "b", "c", "d"]);
        let removed = b.replace_lines(1..3, &["x".to_string()]);
        assert_eq!(removed, vec!["b", "c"]);
        assert_eq!(lines(&b), vec!["a", "x", "d"]);
    }

    #[test]
    fn remove_trailing_lines() {
        let mut b = Buffer::from_lines(["a", "b", "c"]);
        b.replace_lines(1..3, &[]);
        assert_eq!(lines(&b), vec!["a"]);
    }

    #[test]
    fn remove_all_lines_keeps_one() {
        let mut b = Buffer::from_lines(["a", "b"]);
        b.replace_lines(0..2, &[]);
        assert_eq!(b.line_count(), 1);
        assert_eq!(lines(&b), vec![""]);
    }

    #[test]
    fn insert_and_append_lines() {
        let mut b = Buffer::from_lines(["a", "b"]);
        b.replace_lines(0..0, &["top".to_string()]);
        b.replace_lines(3..3, &["bottom".to_string(), "end".to_string()]);
        assert_eq!(lines(&b), vec!["top", "a", "b", "bottom", "end"]);
    }

    #[test]
    fn clamp_normal_rests_on_last_char() {
        let b = Buffer::from_lines(["abc", ""]);
        assert_eq!(b.clamp_normal(Position::new(0, 3)), Position::new(0, 2));
        assert_eq!(b.clamp_normal(Position::new(1, 4)), Position::new(1, 0));
        assert_eq!(b.clamp_normal(Position::new(9, 0)), Position::new(1, 0));
    }
}
