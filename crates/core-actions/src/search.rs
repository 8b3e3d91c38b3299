//! Pattern search over a buffer (`/`, `?`, `n`, `N`, `*`, `#`, and the
//! patterns used by ex addresses, `:s` and `:g`).
//!
//! Searches start strictly after (or before) the given position, so an empty
//! match can never pin the cursor. With `wrapscan` the scan continues from the
//! other end of the buffer and the hit says so.

use core_text::{Buffer, Position};
use regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("No previous regular expression")]
    NoPrevious,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    pub pos: Position,
    /// The scan passed the end (or start) of the buffer to get here.
    pub wrapped: bool,
}

#[derive(Debug)]
pub struct SearchEngine {
    last_pattern: Option<String>,
    compiled: Option<Regex>,
    forward: bool,
    ignorecase: bool,
    wrapscan: bool,
    regex: bool,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(true, false, true)
    }
}

impl SearchEngine {
    pub fn new(wrapscan: bool, ignorecase: bool, regex: bool) -> Self {
        Self {
            last_pattern: None,
            compiled: None,
            forward: true,
            ignorecase,
            wrapscan,
            regex,
        }
    }

    pub fn last_pattern(&self) -> Option<&str> {
        self.last_pattern.as_deref()
    }

    /// Direction of the last `/` (true) or `?` (false).
    pub fn is_forward(&self) -> bool {
        self.forward
    }

    pub fn ignorecase(&self) -> bool {
        self.ignorecase
    }

    pub fn wrapscan(&self) -> bool {
        self.wrapscan
    }

    pub fn regex_mode(&self) -> bool {
        self.regex
    }

    pub fn set_wrapscan(&mut self, on: bool) {
        self.wrapscan = on;
    }

    pub fn set_ignorecase(&mut self, on: bool) -> Result<(), SearchError> {
        self.ignorecase = on;
        self.recompile()
    }

    pub fn set_regex_mode(&mut self, on: bool) -> Result<(), SearchError> {
        self.regex = on;
        self.recompile()
    }

    fn recompile(&mut self) -> Result<(), SearchError> {
        if let Some(p) = &self.last_pattern {
            self.compiled = Some(self.compile(p, None)?);
        }
        Ok(())
    }

    /// Make `text` the current pattern. An empty `text` keeps the previous
    /// pattern and only changes the direction.
    pub fn set_pattern(&mut self, text: &str, forward: bool) -> Result<(), SearchError> {
        if text.is_empty() {
            if self.last_pattern.is_none() {
                return Err(SearchError::NoPrevious);
            }
        } else {
            let compiled = self.compile(text, None)?;
            self.last_pattern = Some(text.to_string());
            self.compiled = Some(compiled);
        }
        self.forward = forward;
        debug!(target: "actions.search", forward, "set_pattern");
        Ok(())
    }

    /// Search for `word` as a whole word (`*`, `#`).
    pub fn set_word(&mut self, word: &str, forward: bool) -> Result<(), SearchError> {
        let pattern = if self.regex {
            format!("\\<{}\\>", regex::escape(word))
        } else {
            word.to_string()
        };
        self.set_pattern(&pattern, forward)
    }

    /// Compile `pattern` under the current flags. `case_sensitive` overrides
    /// `ignorecase` (the `I`/`i` substitute flags).
    pub fn compile(&self, pattern: &str, case_sensitive: Option<bool>) -> Result<Regex, SearchError> {
        let source = if self.regex {
            pattern.replace("\\<", "\\b").replace("\\>", "\\b")
        } else {
            regex::escape(pattern)
        };
        let ignore = case_sensitive.map_or(self.ignorecase, |cs| !cs);
        RegexBuilder::new(&source)
            .case_insensitive(ignore)
            .build()
            .map_err(|e| SearchError::InvalidPattern(first_line(&e.to_string())))
    }

    /// `pattern`, or the last pattern when `pattern` is empty.
    pub fn resolve_pattern(&self, pattern: &str, case_sensitive: Option<bool>) -> Result<Regex, SearchError> {
        if pattern.is_empty() {
            let last = self.last_pattern.as_deref().ok_or(SearchError::NoPrevious)?;
            self.compile(last, case_sensitive)
        } else {
            self.compile(pattern, case_sensitive)
        }
    }

    pub fn find_next(&self, buf: &Buffer, from: Position) -> Result<Option<SearchHit>, SearchError> {
        self.find(buf, from, true)
    }

    pub fn find_previous(&self, buf: &Buffer, from: Position) -> Result<Option<SearchHit>, SearchError> {
        self.find(buf, from, false)
    }

    /// Search with the current pattern in `forward` direction.
    pub fn find(&self, buf: &Buffer, from: Position, forward: bool) -> Result<Option<SearchHit>, SearchError> {
        let re = self.compiled.as_ref().ok_or(SearchError::NoPrevious)?;
        Ok(self.find_with(re, buf, from, forward))
    }

    /// Search with an explicit regex (ex addresses use their own pattern).
    pub fn find_with(&self, re: &Regex, buf: &Buffer, from: Position, forward: bool) -> Option<SearchHit> {
        let count = buf.line_count();
        let hit = |line: usize, col: usize, wrapped: bool| SearchHit {
            pos: Position::new(line, col),
            wrapped,
        };
        let starts = |l: usize| match_starts(re, &buf.line(l).unwrap_or_default());
        if forward {
            if let Some(c) = starts(from.line).into_iter().find(|&c| c > from.col) {
                return Some(hit(from.line, c, false));
            }
            for l in from.line + 1..count {
                if let Some(&c) = starts(l).first() {
                    return Some(hit(l, c, false));
                }
            }
            if !self.wrapscan {
                return None;
            }
            for l in 0..=from.line {
                let first = starts(l).into_iter().find(|&c| l < from.line || c <= from.col);
                if let Some(c) = first {
                    return Some(hit(l, c, true));
                }
            }
        } else {
            if let Some(c) = starts(from.line).into_iter().rev().find(|&c| c < from.col) {
                return Some(hit(from.line, c, false));
            }
            for l in (0..from.line).rev() {
                if let Some(&c) = starts(l).last() {
                    return Some(hit(l, c, false));
                }
            }
            if !self.wrapscan {
                return None;
            }
            for l in (from.line..count).rev() {
                let last = starts(l)
                    .into_iter()
                    .rev()
                    .find(|&c| l > from.line || c >= from.col);
                if let Some(c) = last {
                    return Some(hit(l, c, true));
                }
            }
        }
        None
    }
}

/// Char columns at which a match starts, trying every position so that
/// overlapping matches are found too.
fn match_starts(re: &Regex, line: &str) -> Vec<usize> {
    let mut out = Vec::new();
    let mut at = 0;
    while at <= line.len() {
        let Some(m) = re.find_at(line, at) else {
            break;
        };
        out.push(line[..m.start()].chars().count());
        at = match line[m.start()..].chars().next() {
            Some(c) => m.start() + c.len_utf8(),
            None => break,
        };
    }
    out
}

fn first_line(s: &str) -> String {
    s.lines().last().unwrap_or(s).trim().to_string()
}

/// The keyword under or after the cursor, for `*` and `#`.
pub fn word_at(buf: &Buffer, pos: Position) -> Option<String> {
    let chars: Vec<char> = buf.line(pos.line)?.chars().collect();
    let is_word = |c: char| c == '_' || c.is_alphanumeric();
    let mut start = (pos.col..chars.len()).find(|&c| is_word(chars[c]))?;
    if start == pos.col {
        while start > 0 && is_word(chars[start - 1]) {
            start -= 1;
        }
    }
    let end = (start..chars.len()).find(|&c| !is_word(chars[c])).unwrap_or(chars.len());
    Some(chars[start..end].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(lines: &[&str]) -> Buffer {
        Buffer::from_lines(lines.iter().copied())
    }

    fn engine(pattern: &str) -> SearchEngine {
        let mut e = SearchEngine::default();
        e.set_pattern(pattern, true).unwrap();
        e
    }

    #[test]
    fn forward_starts_after_cursor() {
        let b = buf(&["foo bar foo", "foo"]);
        let e = engine("foo");
        let hit = e.find_next(&b, Position::new(0, 0)).unwrap().unwrap();
        assert_eq!(hit, SearchHit { pos: Position::new(0, 8), wrapped: false });
        let hit = e.find_next(&b, Position::new(0, 8)).unwrap().unwrap();
        assert_eq!(hit.pos, Position::new(1, 0));
    }

    #[test]
    fn wraps_and_reports_it() {
        let b = buf(&["needle", "hay"]);
        let e = engine("needle");
        let hit = e.find_next(&b, Position::new(1, 0)).unwrap().unwrap();
        assert_eq!(hit, SearchHit { pos: Position::new(0, 0), wrapped: true });
    }

    #[test]
    fn only_match_at_cursor_is_found_after_wrap() {
        let b = buf(&["x needle y"]);
        let e = engine("needle");
        let hit = e.find_next(&b, Position::new(0, 2)).unwrap().unwrap();
        assert_eq!(hit, SearchHit { pos: Position::new(0, 2), wrapped: true });
    }

    #[test]
    fn nowrapscan_stops_at_end() {
        let b = buf(&["needle", "hay"]);
        let mut e = engine("needle");
        e.set_wrapscan(false);
        assert_eq!(e.find_next(&b, Position::new(1, 0)).unwrap(), None);
    }

    #[test]
    fn backward_search() {
        let b = buf(&["ab ab", "cd"]);
        let e = engine("ab");
        let hit = e.find_previous(&b, Position::new(1, 0)).unwrap().unwrap();
        assert_eq!(hit.pos, Position::new(0, 3));
        let hit = e.find_previous(&b, Position::new(0, 3)).unwrap().unwrap();
        assert_eq!(hit.pos, Position::new(0, 0));
        let hit = e.find_previous(&b, Position::new(0, 0)).unwrap().unwrap();
        assert_eq!(hit, SearchHit { pos: Position::new(0, 3), wrapped: true });
    }

    #[test]
    fn empty_pattern_reuses_last() {
        let mut e = SearchEngine::default();
        assert_eq!(e.set_pattern("", true), Err(SearchError::NoPrevious));
        e.set_pattern("x+", true).unwrap();
        e.set_pattern("", false).unwrap();
        assert_eq!(e.last_pattern(), Some("x+"));
        assert!(!e.is_forward());
    }

    #[test]
    fn literal_mode_and_ignorecase() {
        let b = buf(&["a.c abc ABC"]);
        let mut e = SearchEngine::new(true, false, false);
        e.set_pattern("a.c", true).unwrap();
        assert_eq!(e.find_next(&b, Position::new(0, 0)).unwrap().unwrap().pos, Position::new(0, 0));
        assert!(e.find_next(&b, Position::new(0, 0)).unwrap().unwrap().wrapped);
        let mut e = SearchEngine::default();
        e.set_pattern("abc", true).unwrap();
        e.set_ignorecase(true).unwrap();
        assert_eq!(e.find_next(&b, Position::new(0, 4)).unwrap().unwrap().pos, Position::new(0, 8));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let mut e = SearchEngine::default();
        assert!(matches!(e.set_pattern("(", true), Err(SearchError::InvalidPattern(_))));
        assert_eq!(e.last_pattern(), None);
    }

    #[test]
    fn word_boundaries() {
        let b = buf(&["cat concat cat"]);
        let mut e = SearchEngine::default();
        e.set_word("cat", true).unwrap();
        assert_eq!(e.find_next(&b, Position::new(0, 0)).unwrap().unwrap().pos, Position::new(0, 11));
        assert_eq!(word_at(&b, Position::new(0, 5)).as_deref(), Some("concat"));
        assert_eq!(word_at(&b, Position::new(0, 3)).as_deref(), Some("concat"));
    }

    #[test]
    fn overlapping_matches_are_all_starts() {
        let b = buf(&["aaa"]);
        let e = engine("aa");
        assert_eq!(e.find_next(&b, Position::new(0, 0)).unwrap().unwrap().pos, Position::new(0, 1));
    }
}
