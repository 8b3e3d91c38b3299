//! `:s/pat/repl/[g][c][i][I]` and the confirm sub-mode.
//!
//! Replacement syntax: `&` is the whole match, `\1`-`\9` are groups, `\&` is
//! a literal `&`, and `\r`/`\n` break the line.

use super::ExError;
use super::address::Scanner;
use crate::dispatcher::Env;
use core_events::KeyEvent;
use core_text::Position;
use core_text::motion::first_non_blank;
use regex::{Captures, Regex};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SubFlags {
    pub global: bool,
    pub confirm: bool,
    /// `I` forces case-sensitive, `i` case-insensitive.
    pub case_sensitive: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Substitution {
    pub pattern: String,
    pub replacement: String,
    pub flags: SubFlags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SubArgs {
    New(Substitution),
    /// `:s` or `:&` with optional flags: reuse the last pattern and text.
    Repeat(SubFlags),
}

pub(crate) fn parse_flags(text: &str) -> Result<SubFlags, ExError> {
    let text = text.trim();
    let mut flags = SubFlags::default();
    for c in text.chars() {
        match c {
            'g' => flags.global = true,
            'c' => flags.confirm = true,
            'i' => flags.case_sensitive = Some(false),
            'I' => flags.case_sensitive = Some(true),
            _ => return Err(ExError::TrailingCharacters(text.to_string())),
        }
    }
    Ok(flags)
}

pub(crate) fn parse(args: &str) -> Result<SubArgs, ExError> {
    let mut sc = Scanner::new(args);
    sc.skip_blanks();
    let delim = match sc.peek() {
        None => return Ok(SubArgs::Repeat(SubFlags::default())),
        Some(c) if c.is_ascii_alphanumeric() || c == '\\' || c == '"' => {
            return parse_flags(&sc.rest()).map(SubArgs::Repeat);
        }
        Some(c) => c,
    };
    sc.bump();
    let pattern = sc.delimited(delim);
    let replacement = sc.delimited(delim);
    let flags = parse_flags(&sc.rest())?;
    Ok(SubArgs::New(Substitution {
        pattern,
        replacement,
        flags,
    }))
}

pub(crate) fn expand(replacement: &str, caps: &Captures) -> String {
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    let mut out = String::new();
    let mut chars = replacement.chars();
    while let Some(c) = chars.next() {
        match c {
            '&' => out.push_str(group(0)),
            '\\' => match chars.next() {
                Some(d @ '0'..='9') => out.push_str(group(d as usize - '0' as usize)),
                Some('r' | 'n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}

/// Replace the first (or every) match on one line; returns the new text and
/// how many replacements were made.
pub(crate) fn substitute_line(re: &Regex, line: &str, replacement: &str, global: bool) -> (String, usize) {
    let mut out = String::new();
    let mut last = 0;
    let mut n = 0;
    for caps in re.captures_iter(line) {
        let Some(m) = caps.get(0) else { continue };
        out.push_str(&line[last..m.start()]);
        out.push_str(&expand(replacement, &caps));
        last = m.end();
        n += 1;
        if !global {
            break;
        }
    }
    out.push_str(&line[last..]);
    (out, n)
}

/// Substitute over lines `first..=last` as one change. Returns the number of
/// replacements; zero matches is an error and leaves the buffer alone.
pub(crate) fn apply(
    env: &mut Env,
    re: &Regex,
    sub: &Substitution,
    first: usize,
    last: usize,
) -> Result<usize, ExError> {
    let mut out: Vec<String> = Vec::with_capacity(last - first + 1);
    let mut total = 0;
    let mut last_changed = None;
    for l in first..=last {
        let line = env.buf.text().line(l).unwrap_or_default();
        let (new, n) = substitute_line(re, &line, &sub.replacement, sub.flags.global);
        if n == 0 {
            out.push(line);
            continue;
        }
        total += n;
        out.extend(new.split('\n').map(str::to_string));
        last_changed = Some(first + out.len() - 1);
    }
    let Some(dest) = last_changed else {
        return Err(ExError::PatternNotFound(sub.pattern.clone()));
    };
    env.buf.replace_lines(first..last + 1, out)?;
    let col = first_non_blank(env.buf.text(), dest);
    env.buf.set_cursor_clamped(Position::new(dest, col));
    debug!(target: "actions.ex", total, first, last, "substitute");
    Ok(total)
}

pub(crate) fn count_message(n: usize) -> String {
    if n == 1 {
        "1 substitution".to_string()
    } else {
        format!("{n} substitutions")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfirmStep {
    Continue,
    Finished,
}

/// Walks matches one at a time, asking before each replacement.
#[derive(Debug)]
pub(crate) struct ConfirmSession {
    re: Regex,
    replacement: String,
    global: bool,
    line: usize,
    last_line: usize,
    /// Byte offset in `line` where the next match may start.
    from: usize,
    /// Byte range of the match awaiting an answer.
    current: Option<(usize, usize)>,
    replaced: usize,
    last_replaced: Option<usize>,
}

impl ConfirmSession {
    pub fn start(
        env: &mut Env,
        re: Regex,
        sub: &Substitution,
        first: usize,
        last: usize,
    ) -> Result<Self, ExError> {
        let mut session = Self {
            re,
            replacement: sub.replacement.clone(),
            global: sub.flags.global,
            line: first,
            last_line: last,
            from: 0,
            current: None,
            replaced: 0,
            last_replaced: None,
        };
        if !session.advance(env) {
            return Err(ExError::PatternNotFound(sub.pattern.clone()));
        }
        Ok(session)
    }

    pub fn prompt(&self) -> String {
        format!("replace with {} (y/n/a/q/l)?", self.replacement)
    }

    /// Move to the next match at or after `from`, placing the cursor on it.
    fn advance(&mut self, env: &mut Env) -> bool {
        while self.line <= self.last_line {
            let text = env.buf.text().line(self.line).unwrap_or_default();
            if self.from <= text.len()
                && let Some(m) = self.re.find_at(&text, self.from)
            {
                self.current = Some((m.start(), m.end()));
                let col = text[..m.start()].chars().count();
                env.buf.set_cursor_clamped(Position::new(self.line, col));
                return true;
            }
            self.line += 1;
            self.from = 0;
        }
        self.current = None;
        false
    }

    /// Continue scanning at byte `at` of `text`. An empty match also skips
    /// the char after it so the scan cannot stall.
    fn resume(&mut self, text: &str, at: usize, empty: bool) {
        if !self.global {
            self.line += 1;
            self.from = 0;
        } else if !empty {
            self.from = at;
        } else {
            self.from = text[at..]
                .chars()
                .next()
                .map_or(text.len() + 1, |c| at + c.len_utf8());
        }
    }

    fn replace_current(&mut self, env: &mut Env) {
        let Some((start, end)) = self.current.take() else {
            return;
        };
        let text = env.buf.text().line(self.line).unwrap_or_default();
        let Some(caps) = self.re.captures_at(&text, start) else {
            return;
        };
        let expanded = expand(&self.replacement, &caps);
        let new = format!("{}{}{}", &text[..start], expanded, &text[end..]);
        let pieces: Vec<String> = new.split('\n').map(str::to_string).collect();
        let extra = pieces.len() - 1;
        // Where the untouched tail starts in the last piece.
        let tail = if extra == 0 {
            start + expanded.len()
        } else {
            expanded.rsplit('\n').next().map_or(0, str::len)
        };
        if let Err(e) = env.buf.replace_lines(self.line..self.line + 1, pieces) {
            env.buffer_error(e);
            self.line = self.last_line + 1;
            return;
        }
        self.replaced += 1;
        self.line += extra;
        self.last_line += extra;
        self.last_replaced = Some(self.line);
        let line_text = env.buf.text().line(self.line).unwrap_or_default();
        self.resume(&line_text, tail, start == end);
    }

    fn skip_current(&mut self, env: &Env) {
        let Some((start, end)) = self.current.take() else {
            return;
        };
        let text = env.buf.text().line(self.line).unwrap_or_default();
        self.resume(&text, end, start == end);
    }

    pub fn respond(&mut self, env: &mut Env, key: &KeyEvent) -> ConfirmStep {
        if key.is_cancel() {
            return ConfirmStep::Finished;
        }
        match key.printable() {
            Some('y') => {
                self.replace_current(env);
                self.next(env)
            }
            Some('n') => {
                self.skip_current(env);
                self.next(env)
            }
            Some('a') => {
                loop {
                    self.replace_current(env);
                    if !self.advance(env) {
                        break;
                    }
                }
                ConfirmStep::Finished
            }
            Some('l') => {
                self.replace_current(env);
                ConfirmStep::Finished
            }
            Some('q') => ConfirmStep::Finished,
            _ => {
                env.bell();
                ConfirmStep::Continue
            }
        }
    }

    fn next(&mut self, env: &mut Env) -> ConfirmStep {
        if self.advance(env) {
            env.info(self.prompt());
            ConfirmStep::Continue
        } else {
            ConfirmStep::Finished
        }
    }

    pub fn finish(self, env: &mut Env) {
        if let Some(line) = self.last_replaced {
            let col = first_non_blank(env.buf.text(), line);
            env.buf.set_cursor_clamped(Position::new(line, col));
        }
        debug!(target: "actions.ex", replaced = self.replaced, "confirm_finished");
        env.info(count_message(self.replaced));
    }
}
