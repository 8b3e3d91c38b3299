//! Ex line addresses and ranges.
//!
//! An address is a base (`12`, `.`, `$`, `'a`, `/pat/`, `?pat?`) followed by
//! any number of `+n`/`-n` offsets; an offset alone is relative to the
//! current line. Ranges are one address, two joined by `,` or `;`, or `%`.
//! With `;` the first address becomes the current line for the second.

use super::ExError;
use crate::dispatcher::Env;
use core_text::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Base {
    Current,
    Last,
    /// 1-based as typed; `0` means before the first line.
    Line(usize),
    Mark(char),
    Search { pattern: String, forward: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Address {
    pub base: Base,
    pub offset: isize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum RangeSpec {
    #[default]
    None,
    Whole,
    One(Address),
    Two {
        first: Address,
        second: Address,
        /// `;`: the first address moves the current line.
        anchored: bool,
    },
}

/// Character cursor over a command line.
pub(crate) struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    pub fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.pos += 1;
        }
    }

    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    pub fn rest(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }

    fn number(&mut self) -> Option<usize> {
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            None
        } else {
            Some(digits.parse().unwrap_or(usize::MAX))
        }
    }

    /// Text up to an unescaped `delim` (consumed) or the end of the line.
    /// `\delim` yields a bare `delim`; other escapes are kept as typed.
    pub fn delimited(&mut self, delim: char) -> String {
        let mut out = String::new();
        while let Some(c) = self.bump() {
            if c == delim {
                break;
            }
            if c == '\\' {
                match self.peek() {
                    Some(next) if next == delim => {
                        self.pos += 1;
                        out.push(next);
                    }
                    Some(next) => {
                        self.pos += 1;
                        out.push('\\');
                        out.push(next);
                    }
                    None => out.push('\\'),
                }
                continue;
            }
            out.push(c);
        }
        out
    }
}

fn parse_address(sc: &mut Scanner) -> Result<Option<Address>, ExError> {
    sc.skip_blanks();
    let base = match sc.peek() {
        Some(c) if c.is_ascii_digit() => sc.number().map(Base::Line),
        Some('.') => {
            sc.bump();
            Some(Base::Current)
        }
        Some('$') => {
            sc.bump();
            Some(Base::Last)
        }
        Some('\'') => {
            sc.bump();
            match sc.bump() {
                Some(m) => Some(Base::Mark(m)),
                None => return Err(ExError::MarkNotSet),
            }
        }
        Some(d @ ('/' | '?')) => {
            sc.bump();
            let pattern = sc.delimited(d);
            Some(Base::Search {
                pattern,
                forward: d == '/',
            })
        }
        _ => None,
    };
    let mut offset: isize = 0;
    let mut has_offset = false;
    loop {
        sc.skip_blanks();
        let sign = match sc.peek() {
            Some('+') => 1,
            Some('-') => -1,
            _ => break,
        };
        sc.bump();
        let n = sc.number().unwrap_or(1);
        offset = offset.saturating_add(sign * n.min(isize::MAX as usize) as isize);
        has_offset = true;
    }
    Ok(match base {
        Some(base) => Some(Address { base, offset }),
        None if has_offset => Some(Address {
            base: Base::Current,
            offset,
        }),
        None => None,
    })
}

pub(crate) fn parse_range(sc: &mut Scanner) -> Result<RangeSpec, ExError> {
    sc.skip_blanks();
    if sc.eat('%') {
        return Ok(RangeSpec::Whole);
    }
    let first = parse_address(sc)?;
    sc.skip_blanks();
    let anchored = match sc.peek() {
        Some(',') => false,
        Some(';') => true,
        _ => return Ok(first.map_or(RangeSpec::None, RangeSpec::One)),
    };
    sc.bump();
    let current = || Address {
        base: Base::Current,
        offset: 0,
    };
    let first = first.unwrap_or_else(current);
    let second = parse_address(sc)?.unwrap_or_else(current);
    Ok(RangeSpec::Two {
        first,
        second,
        anchored,
    })
}

/// Resolve to a 0-based line.
fn resolve(addr: &Address, env: &mut Env, current: usize) -> Result<usize, ExError> {
    let last = env.buf.text().last_line();
    let base = match &addr.base {
        Base::Current => current,
        Base::Last => last,
        Base::Line(n) => n.saturating_sub(1),
        Base::Mark(m) => env.buf.get_mark(*m).ok_or(ExError::MarkNotSet)?.line,
        Base::Search { pattern, forward } => {
            env.search.set_pattern(pattern, *forward)?;
            let from = if *forward {
                Position::new(current, env.buf.line_len(current))
            } else {
                Position::new(current, 0)
            };
            let shown = env.search.last_pattern().unwrap_or_default().to_string();
            match env.search.find(env.buf.text(), from, *forward)? {
                Some(hit) => hit.pos.line,
                None => return Err(ExError::PatternNotFound(shown)),
            }
        }
    };
    base.checked_add_signed(addr.offset)
        .filter(|line| *line <= last)
        .ok_or(ExError::InvalidRange)
}

/// Lines `(first, last)` a range covers, or `None` when no range was typed.
pub(crate) fn resolve_range(spec: &RangeSpec, env: &mut Env) -> Result<Option<(usize, usize)>, ExError> {
    let current = env.buf.cursor().line;
    let (a, b) = match spec {
        RangeSpec::None => return Ok(None),
        RangeSpec::Whole => (0, env.buf.text().last_line()),
        RangeSpec::One(addr) => {
            let l = resolve(addr, env, current)?;
            (l, l)
        }
        RangeSpec::Two {
            first,
            second,
            anchored,
        } => {
            let a = resolve(first, env, current)?;
            let b = resolve(second, env, if *anchored { a } else { current })?;
            (a, b)
        }
    };
    if a > b {
        return Err(ExError::InvalidRange);
    }
    Ok(Some((a, b)))
}
