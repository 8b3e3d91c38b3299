//! Cursor motion resolution.
//!
//! These operate purely on a `Buffer` + `Position` pair and are free of editor
//! state: everything a motion needs beyond the buffer (count, last find,
//! sticky column, visible rows) arrives in a [`MotionContext`]. The result says
//! where the motion lands and how an operator should treat the span.

use crate::{Buffer, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    Left,
    Right,
    LineStart,
    FirstNonBlank,
    LineEnd,
    Column,
    /// `f` `t` `F` `T`; `ch` is `None` until the target char is typed.
    Find {
        forward: bool,
        till: bool,
        ch: Option<char>,
    },
    RepeatFind,
    RepeatFindReverse,
    WordForward,
    BigWordForward,
    WordEnd,
    BigWordEnd,
    WordBackward,
    BigWordBackward,
    ParagraphForward,
    ParagraphBackward,
    Up,
    Down,
    PrevLineFirstNonBlank,
    NextLineFirstNonBlank,
    CurrentLineFirstNonBlank,
    GotoLine,
    ScreenTop,
    ScreenMiddle,
    ScreenBottom,
}

impl Motion {
    /// Motions after which `j`/`k` should keep aiming at the same column.
    pub fn is_vertical(self) -> bool {
        matches!(self, Motion::Up | Motion::Down)
    }

    /// Motions that count as jumps and record the previous-context mark.
    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Motion::GotoLine
                | Motion::ScreenTop
                | Motion::ScreenMiddle
                | Motion::ScreenBottom
                | Motion::ParagraphForward
                | Motion::ParagraphBackward
        )
    }
}

/// A remembered `f`/`t`/`F`/`T` for `;` and `,`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FindSpec {
    pub forward: bool,
    pub till: bool,
    pub ch: char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionKind {
    /// The target char itself is not part of an operator span.
    Exclusive,
    /// The target char is part of the span.
    Inclusive,
    /// Whole lines from the cursor line to the target line.
    Linewise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub pos: Position,
    pub kind: MotionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    Resolved(Target),
    /// `f`/`t`/`F`/`T` still waiting for their char.
    NeedsChar,
    NoTarget,
}

/// First visible line and number of text rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRows {
    pub top: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MotionContext {
    /// Count as typed; `None` when absent (matters for `G`).
    pub count: Option<usize>,
    pub last_find: Option<FindSpec>,
    /// Column that `j`/`k` aim for; `usize::MAX` after `$`.
    pub sticky_col: Option<usize>,
    pub visible: Option<VisibleRows>,
    /// Operator pending: `l` may reach one past the last char.
    pub for_operator: bool,
}

impl MotionContext {
    pub fn with_count(count: Option<usize>) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    fn n(&self) -> usize {
        self.count.unwrap_or(1).max(1)
    }
}

pub fn resolve(buf: &Buffer, cursor: Position, motion: Motion, ctx: &MotionContext) -> MotionOutcome {
    let cursor = buf.clamp(cursor);
    let n = ctx.n();
    let line = cursor.line;
    let len = buf.line_len(line);
    let exclusive = |pos| Some(Target { pos, kind: MotionKind::Exclusive });
    let inclusive = |pos| Some(Target { pos, kind: MotionKind::Inclusive });
    let linewise = |pos| Some(Target { pos, kind: MotionKind::Linewise });

    let target = match motion {
        Motion::Left => {
            if cursor.col == 0 {
                None
            } else {
                exclusive(Position::new(line, cursor.col.saturating_sub(n)))
            }
        }
        Motion::Right => {
            let limit = if ctx.for_operator { len } else { len.saturating_sub(1) };
            if cursor.col >= limit {
                None
            } else {
                exclusive(Position::new(line, (cursor.col + n).min(limit)))
            }
        }
        Motion::LineStart => exclusive(Position::new(line, 0)),
        Motion::FirstNonBlank => exclusive(Position::new(line, first_non_blank(buf, line))),
        Motion::LineEnd => {
            let l = line + n - 1;
            if l >= buf.line_count() {
                None
            } else {
                inclusive(Position::new(l, buf.line_len(l).saturating_sub(1)))
            }
        }
        Motion::Column => exclusive(Position::new(line, (n - 1).min(len.saturating_sub(1)))),
        Motion::Find { ch: None, .. } => return MotionOutcome::NeedsChar,
        Motion::Find {
            forward,
            till,
            ch: Some(ch),
        } => find_in_line(buf, cursor, FindSpec { forward, till, ch }, n, false),
        Motion::RepeatFind => ctx
            .last_find
            .and_then(|spec| find_in_line(buf, cursor, spec, n, true)),
        Motion::RepeatFindReverse => ctx.last_find.and_then(|spec| {
            let reversed = FindSpec {
                forward: !spec.forward,
                ..spec
            };
            find_in_line(buf, cursor, reversed, n, true)
        }),
        Motion::WordForward | Motion::BigWordForward => {
            let big = motion == Motion::BigWordForward;
            repeat(cursor, n, |p| word_forward(buf, p, big)).and_then(exclusive)
        }
        Motion::WordEnd | Motion::BigWordEnd => {
            let big = motion == Motion::BigWordEnd;
            repeat(cursor, n, |p| word_end(buf, p, big)).and_then(inclusive)
        }
        Motion::WordBackward | Motion::BigWordBackward => {
            let big = motion == Motion::BigWordBackward;
            repeat(cursor, n, |p| word_backward(buf, p, big)).and_then(exclusive)
        }
        Motion::ParagraphForward => {
            repeat(cursor, n, |p| paragraph_forward(buf, p)).and_then(exclusive)
        }
        Motion::ParagraphBackward => {
            repeat(cursor, n, |p| paragraph_backward(buf, p)).and_then(exclusive)
        }
        Motion::Up | Motion::Down => {
            let dest = if motion == Motion::Up {
                line.checked_sub(1).map(|_| line.saturating_sub(n))
            } else {
                (line < buf.last_line()).then(|| (line + n).min(buf.last_line()))
            };
            dest.and_then(|l| {
                let want = ctx.sticky_col.unwrap_or(cursor.col);
                linewise(Position::new(l, want.min(buf.line_len(l))))
            })
        }
        Motion::PrevLineFirstNonBlank => line
            .checked_sub(1)
            .map(|_| line.saturating_sub(n))
            .and_then(|l| linewise(Position::new(l, first_non_blank(buf, l)))),
        Motion::NextLineFirstNonBlank => (line < buf.last_line())
            .then(|| (line + n).min(buf.last_line()))
            .and_then(|l| linewise(Position::new(l, first_non_blank(buf, l)))),
        Motion::CurrentLineFirstNonBlank => {
            let l = (line + n - 1).min(buf.last_line());
            linewise(Position::new(l, first_non_blank(buf, l)))
        }
        Motion::GotoLine => {
            let l = ctx
                .count
                .map(|c| c.max(1) - 1)
                .unwrap_or(buf.last_line())
                .min(buf.last_line());
            linewise(Position::new(l, first_non_blank(buf, l)))
        }
        Motion::ScreenTop | Motion::ScreenMiddle | Motion::ScreenBottom => {
            let rows = ctx.visible.unwrap_or(VisibleRows {
                top: 0,
                height: buf.line_count(),
            });
            let top = rows.top.min(buf.last_line());
            let bottom = (rows.top + rows.height.max(1) - 1).min(buf.last_line());
            let l = match motion {
                Motion::ScreenTop => (top + n - 1).min(bottom),
                Motion::ScreenBottom => bottom.saturating_sub(n - 1).max(top),
                _ => top + (bottom - top) / 2,
            };
            linewise(Position::new(l, first_non_blank(buf, l)))
        }
    };
    match target {
        Some(t) => MotionOutcome::Resolved(t),
        None => MotionOutcome::NoTarget,
    }
}

/// Column of the first non-blank char, or of the last char on an all-blank line.
pub fn first_non_blank(buf: &Buffer, line: usize) -> usize {
    let text = buf.line(line).unwrap_or_default();
    let len = text.chars().count();
    text.chars()
        .position(|c| !c.is_whitespace())
        .unwrap_or(len.saturating_sub(1))
}

/// Apply `step` up to `n` times; fails only if the first step does.
fn repeat(start: Position, n: usize, mut step: impl FnMut(Position) -> Option<Position>) -> Option<Position> {
    let mut pos = step(start)?;
    for _ in 1..n {
        match step(pos) {
            Some(next) => pos = next,
            None => break,
        }
    }
    Some(pos)
}

fn find_in_line(buf: &Buffer, cursor: Position, spec: FindSpec, n: usize, repeating: bool) -> Option<Target> {
    let chars: Vec<char> = buf.line(cursor.line)?.chars().collect();
    let mut col = cursor.col;
    // A repeated till would otherwise stop on the char it already sits next to.
    let mut skip_adjacent = repeating && spec.till;
    for _ in 0..n {
        let found = if spec.forward {
            let from = col + 1 + usize::from(skip_adjacent);
            (from..chars.len()).find(|&c| chars[c] == spec.ch)
        } else {
            let upto = col.saturating_sub(usize::from(skip_adjacent));
            (0..upto).rev().find(|&c| chars[c] == spec.ch)
        };
        col = found?;
        skip_adjacent = false;
    }
    let (col, kind) = match (spec.forward, spec.till) {
        (true, false) => (col, MotionKind::Inclusive),
        (true, true) => (col - 1, MotionKind::Inclusive),
        (false, false) => (col, MotionKind::Exclusive),
        (false, true) => (col + 1, MotionKind::Exclusive),
    };
    Some(Target {
        pos: Position::new(cursor.line, col),
        kind,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Blank,
    Word,
    Punct,
}

fn class_of(c: char, big: bool) -> Class {
    if c.is_whitespace() {
        Class::Blank
    } else if big || c == '_' || c.is_alphanumeric() {
        Class::Word
    } else {
        Class::Punct
    }
}

/// Class at `pos`, with the end of a line acting as a blank.
fn class_at(buf: &Buffer, pos: Position, big: bool) -> Class {
    buf.char_at(pos).map_or(Class::Blank, |c| class_of(c, big))
}

/// Start of the next word. Empty lines count as words. Reaching the end of
/// the buffer yields the position one past the last char.
fn word_forward(buf: &Buffer, start: Position, big: bool) -> Option<Position> {
    let mut pos = start;
    let class = class_at(buf, pos, big);
    if class != Class::Blank {
        while pos.col < buf.line_len(pos.line) && class_at(buf, pos, big) == class {
            pos.col += 1;
        }
    }
    loop {
        if pos.col >= buf.line_len(pos.line) {
            if pos.line == buf.last_line() {
                return (pos != start).then_some(pos);
            }
            pos = Position::new(pos.line + 1, 0);
            if buf.is_line_empty(pos.line) {
                return Some(pos);
            }
            continue;
        }
        if class_at(buf, pos, big) != Class::Blank {
            return Some(pos);
        }
        pos.col += 1;
    }
}

/// Next char position in document order, skipping empty lines.
fn next_char(buf: &Buffer, pos: Position) -> Option<Position> {
    if pos.col + 1 < buf.line_len(pos.line) {
        return Some(Position::new(pos.line, pos.col + 1));
    }
    (pos.line + 1..buf.line_count())
        .find(|&l| !buf.is_line_empty(l))
        .map(|l| Position::new(l, 0))
}

/// Previous position in document order; empty lines are their own stop.
fn prev_pos(buf: &Buffer, pos: Position) -> Option<Position> {
    if pos.col > 0 {
        return Some(Position::new(pos.line, pos.col - 1));
    }
    let l = pos.line.checked_sub(1)?;
    Some(Position::new(l, buf.line_len(l).saturating_sub(1)))
}

fn word_end(buf: &Buffer, start: Position, big: bool) -> Option<Position> {
    let mut pos = next_char(buf, start)?;
    while class_at(buf, pos, big) == Class::Blank {
        pos = next_char(buf, pos)?;
    }
    let class = class_at(buf, pos, big);
    while pos.col + 1 < buf.line_len(pos.line)
        && class_at(buf, Position::new(pos.line, pos.col + 1), big) == class
    {
        pos.col += 1;
    }
    Some(pos)
}

fn word_backward(buf: &Buffer, start: Position, big: bool) -> Option<Position> {
    let mut pos = prev_pos(buf, start)?;
    loop {
        if buf.is_line_empty(pos.line) || class_at(buf, pos, big) != Class::Blank {
            break;
        }
        match prev_pos(buf, pos) {
            Some(p) => pos = p,
            None => return (pos != start).then_some(pos),
        }
    }
    if buf.is_line_empty(pos.line) {
        return Some(pos);
    }
    let class = class_at(buf, pos, big);
    while pos.col > 0 && class_at(buf, Position::new(pos.line, pos.col - 1), big) == class {
        pos.col -= 1;
    }
    Some(pos)
}

fn paragraph_forward(buf: &Buffer, start: Position) -> Option<Position> {
    let mut l = start.line;
    while l < buf.line_count() && buf.is_line_empty(l) {
        l += 1;
    }
    while l < buf.line_count() && !buf.is_line_empty(l) {
        l += 1;
    }
    let pos = if l >= buf.line_count() {
        buf.end()
    } else {
        Position::new(l, 0)
    };
    (pos != start).then_some(pos)
}

fn paragraph_backward(buf: &Buffer, start: Position) -> Option<Position> {
    let mut l = start.line as isize;
    while l >= 0 && buf.is_line_empty(l as usize) {
        l -= 1;
    }
    while l >= 0 && !buf.is_line_empty(l as usize) {
        l -= 1;
    }
    let pos = if l < 0 {
        Position::origin()
    } else {
        Position::new(l as usize, 0)
    };
    (pos != start).then_some(pos)
}
