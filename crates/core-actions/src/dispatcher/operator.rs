//! Operator application: `d c y < >` over a motion or over whole lines.

use super::motion::{is_jump, mark_jump, remember_find, resolve_target};
use super::{DispatchResult, Env, InsertStart, MotionMemory};
use crate::span_resolver::{Span, resolve_span};
use crate::{MotionSpec, OperatorKind};
use core_state::RegisterContent;
use core_text::motion::{self, Motion, MotionContext, MotionKind, MotionOutcome, Target};
use core_text::width::TAB_STOP;
use core_text::{Buffer, Position};
use tracing::trace;

pub(crate) fn handle_operate(
    env: &mut Env,
    op: OperatorKind,
    spec: MotionSpec,
    count: Option<usize>,
    register: Option<char>,
    mem: &mut MotionMemory,
) -> DispatchResult {
    let cursor = env.buf.cursor();
    let word_forward = matches!(
        spec,
        MotionSpec::Basic(Motion::WordForward | Motion::BigWordForward)
    );
    let big = spec == MotionSpec::Basic(Motion::BigWordForward);
    let target = if word_forward && op == OperatorKind::Change && on_non_blank(env.buf.text(), cursor) {
        change_word_target(env.buf.text(), cursor, big, count)
    } else {
        resolve_target(env, spec, count, mem, true)
    };
    remember_find(spec, mem);
    let Some(mut target) = target else {
        env.bell();
        return DispatchResult::Failed;
    };
    // When the last word crossed ends its line, `w` stops the operator at
    // that line end instead of the next line's first word.
    if word_forward
        && target.kind == MotionKind::Exclusive
        && target.pos.line > cursor.line
        && target.pos.col <= motion::first_non_blank(env.buf.text(), target.pos.line)
    {
        let l = target.pos.line - 1;
        target.pos = Position::new(l, env.buf.line_len(l));
    }
    if is_jump(spec) {
        mark_jump(env, cursor);
    }
    let span = resolve_span(env.buf.text(), cursor, target);
    trace!(target: "actions.dispatch", op = %op.key(), ?span, "operate");
    apply(env, op, span, register)
}

/// `dd cc yy << >>`: `count` lines from the cursor line, clipped at the end.
pub(crate) fn handle_operate_lines(
    env: &mut Env,
    op: OperatorKind,
    count: usize,
    register: Option<char>,
) -> DispatchResult {
    let line = env.buf.cursor().line;
    let last = (line + count.max(1) - 1).min(env.buf.text().last_line());
    apply(env, op, Span::whole_lines(line, last), register)
}

fn apply(env: &mut Env, op: OperatorKind, span: Span, register: Option<char>) -> DispatchResult {
    match op {
        OperatorKind::Delete => delete_span(env, span, register),
        OperatorKind::Change => change_span(env, span, register),
        OperatorKind::Yank => yank_span(env, span, register),
        OperatorKind::ShiftLeft => shift_span(env, span, false),
        OperatorKind::ShiftRight => shift_span(env, span, true),
    }
}

pub(crate) fn delete_span(env: &mut Env, span: Span, register: Option<char>) -> DispatchResult {
    if span.is_empty() {
        return DispatchResult::Done;
    }
    let removed = match env.buf.delete_range(span.start, span.end, span.linewise) {
        Ok(content) => content,
        Err(e) => {
            env.buffer_error(e);
            return DispatchResult::Failed;
        }
    };
    store_deleted(env, removed, register);
    let dest = if span.linewise {
        let l = span.start.line.min(env.buf.text().last_line());
        Position::new(l, motion::first_non_blank(env.buf.text(), l))
    } else {
        span.start
    };
    let dest = env.buf.text().clamp_normal(dest);
    env.buf.set_cursor_clamped(dest);
    if span.linewise {
        env.report_lines(span.lines().count(), "fewer lines");
    }
    DispatchResult::Done
}

/// Remove the span and start inserting where it was. A linewise change
/// leaves one empty line behind.
pub(crate) fn change_span(env: &mut Env, span: Span, register: Option<char>) -> DispatchResult {
    if span.linewise {
        let range = span.start.line..span.end.line + 1;
        match env.buf.replace_lines(range, vec![String::new()]) {
            Ok(removed) => store_deleted(env, RegisterContent::linewise(&removed), register),
            Err(e) => {
                env.buffer_error(e);
                return DispatchResult::Failed;
            }
        }
        env.buf.set_cursor_clamped(Position::new(span.start.line, 0));
    } else {
        if !span.is_empty() {
            match env.buf.delete_range(span.start, span.end, false) {
                Ok(removed) => store_deleted(env, removed, register),
                Err(e) => {
                    env.buffer_error(e);
                    return DispatchResult::Failed;
                }
            }
        }
        env.buf.set_cursor_clamped(span.start);
    }
    DispatchResult::Insert(InsertStart {
        replace: false,
        count: 1,
        open_line: false,
    })
}

fn yank_span(env: &mut Env, span: Span, register: Option<char>) -> DispatchResult {
    if span.is_empty() {
        return DispatchResult::Done;
    }
    let cursor = env.buf.cursor();
    if let Err(e) = env.buf.yank(span.start, span.end, span.linewise, register) {
        env.buffer_error(e);
        return DispatchResult::Failed;
    }
    let dest = if span.linewise {
        Position::new(span.start.line.min(cursor.line), cursor.col)
    } else {
        span.start
    };
    let dest = env.buf.text().clamp_normal(dest);
    env.buf.set_cursor_clamped(dest);
    if span.linewise {
        env.report_lines(span.lines().count(), "lines yanked");
    }
    DispatchResult::Done
}

fn shift_span(env: &mut Env, span: Span, right: bool) -> DispatchResult {
    let sw = env.settings.shiftwidth.max(1);
    let (first, last) = (span.start.line, span.end.line);
    let old: Vec<String> = (first..=last)
        .map(|l| env.buf.text().line(l).unwrap_or_default())
        .collect();
    let new: Vec<String> = old
        .iter()
        .map(|l| if right { shift_right(l, sw) } else { shift_left(l, sw) })
        .collect();
    if new != old
        && let Err(e) = env.buf.replace_lines(first..last + 1, new)
    {
        env.buffer_error(e);
        return DispatchResult::Failed;
    }
    let col = motion::first_non_blank(env.buf.text(), first);
    env.buf.set_cursor_clamped(Position::new(first, col));
    let what = if right { "lines shifted right" } else { "lines shifted left" };
    env.report_lines(last - first + 1, what);
    DispatchResult::Done
}

fn store_deleted(env: &mut Env, content: RegisterContent, register: Option<char>) {
    if let Err(e) = env.buf.registers.write_delete(content, register) {
        env.buffer_error(e.into());
    }
}

fn shift_right(line: &str, sw: usize) -> String {
    if line.is_empty() {
        String::new()
    } else {
        format!("{}{line}", " ".repeat(sw))
    }
}

/// Drop up to `sw` cells of leading blanks; a tab counts to its next stop.
fn shift_left(line: &str, sw: usize) -> String {
    let mut cells = 0;
    let mut cut = 0;
    for (b, c) in line.char_indices() {
        if cells >= sw {
            break;
        }
        match c {
            ' ' => cells += 1,
            '\t' => cells += TAB_STOP - cells % TAB_STOP,
            _ => break,
        }
        cut = b + c.len_utf8();
    }
    line[cut..].to_string()
}

fn on_non_blank(buf: &Buffer, pos: Position) -> bool {
    buf.char_at(pos).is_some_and(|c| !c.is_whitespace())
}

fn word_class(c: char, big: bool) -> u8 {
    if c.is_whitespace() {
        0
    } else if big || c == '_' || c.is_alphanumeric() {
        1
    } else {
        2
    }
}

/// `cw` on a word acts like `ce`, except that on the last char of a word a
/// single `cw` changes just that char.
fn change_word_target(buf: &Buffer, cursor: Position, big: bool, count: Option<usize>) -> Option<Target> {
    let n = count.unwrap_or(1).max(1);
    let next = Position::new(cursor.line, cursor.col + 1);
    let at_word_end = match (buf.char_at(cursor), buf.char_at(next)) {
        (Some(a), Some(b)) => word_class(a, big) != word_class(b, big),
        _ => true,
    };
    let n = if at_word_end {
        if n == 1 {
            return Some(Target {
                pos: cursor,
                kind: MotionKind::Inclusive,
            });
        }
        n - 1
    } else {
        n
    };
    let m = if big { Motion::BigWordEnd } else { Motion::WordEnd };
    match motion::resolve(buf, cursor, m, &MotionContext::with_count(Some(n))) {
        MotionOutcome::Resolved(t) => Some(t),
        MotionOutcome::NeedsChar | MotionOutcome::NoTarget => None,
    }
}
