//! Single-key edits: `x X D C s S J p P ~ r`.

use super::operator::{change_span, delete_span, handle_operate, handle_operate_lines};
use super::{DispatchResult, Env, MotionMemory};
use crate::span_resolver::Span;
use crate::{EditKind, MotionSpec, OperatorKind};
use core_state::PasteSide;
use core_text::Position;
use core_text::motion::{Motion, first_non_blank};
use tracing::trace;

pub(crate) fn handle_edit(
    env: &mut Env,
    kind: EditKind,
    count: usize,
    register: Option<char>,
    mem: &mut MotionMemory,
) -> DispatchResult {
    let count = count.max(1);
    let cursor = env.buf.cursor();
    let len = env.buf.line_len(cursor.line);
    trace!(target: "actions.dispatch", ?kind, count, "edit");
    match kind {
        EditKind::DeleteUnder => {
            if len == 0 {
                env.bell();
                return DispatchResult::Failed;
            }
            let end = (cursor.col + count).min(len);
            delete_span(env, charwise(cursor, end), register)
        }
        EditKind::DeleteBefore => {
            if cursor.col == 0 {
                env.bell();
                return DispatchResult::Failed;
            }
            let start = Position::new(cursor.line, cursor.col.saturating_sub(count));
            delete_span(env, charwise(start, cursor.col), register)
        }
        EditKind::DeleteToEnd => handle_operate(
            env,
            OperatorKind::Delete,
            MotionSpec::Basic(Motion::LineEnd),
            Some(count),
            register,
            mem,
        ),
        EditKind::ChangeToEnd => handle_operate(
            env,
            OperatorKind::Change,
            MotionSpec::Basic(Motion::LineEnd),
            Some(count),
            register,
            mem,
        ),
        EditKind::SubstituteChar => {
            let end = (cursor.col + count).min(len);
            change_span(env, charwise(cursor, end), register)
        }
        EditKind::SubstituteLine => handle_operate_lines(env, OperatorKind::Change, count, register),
        EditKind::Join => match env.buf.join_lines(cursor.line, count, true) {
            Ok(Some(_)) => DispatchResult::Done,
            Ok(None) => {
                env.bell();
                DispatchResult::Failed
            }
            Err(e) => {
                env.buffer_error(e);
                DispatchResult::Failed
            }
        },
        EditKind::PasteAfter | EditKind::PasteBefore => {
            let side = if kind == EditKind::PasteAfter {
                PasteSide::After
            } else {
                PasteSide::Before
            };
            match env.buf.paste(register, side, count) {
                Ok(pos) => {
                    let pos = env.buf.text().clamp_normal(pos);
                    env.buf.set_cursor_clamped(pos);
                    DispatchResult::Done
                }
                Err(e) => {
                    env.bell();
                    env.error(e.to_string());
                    DispatchResult::Failed
                }
            }
        }
        EditKind::ToggleCase => toggle_case(env, cursor, len, count),
        EditKind::ReplaceChar(Some(ch)) => replace_chars(env, cursor, len, count, ch),
        EditKind::ReplaceChar(None) => {
            env.bell();
            DispatchResult::Failed
        }
    }
}

fn charwise(start: Position, end_col: usize) -> Span {
    Span {
        start,
        end: Position::new(start.line, end_col),
        linewise: false,
    }
}

fn toggle_case(env: &mut Env, cursor: Position, len: usize, count: usize) -> DispatchResult {
    if len == 0 {
        env.bell();
        return DispatchResult::Failed;
    }
    let end = Position::new(cursor.line, (cursor.col + count).min(len));
    let mut toggled = String::new();
    for c in env.buf.text().slice(cursor, end).chars() {
        if c.is_lowercase() {
            toggled.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            toggled.extend(c.to_lowercase());
        } else {
            toggled.push(c);
        }
    }
    match env.buf.replace_range(cursor, end, &toggled) {
        Ok(after) => {
            let pos = env.buf.text().clamp_normal(after);
            env.buf.set_cursor_clamped(pos);
            DispatchResult::Done
        }
        Err(e) => {
            env.buffer_error(e);
            DispatchResult::Failed
        }
    }
}

/// `r<ch>` over `count` chars; `r<CR>` replaces them with a single line break.
fn replace_chars(env: &mut Env, cursor: Position, len: usize, count: usize, ch: char) -> DispatchResult {
    if cursor.col + count > len {
        env.bell();
        return DispatchResult::Failed;
    }
    let end = Position::new(cursor.line, cursor.col + count);
    let (text, dest) = if ch == '\n' || ch == '\r' {
        ("\n".to_string(), None)
    } else {
        (ch.to_string().repeat(count), Some(Position::new(cursor.line, cursor.col + count - 1)))
    };
    if let Err(e) = env.buf.replace_range(cursor, end, &text) {
        env.buffer_error(e);
        return DispatchResult::Failed;
    }
    let dest = dest.unwrap_or_else(|| {
        let l = cursor.line + 1;
        Position::new(l, first_non_blank(env.buf.text(), l))
    });
    let dest = env.buf.text().clamp_normal(dest);
    env.buf.set_cursor_clamped(dest);
    DispatchResult::Done
}
