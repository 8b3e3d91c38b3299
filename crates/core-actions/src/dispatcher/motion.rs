//! Motion sub-dispatch (cursor movement).
//!
//! Motions resolve through `core_text::motion`, except mark jumps which need
//! the buffer's mark table. The sticky column lives in [`MotionMemory`]:
//! `j`/`k` keep aiming at it, `$` pins it to line ends, anything else drops it.

use super::{DispatchResult, Env, MotionMemory};
use crate::MotionSpec;
use core_state::PREVIOUS_CONTEXT;
use core_text::Position;
use core_text::motion::{self, FindSpec, Motion, MotionContext, MotionKind, MotionOutcome, Target};
use tracing::trace;

/// Where `spec` lands from the cursor, or `None` when it has nowhere to go.
pub(crate) fn resolve_target(
    env: &Env,
    spec: MotionSpec,
    count: Option<usize>,
    mem: &MotionMemory,
    for_operator: bool,
) -> Option<Target> {
    let cursor = env.buf.cursor();
    match spec {
        MotionSpec::Basic(m) => {
            let ctx = MotionContext {
                count,
                last_find: mem.last_find,
                sticky_col: mem.sticky_col,
                visible: Some(env.viewport.visible()),
                for_operator,
            };
            match motion::resolve(env.buf.text(), cursor, m, &ctx) {
                MotionOutcome::Resolved(t) => Some(t),
                MotionOutcome::NeedsChar | MotionOutcome::NoTarget => None,
            }
        }
        MotionSpec::Mark { name: Some(name), exact } => {
            let pos = env.buf.get_mark(name)?;
            Some(if exact {
                Target {
                    pos,
                    kind: MotionKind::Exclusive,
                }
            } else {
                Target {
                    pos: Position::new(pos.line, motion::first_non_blank(env.buf.text(), pos.line)),
                    kind: MotionKind::Linewise,
                }
            })
        }
        MotionSpec::Mark { name: None, .. } => None,
    }
}

/// `f t F T` with their char become the target of `;` and `,`.
pub(crate) fn remember_find(spec: MotionSpec, mem: &mut MotionMemory) {
    if let MotionSpec::Basic(Motion::Find {
        forward,
        till,
        ch: Some(ch),
    }) = spec
    {
        mem.last_find = Some(FindSpec { forward, till, ch });
    }
}

pub(crate) fn is_jump(spec: MotionSpec) -> bool {
    match spec {
        MotionSpec::Basic(m) => m.is_jump(),
        MotionSpec::Mark { .. } => true,
    }
}

/// Record the previous-context mark before a jump away from `from`.
pub(crate) fn mark_jump(env: &mut Env, from: Position) {
    if let Err(e) = env.buf.set_mark(PREVIOUS_CONTEXT, from) {
        env.buffer_error(e);
    }
}

pub(crate) fn handle_move(
    env: &mut Env,
    spec: MotionSpec,
    count: Option<usize>,
    mem: &mut MotionMemory,
) -> DispatchResult {
    let from = env.buf.cursor();
    let target = resolve_target(env, spec, count, mem, false);
    remember_find(spec, mem);
    let Some(target) = target else {
        if let MotionSpec::Mark { name: Some(_), .. } = spec {
            env.error("Mark not set");
        }
        env.bell();
        return DispatchResult::Failed;
    };
    if is_jump(spec) {
        mark_jump(env, from);
    }
    mem.sticky_col = match spec {
        MotionSpec::Basic(m) if m.is_vertical() => Some(mem.sticky_col.unwrap_or(from.col)),
        MotionSpec::Basic(Motion::LineEnd) => Some(usize::MAX),
        _ => None,
    };
    let dest = env.buf.text().clamp_normal(target.pos);
    env.buf.set_cursor_clamped(dest);
    trace!(target: "actions.dispatch", ?spec, from = ?from, to = ?dest, "motion");
    DispatchResult::Done
}
