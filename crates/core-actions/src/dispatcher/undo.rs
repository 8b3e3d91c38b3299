//! Undo / redo. Both restore the cursor to where the change started.

use super::{DispatchResult, Env};
use tracing::trace;

pub(crate) fn handle_undo(env: &mut Env, count: usize) -> DispatchResult {
    step(env, count, false)
}

pub(crate) fn handle_redo(env: &mut Env, count: usize) -> DispatchResult {
    step(env, count, true)
}

fn step(env: &mut Env, count: usize, redo: bool) -> DispatchResult {
    let mut applied = 0;
    for _ in 0..count.max(1) {
        let ok = if redo { env.buf.redo() } else { env.buf.undo() };
        if !ok {
            break;
        }
        applied += 1;
    }
    trace!(target: "actions.dispatch", op = if redo { "redo" } else { "undo" }, applied, "history");
    if applied == 0 {
        env.bell();
        env.warn(if redo {
            "Already at newest change"
        } else {
            "Already at oldest change"
        });
        return DispatchResult::Failed;
    }
    let pos = env.buf.text().clamp_normal(env.buf.cursor());
    env.buf.set_cursor_clamped(pos);
    DispatchResult::Done
}
