//! Screen keys and buffer status: `⌃F ⌃B ⌃E ⌃Y z ⌃G m`.

use super::{DispatchResult, Env};
use core_state::{Placement, TextBuffer};
use core_text::Position;
use core_text::motion::first_non_blank;

/// `⌃F`/`⌃B`: whole screens, landing on the first non-blank.
pub(crate) fn page(env: &mut Env, pages: isize) -> DispatchResult {
    let lines = env.buf.line_count();
    if !env.viewport.page(pages, lines) {
        env.bell();
        return DispatchResult::Failed;
    }
    let line = env.viewport.cursor_into_view(env.buf.cursor().line).min(lines - 1);
    let col = first_non_blank(env.buf.text(), line);
    env.buf.set_cursor_clamped(Position::new(line, col));
    DispatchResult::Done
}

/// `⌃E`/`⌃Y`: the cursor only moves when it would leave the screen.
pub(crate) fn scroll(env: &mut Env, delta: isize) -> DispatchResult {
    let lines = env.buf.line_count();
    if !env.viewport.scroll(delta, lines) {
        env.bell();
        return DispatchResult::Failed;
    }
    let cursor = env.buf.cursor();
    let line = env.viewport.cursor_into_view(cursor.line).min(lines - 1);
    if line != cursor.line {
        let pos = env.buf.text().clamp_normal(Position::new(line, cursor.col));
        env.buf.set_cursor_clamped(pos);
    }
    DispatchResult::Done
}

/// `zt z. zb`; a count first moves the cursor to that line.
pub(crate) fn place(env: &mut Env, placement: Placement, count: Option<usize>) -> DispatchResult {
    if let Some(n) = count {
        let line = (n.max(1) - 1).min(env.buf.text().last_line());
        let col = first_non_blank(env.buf.text(), line);
        env.buf.set_cursor_clamped(Position::new(line, col));
    }
    env.viewport.place(env.buf.cursor().line, placement);
    DispatchResult::Done
}

pub(crate) fn set_mark(env: &mut Env, name: Option<char>) -> DispatchResult {
    let Some(name) = name else {
        env.bell();
        return DispatchResult::Failed;
    };
    let cursor = env.buf.cursor();
    match env.buf.set_mark(name, cursor) {
        Ok(()) => DispatchResult::Done,
        Err(e) => {
            env.bell();
            env.error(e.to_string());
            DispatchResult::Failed
        }
    }
}

/// `⌃G`: `"name" [Modified] line 3 of 10 --30%--`.
pub(crate) fn file_info(env: &mut Env) -> DispatchResult {
    let text = file_status(env.buf);
    env.info(text);
    DispatchResult::Done
}

pub(crate) fn file_status(buf: &TextBuffer) -> String {
    let name = buf
        .meta
        .target
        .as_ref()
        .map_or_else(|| "[No Name]".to_string(), |t| t.display_name());
    let modified = if buf.is_dirty() { " [Modified]" } else { "" };
    let line = buf.cursor().line + 1;
    let total = buf.line_count();
    let pct = line * 100 / total.max(1);
    format!("\"{name}\"{modified} line {line} of {total} --{pct}%--")
}
