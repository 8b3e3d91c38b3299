//! Status row composition.
//!
//! A two-stage pipeline: [`compose_status`] picks the ordered segments for
//! the current state, [`format_status`] lays them out in the available cells.
//!
//! Layout when no command line is open:
//! `<message or mode label> ........ <pending keys>  <line>,<col>`
//! The left side wins when space runs out. An open `:`/`/`/`?` line replaces
//! the whole row.

use core_actions::Mode;
use core_text::width::{line_cells, render_line};

/// What the status row needs to know.
pub struct StatusContext<'a> {
    pub mode: &'a Mode,
    /// Prompt plus typed text, when a command line is open.
    pub command_line: Option<&'a str>,
    pub message: Option<&'a str>,
    /// Keys of the unfinished Normal-mode command.
    pub pending: &'a str,
    pub line: usize, // 0-based
    pub col: usize,  // 0-based char column
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSegment<'a> {
    CommandLine(&'a str),
    Message(&'a str),
    ModeLabel(&'static str),
    Pending(&'a str),
    Position { line_1: usize, col_1: usize },
}

impl StatusSegment<'_> {
    fn is_left(&self) -> bool {
        matches!(
            self,
            StatusSegment::CommandLine(_) | StatusSegment::Message(_) | StatusSegment::ModeLabel(_)
        )
    }

    fn text(&self) -> String {
        match self {
            StatusSegment::CommandLine(s) | StatusSegment::Message(s) | StatusSegment::Pending(s) => s.to_string(),
            StatusSegment::ModeLabel(s) => s.to_string(),
            StatusSegment::Position { line_1, col_1 } => format!("{line_1},{col_1}"),
        }
    }
}

fn mode_label(mode: &Mode) -> Option<&'static str> {
    match mode {
        Mode::Insert => Some("-- INSERT --"),
        Mode::Replace => Some("-- REPLACE --"),
        _ => None,
    }
}

pub fn compose_status<'a>(ctx: &StatusContext<'a>) -> Vec<StatusSegment<'a>> {
    if let Some(line) = ctx.command_line {
        return vec![StatusSegment::CommandLine(line)];
    }
    let mut out = Vec::with_capacity(3);
    if let Some(msg) = ctx.message.filter(|m| !m.is_empty()) {
        out.push(StatusSegment::Message(msg));
    } else if let Some(label) = mode_label(ctx.mode) {
        out.push(StatusSegment::ModeLabel(label));
    }
    if !ctx.pending.is_empty() {
        out.push(StatusSegment::Pending(ctx.pending));
    }
    out.push(StatusSegment::Position {
        line_1: ctx.line + 1,
        col_1: ctx.col + 1,
    });
    out
}

/// Lay segments out in `width - 1` cells.
pub fn format_status(segments: &[StatusSegment<'_>], width: u16) -> String {
    let budget = (width as usize).saturating_sub(1);
    let left: String = segments
        .iter()
        .filter(|s| s.is_left())
        .map(StatusSegment::text)
        .collect();
    let right = segments
        .iter()
        .filter(|s| !s.is_left())
        .map(StatusSegment::text)
        .collect::<Vec<_>>()
        .join("  ");

    let left = render_line(&left, budget);
    let used = line_cells(&left);
    let right_cells = line_cells(&right);
    if right.is_empty() || used + 2 + right_cells > budget {
        return left;
    }
    let mut s = left;
    s.extend(std::iter::repeat_n(' ', budget - used - right_cells));
    s.push_str(&right);
    s
}

pub fn build_status(ctx: &StatusContext, width: u16) -> String {
    format_status(&compose_status(ctx), width)
}
