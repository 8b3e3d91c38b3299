//! Frame composition: session state in, formatted rows out.

use crate::Frame;
use crate::status::{StatusContext, build_status};
use core_actions::{FileStore, Mode, Session};
use core_state::TextBuffer;
use core_text::width::{cell_col, line_cells, render_line};

const FILLER: &str = "~";
const MIN_NUMBER_WIDTH: usize = 3;

/// Borrowed snapshot of everything a frame shows.
pub struct View<'a> {
    pub buffer: &'a TextBuffer,
    pub top: usize,
    pub number: bool,
    pub mode: Mode,
    pub command_line: Option<String>,
    pub message: Option<&'a str>,
    pub pending: &'a str,
}

impl<'a> View<'a> {
    pub fn of<S: FileStore>(session: &'a Session<S>) -> Self {
        Self {
            buffer: session.buffer(),
            top: session.viewport().top,
            number: session.settings().number,
            mode: session.mode(),
            command_line: session.command_line(),
            message: session.message().map(|m| m.text.as_str()),
            pending: session.pending_keys(),
        }
    }

    /// Cells taken by the `:set number` gutter, including its trailing blank.
    fn gutter(&self) -> usize {
        if !self.number {
            return 0;
        }
        let digits = self.buffer.line_count().to_string().len();
        digits.max(MIN_NUMBER_WIDTH) + 1
    }
}

pub fn compose(view: &View, width: u16, height: u16) -> Frame {
    let width = width.max(1);
    let height = height.max(1);
    let text_rows = height as usize - 1;
    let gutter = view.gutter();
    let text = view.buffer.text();

    let mut rows = Vec::with_capacity(height as usize);
    for r in 0..text_rows {
        let row = match text.line(view.top + r) {
            Some(line) if gutter > 0 => {
                let number = format!("{:>w$} ", view.top + r + 1, w = gutter - 1);
                let mut row = render_line(&number, width as usize);
                row.push_str(&render_line(&line, (width as usize).saturating_sub(gutter)));
                row
            }
            Some(line) => render_line(&line, width as usize),
            None => FILLER.to_string(),
        };
        rows.push(row);
    }

    let pos = view.buffer.cursor();
    let status = StatusContext {
        mode: &view.mode,
        command_line: view.command_line.as_deref(),
        message: view.message,
        pending: view.pending,
        line: pos.line,
        col: pos.col,
    };
    rows.push(build_status(&status, width));

    let cursor = match &view.command_line {
        Some(cmd) => {
            let budget = (width as usize).saturating_sub(1);
            (height - 1, line_cells(cmd).min(budget) as u16)
        }
        None => {
            let row = pos.line.saturating_sub(view.top).min(text_rows.saturating_sub(1));
            let line = text.line(pos.line).unwrap_or_default();
            let typing = matches!(view.mode, Mode::Insert | Mode::Replace);
            // Off insert, the cursor sits on the last cell of a tab.
            let cells = if !typing && line.chars().nth(pos.col) == Some('\t') {
                cell_col(&line, pos.col + 1) - 1
            } else {
                cell_col(&line, pos.col)
            };
            let col = (gutter + cells).min(width as usize - 1);
            (row as u16, col as u16)
        }
    };

    Frame { width, rows, cursor }
}
