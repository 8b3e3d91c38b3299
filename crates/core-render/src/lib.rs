//! Screen composition and partial repaint.
//!
//! Rendering happens in two stages:
//! 1. [`compose`] turns a [`View`] of the session into a [`Frame`]: one
//!    already-formatted string per screen row (text rows, `~` filler, and the
//!    status row last) plus the cursor cell.
//! 2. [`RenderEngine`] writes that frame through a
//!    [`core_terminal::TerminalDriver`], repainting only rows whose text
//!    differs from the previous frame.
//!
//! Invariants:
//! - `Frame::rows.len()` equals the screen height; no row is wider than the
//!   screen.
//! - The status row never writes the lower-right cell, so terminals that
//!   scroll on that cell stay put.
//! - Long buffer lines are cut at the right edge, never wrapped, so buffer
//!   line `top + r` is always screen row `r`.

pub mod compose;
pub mod partial_cache;
pub mod render_engine;
pub mod status;

pub use compose::{View, compose};
pub use render_engine::{RenderEngine, RenderPathMetrics};
pub use status::{StatusContext, StatusSegment, build_status};

/// One composed screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u16,
    /// Row text, top to bottom; the last row is the status row.
    pub rows: Vec<String>,
    /// `(row, col)` in screen cells.
    pub cursor: (u16, u16),
}

impl Frame {
    pub fn height(&self) -> u16 {
        self.rows.len() as u16
    }

    pub fn status(&self) -> &str {
        self.rows.last().map(String::as_str).unwrap_or("")
    }
}
