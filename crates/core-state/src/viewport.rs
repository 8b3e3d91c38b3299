//! Vertical window into the focused buffer.
//!
//! * `top` is the index of the topmost buffer line to render.
//! * `height` is the number of screen rows available for buffer text (the
//!   status row is excluded).

use core_text::motion::VisibleRows;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub top: usize,
    pub height: usize,
}

/// Where `zt`, `z.` and `zb` put the cursor line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Top,
    Center,
    Bottom,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0, 23)
    }
}

impl Viewport {
    pub fn new(top: usize, height: usize) -> Self {
        Self {
            top,
            height: height.max(1),
        }
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height.max(1);
    }

    pub fn bottom(&self) -> usize {
        self.top + self.height - 1
    }

    pub fn visible(&self) -> VisibleRows {
        VisibleRows {
            top: self.top,
            height: self.height,
        }
    }

    /// Shift `top` the least amount that keeps `cursor_line` visible.
    pub fn clamp_cursor_into_view(&mut self, cursor_line: usize) {
        if cursor_line < self.top {
            self.top = cursor_line;
        } else if cursor_line > self.bottom() {
            self.top = cursor_line + 1 - self.height;
        }
    }

    pub fn place(&mut self, cursor_line: usize, placement: Placement) {
        self.top = match placement {
            Placement::Top => cursor_line,
            Placement::Center => cursor_line.saturating_sub(self.height / 2),
            Placement::Bottom => cursor_line.saturating_sub(self.height - 1),
        };
    }

    /// Scroll by `delta` lines (`⌃E`/`⌃Y`), keeping at least the last line
    /// on screen. Returns false when already at the limit.
    pub fn scroll(&mut self, delta: isize, line_count: usize) -> bool {
        let max_top = line_count.saturating_sub(1);
        let next = if delta < 0 {
            self.top.saturating_sub(delta.unsigned_abs())
        } else {
            (self.top + delta as usize).min(max_top)
        };
        let moved = next != self.top;
        self.top = next;
        moved
    }

    /// Scroll by whole screens (`⌃F`/`⌃B`), keeping two lines of context.
    pub fn page(&mut self, pages: isize, line_count: usize) -> bool {
        let step = self.height.saturating_sub(2).max(1) as isize;
        self.scroll(pages * step, line_count)
    }

    /// Move `cursor_line` the least amount needed to be on screen again.
    pub fn cursor_into_view(&self, cursor_line: usize) -> usize {
        cursor_line.clamp(self.top, self.bottom())
    }
}
