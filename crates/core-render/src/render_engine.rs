//! Frame emission through a [`TerminalDriver`].

use crate::Frame;
use crate::partial_cache::PartialCache;
use anyhow::Result;
use core_terminal::TerminalDriver;
use std::time::Instant;
use tracing::trace;

/// What the engine actually did, as opposed to what was asked of it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderPathMetrics {
    pub full_frames: u64,
    pub partial_frames: u64,
    /// Rows written to the driver across all frames.
    pub rows_repainted: u64,
    /// Rows left alone because they matched the previous frame.
    pub rows_skipped: u64,
    pub last_render_ns: u64,
}

#[derive(Debug, Default)]
pub struct RenderEngine {
    cache: PartialCache,
    metrics: RenderPathMetrics,
    last_repaint: Vec<usize>,
}

impl RenderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the next frame to clear and repaint every row.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    pub fn render<D: TerminalDriver + ?Sized>(&mut self, driver: &mut D, frame: &Frame) -> Result<()> {
        let start = Instant::now();
        let full = !self.cache.is_warm_for(frame.width, frame.height());
        if full {
            driver.clear()?;
        }
        self.last_repaint.clear();
        for (row, text) in frame.rows.iter().enumerate() {
            if full || self.cache.row_changed(row, text) {
                driver.write(row as u16, 0, text)?;
                self.last_repaint.push(row);
            }
        }
        driver.move_cursor(frame.cursor.0, frame.cursor.1)?;
        driver.flush()?;
        self.cache.store(frame.width, &frame.rows);

        let repainted = self.last_repaint.len() as u64;
        let m = &mut self.metrics;
        if full {
            m.full_frames += 1;
        } else {
            m.partial_frames += 1;
        }
        m.rows_repainted += repainted;
        m.rows_skipped += frame.rows.len() as u64 - repainted;
        m.last_render_ns = start.elapsed().as_nanos() as u64;
        trace!(target: "render", full, repainted, ns = m.last_render_ns, "frame");
        Ok(())
    }

    pub fn metrics(&self) -> RenderPathMetrics {
        self.metrics
    }

    /// Rows written by the most recent frame.
    pub fn last_repaint_rows(&self) -> &[usize] {
        &self.last_repaint
    }
}
