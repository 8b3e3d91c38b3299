use crate::{Input, TerminalDriver};
use anyhow::Result;
use core_events::KeyEvent;
use core_input::KeyDecoder;
use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
use unicode_width::UnicodeWidthChar;

/// Marks the second cell of a double-width char.
const CONTINUATION: char = '\0';

/// In-memory screen: what a headless run would have shown.
#[derive(Debug, Clone)]
pub struct ScreenGrid {
    cols: u16,
    cells: Vec<Vec<char>>,
    cursor: (u16, u16),
}

impl ScreenGrid {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            cells: vec![vec![' '; cols as usize]; rows as usize],
            cursor: (0, 0),
        }
    }

    /// Row contents with trailing blanks trimmed.
    pub fn row_text(&self, row: u16) -> String {
        self.cells
            .get(row as usize)
            .map(|cells| {
                let s: String = cells.iter().filter(|c| **c != CONTINUATION).collect();
                s.trim_end().to_string()
            })
            .unwrap_or_default()
    }

    pub fn rows(&self) -> Vec<String> {
        (0..self.cells.len() as u16).map(|r| self.row_text(r)).collect()
    }

    /// `(row, col)`.
    pub fn cursor(&self) -> (u16, u16) {
        self.cursor
    }

    fn put(&mut self, row: u16, col: u16, text: &str) {
        let width = self.cols as usize;
        let Some(cells) = self.cells.get_mut(row as usize) else {
            return;
        };
        let mut at = col as usize;
        for c in text.chars() {
            let w = c.width().unwrap_or(0);
            if w == 0 {
                continue;
            }
            if at + w > width {
                break;
            }
            cells[at] = c;
            if w == 2 {
                cells[at + 1] = CONTINUATION;
            }
            at += w;
        }
        for cell in cells.iter_mut().skip(at) {
            *cell = ' ';
        }
    }

    fn clear(&mut self) {
        for row in &mut self.cells {
            row.fill(' ');
        }
    }
}

/// Driver without a terminal: keys come from a byte stream (pipe filter
/// mode) or a fixed script (tests), and output lands in a [`ScreenGrid`].
pub struct HeadlessDriver {
    keys: Box<dyn Iterator<Item = io::Result<KeyEvent>>>,
    screen: ScreenGrid,
    interrupt: Option<Arc<AtomicBool>>,
    bells: usize,
}

impl HeadlessDriver {
    pub fn from_reader<R: Read + 'static>(reader: R, cols: u16, rows: u16) -> Self {
        Self::from_keys(Box::new(KeyDecoder::new(reader)), cols, rows)
    }

    pub fn scripted(keys: Vec<KeyEvent>, cols: u16, rows: u16) -> Self {
        Self::from_keys(Box::new(keys.into_iter().map(Ok)), cols, rows)
    }

    fn from_keys(keys: Box<dyn Iterator<Item = io::Result<KeyEvent>>>, cols: u16, rows: u16) -> Self {
        Self {
            keys,
            screen: ScreenGrid::new(cols, rows),
            interrupt: None,
            bells: 0,
        }
    }

    /// A raised flag is delivered as `⌃C` before the next key is read.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn screen(&self) -> &ScreenGrid {
        &self.screen
    }

    pub fn bells(&self) -> usize {
        self.bells
    }
}

impl TerminalDriver for HeadlessDriver {
    fn next_input(&mut self) -> Result<Option<Input>> {
        if let Some(flag) = &self.interrupt
            && flag.swap(false, Ordering::SeqCst)
        {
            debug!(target: "runtime", "interrupt_delivered");
            return Ok(Some(Input::Key(KeyEvent::ctrl('c'))));
        }
        match self.keys.next() {
            Some(key) => Ok(Some(Input::Key(key?))),
            None => Ok(None),
        }
    }

    fn size(&self) -> (u16, u16) {
        (self.screen.cols, self.screen.cells.len() as u16)
    }

    fn write(&mut self, row: u16, col: u16, text: &str) -> Result<()> {
        self.screen.put(row, col, text);
        Ok(())
    }

    fn move_cursor(&mut self, row: u16, col: u16) -> Result<()> {
        self.screen.cursor = (row, col);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.screen.clear();
        Ok(())
    }

    fn bell(&mut self) -> Result<()> {
        self.bells += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::KeyCode;
    use pretty_assertions::assert_eq;

    #[test]
    fn reader_keys_then_end_of_input() {
        let mut d = HeadlessDriver::from_reader(&b"ix\x1b"[..], 10, 3);
        assert_eq!(d.next_input().unwrap(), Some(Input::Key(KeyEvent::char('i'))));
        assert_eq!(d.next_input().unwrap(), Some(Input::Key(KeyEvent::char('x'))));
        assert_eq!(
            d.next_input().unwrap(),
            Some(Input::Key(KeyEvent::plain(KeyCode::Esc)))
        );
        assert_eq!(d.next_input().unwrap(), None);
    }

    #[test]
    fn interrupt_flag_becomes_ctrl_c_once() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut d = HeadlessDriver::scripted(vec![KeyEvent::char('j')], 10, 3).with_interrupt(flag.clone());
        assert_eq!(d.next_input().unwrap(), Some(Input::Key(KeyEvent::ctrl('c'))));
        assert!(!flag.load(Ordering::SeqCst));
        assert_eq!(d.next_input().unwrap(), Some(Input::Key(KeyEvent::char('j'))));
    }

    #[test]
    fn write_clears_rest_of_row_and_truncates() {
        let mut d = HeadlessDriver::scripted(Vec::new(), 6, 2);
        d.write(0, 0, "abcdef").unwrap();
        d.write(0, 2, "X").unwrap();
        assert_eq!(d.screen().row_text(0), "abX");
        d.write(1, 0, "0123456789").unwrap();
        assert_eq!(d.screen().row_text(1), "012345");
    }

    #[test]
    fn wide_chars_take_two_cells() {
        let mut d = HeadlessDriver::scripted(Vec::new(), 5, 1);
        d.write(0, 0, "漢字x").unwrap();
        assert_eq!(d.screen().row_text(0), "漢字x");
        d.write(0, 0, "漢字漢").unwrap();
        assert_eq!(d.screen().row_text(0), "漢字");
    }

    #[test]
    fn bell_and_cursor_are_tracked() {
        let mut d = HeadlessDriver::scripted(Vec::new(), 5, 2);
        d.bell().unwrap();
        d.move_cursor(1, 3).unwrap();
        assert_eq!(d.bells(), 1);
        assert_eq!(d.screen().cursor(), (1, 3));
        assert_eq!(d.size(), (5, 2));
    }
}
