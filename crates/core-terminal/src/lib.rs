//! Terminal drivers: the editor's only contact with a real screen.
//!
//! The session and renderer talk to a [`TerminalDriver`]. [`CrosstermBackend`]
//! owns raw mode and the alternate screen; [`HeadlessDriver`] feeds keys from
//! a byte stream or a script and keeps an in-memory screen grid.

use anyhow::{Context, Result};
use core_events::KeyEvent;
use core_input::{TerminalInput, translate_event};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event, execute, queue,
    style::Print,
    terminal::{
        self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
        enable_raw_mode,
    },
};
use std::fs::OpenOptions;
use std::io::{Write, stdout};
use tracing::{debug, warn};

pub mod capabilities;
mod headless;

pub use capabilities::{LaunchMode, TerminalCapabilities};
pub use headless::{HeadlessDriver, ScreenGrid};

/// One unit of input from a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Key(KeyEvent),
    Resize { cols: u16, rows: u16 },
}

pub trait TerminalDriver {
    /// Block for the next input. `None` means the key source is exhausted.
    fn next_input(&mut self) -> Result<Option<Input>>;
    /// `(columns, rows)`.
    fn size(&self) -> (u16, u16);
    /// Put `text` at `(row, col)` and clear the rest of that row.
    fn write(&mut self, row: u16, col: u16, text: &str) -> Result<()>;
    fn move_cursor(&mut self, row: u16, col: u16) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
    fn bell(&mut self) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
}

/// Crossterm driver. Raw mode and the alternate screen are undone on drop,
/// so an early return or a panic still restores the terminal.
pub struct CrosstermBackend {
    out: Box<dyn Write>,
    entered: bool,
    size: (u16, u16),
}

impl CrosstermBackend {
    /// With `screen_on_tty` the screen goes to `/dev/tty`, leaving stdout
    /// free for a saved buffer.
    pub fn new(screen_on_tty: bool) -> Result<Self> {
        let out: Box<dyn Write> = if screen_on_tty {
            let tty = OpenOptions::new()
                .write(true)
                .open("/dev/tty")
                .context("opening /dev/tty for the screen")?;
            Box::new(tty)
        } else {
            Box::new(stdout())
        };
        let size = terminal::size().context("querying terminal size")?;
        Ok(Self {
            out,
            entered: false,
            size,
        })
    }

    pub fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode().context("enabling raw mode")?;
            execute!(self.out, EnterAlternateScreen, Clear(ClearType::All))?;
            self.entered = true;
            debug!(target: "runtime", cols = self.size.0, rows = self.size.1, "terminal_enter");
        }
        Ok(())
    }

    pub fn leave(&mut self) -> Result<()> {
        if self.entered {
            execute!(self.out, LeaveAlternateScreen, Show)?;
            disable_raw_mode()?;
            self.entered = false;
            debug!(target: "runtime", "terminal_leave");
        }
        Ok(())
    }
}

impl TerminalDriver for CrosstermBackend {
    fn next_input(&mut self) -> Result<Option<Input>> {
        loop {
            let ev = event::read().context("reading terminal event")?;
            match translate_event(&ev) {
                TerminalInput::Key(key) => return Ok(Some(Input::Key(key))),
                TerminalInput::Resize(cols, rows) => {
                    self.size = (cols, rows);
                    return Ok(Some(Input::Resize { cols, rows }));
                }
                TerminalInput::Ignored => continue,
            }
        }
    }

    fn size(&self) -> (u16, u16) {
        self.size
    }

    fn write(&mut self, row: u16, col: u16, text: &str) -> Result<()> {
        queue!(
            self.out,
            Hide,
            MoveTo(col, row),
            Print(text),
            Clear(ClearType::UntilNewLine)
        )?;
        Ok(())
    }

    fn move_cursor(&mut self, row: u16, col: u16) -> Result<()> {
        queue!(self.out, MoveTo(col, row), Show)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        queue!(self.out, Clear(ClearType::All))?;
        Ok(())
    }

    fn bell(&mut self) -> Result<()> {
        queue!(self.out, Print('\u{7}'))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        if let Err(e) = self.leave() {
            warn!(target: "runtime", error = %e, "terminal_restore_failed");
        }
    }
}
