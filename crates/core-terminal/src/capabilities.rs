//! Which standard streams are terminals, and what that means for where keys
//! come from and where the screen goes.
//!
//! Detection runs once at startup. The decision itself is a pure function of
//! the probed flags so it can be tested without a terminal.

use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalCapabilities {
    pub stdin_tty: bool,
    pub stdout_tty: bool,
}

/// How the editor is wired to the outside world for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Keys from the terminal via crossterm; screen to stdout, or to
    /// `/dev/tty` when stdout is redirected.
    Interactive { screen_on_tty: bool },
    /// Keys decoded from piped stdin; no visible screen.
    PipeFilter,
    /// The buffer is read from piped stdin; keys come from the controlling
    /// terminal and the screen goes to `/dev/tty` when stdout is redirected.
    StdinBuffer { screen_on_tty: bool },
}

impl TerminalCapabilities {
    pub fn detect() -> Self {
        Self {
            stdin_tty: std::io::stdin().is_terminal(),
            stdout_tty: std::io::stdout().is_terminal(),
        }
    }

    /// `reads_stdin_buffer` is true when no file was named, or `-` was.
    pub fn launch_mode(&self, reads_stdin_buffer: bool) -> LaunchMode {
        let screen_on_tty = !self.stdout_tty;
        if self.stdin_tty {
            LaunchMode::Interactive { screen_on_tty }
        } else if reads_stdin_buffer {
            LaunchMode::StdinBuffer { screen_on_tty }
        } else {
            LaunchMode::PipeFilter
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(stdin_tty: bool, stdout_tty: bool) -> TerminalCapabilities {
        TerminalCapabilities {
            stdin_tty,
            stdout_tty,
        }
    }

    #[test]
    fn terminal_stdin_is_interactive() {
        assert_eq!(
            caps(true, true).launch_mode(true),
            LaunchMode::Interactive {
                screen_on_tty: false
            }
        );
        assert_eq!(
            caps(true, false).launch_mode(false),
            LaunchMode::Interactive { screen_on_tty: true }
        );
    }

    #[test]
    fn piped_stdin_with_files_is_a_filter() {
        assert_eq!(caps(false, false).launch_mode(false), LaunchMode::PipeFilter);
    }

    #[test]
    fn piped_stdin_without_files_is_the_buffer() {
        assert_eq!(
            caps(false, false).launch_mode(true),
            LaunchMode::StdinBuffer { screen_on_tty: true }
        );
    }
}
