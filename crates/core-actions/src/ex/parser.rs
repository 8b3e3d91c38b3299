//! Ex command-line parsing: `[range]command[!][args]`.

use super::ExError;
use super::address::{RangeSpec, Scanner, parse_range};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandName {
    Write,
    Quit,
    WriteQuit,
    Xit,
    Next,
    WriteNext,
    Edit,
    Substitute,
    RepeatSubstitute,
    Delete,
    Yank,
    Join,
    Global,
    VGlobal,
    Undo,
    Redo,
    Set,
    LineNumber,
    Visual,
}

/// Full name, shortest accepted abbreviation, command.
const COMMANDS: &[(&str, usize, CommandName)] = &[
    ("write", 1, CommandName::Write),
    ("wq", 2, CommandName::WriteQuit),
    ("wnext", 2, CommandName::WriteNext),
    ("quit", 1, CommandName::Quit),
    ("xit", 1, CommandName::Xit),
    ("next", 1, CommandName::Next),
    ("edit", 1, CommandName::Edit),
    ("substitute", 1, CommandName::Substitute),
    ("delete", 1, CommandName::Delete),
    ("yank", 1, CommandName::Yank),
    ("join", 1, CommandName::Join),
    ("global", 1, CommandName::Global),
    ("vglobal", 1, CommandName::VGlobal),
    ("undo", 1, CommandName::Undo),
    ("redo", 3, CommandName::Redo),
    ("set", 2, CommandName::Set),
    ("visual", 2, CommandName::Visual),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExCommand {
    pub range: RangeSpec,
    /// `None` for a bare address (`:12`).
    pub name: Option<CommandName>,
    pub bang: bool,
    pub args: String,
}

fn lookup(word: &str) -> Option<CommandName> {
    COMMANDS
        .iter()
        .find(|(full, min, _)| word.len() >= *min && full.starts_with(word))
        .map(|(_, _, name)| *name)
}

pub(crate) fn parse(line: &str) -> Result<ExCommand, ExError> {
    let mut sc = Scanner::new(line);
    let range = parse_range(&mut sc)?;
    sc.skip_blanks();
    let name = match sc.peek() {
        None => None,
        Some('&') => {
            sc.bump();
            Some(CommandName::RepeatSubstitute)
        }
        Some('=') => {
            sc.bump();
            Some(CommandName::LineNumber)
        }
        Some(c) if c.is_ascii_alphabetic() => {
            let word = sc.take_while(|c| c.is_ascii_alphabetic());
            // `:d` and `:y` may have a register letter glued on (`:da`).
            match lookup(&word) {
                Some(name) => Some(name),
                None => {
                    let (name, rest) = split_known_prefix(&word).ok_or_else(|| ExError::Unknown(word.clone()))?;
                    sc = Scanner::new(&format!("{rest}{}", sc.rest()));
                    Some(name)
                }
            }
        }
        Some(c) => return Err(ExError::Unknown(c.to_string())),
    };
    let bang = name.is_some() && sc.eat('!');
    let args = sc.rest();
    let args = match name {
        Some(CommandName::Substitute | CommandName::Global | CommandName::VGlobal) => args.trim_end().to_string(),
        _ => args.trim().to_string(),
    };
    Ok(ExCommand {
        range,
        name,
        bang,
        args,
    })
}

/// `dx` -> (`delete`, "x"): the single-letter commands that take an
/// argument glued to their name.
fn split_known_prefix(word: &str) -> Option<(CommandName, String)> {
    let mut chars = word.chars();
    let first = chars.next()?;
    let name = match first {
        'd' => CommandName::Delete,
        'y' => CommandName::Yank,
        _ => return None,
    };
    Some((name, format!(" {}", chars.as_str())))
}
