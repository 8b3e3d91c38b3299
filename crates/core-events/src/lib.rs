//! Key event types shared by every layer of the editor.
//!
//! Input sources (crossterm, the pipe byte decoder, test scripts) all produce
//! [`KeyEvent`] values; the interpreter never sees anything rawer than this.

use std::fmt;

mod notation;

pub use notation::{KeyNotationError, parse_keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

/// KeyCode enumerates normalized logical key representations consumed by higher layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const CTRL = 0b0000_0001;
        const ALT  = 0b0000_0010;
        const SHIFT= 0b0000_0100;
    }
}

impl KeyEvent {
    pub const fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        Self { code, mods }
    }

    /// Unmodified key.
    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::empty())
    }

    /// Printable character with no modifiers.
    pub const fn char(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    /// Control chord such as `⌃C`. The letter is stored lowercase.
    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c.to_ascii_lowercase()), KeyModifiers::CTRL)
    }

    /// True for `⌃<c>` (case-insensitive on the letter).
    pub fn is_ctrl(&self, c: char) -> bool {
        self.mods.contains(KeyModifiers::CTRL)
            && matches!(self.code, KeyCode::Char(k) if k.eq_ignore_ascii_case(&c))
    }

    /// The character this key types, if it is a plain (or shifted) printable key.
    pub fn printable(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c)
                if !self.mods.intersects(KeyModifiers::CTRL | KeyModifiers::ALT) =>
            {
                Some(c)
            }
            _ => None,
        }
    }

    /// True for the keys that abandon whatever is pending: `Esc` and `⌃C`.
    pub fn is_cancel(&self) -> bool {
        self.code == KeyCode::Esc || self.is_ctrl('c')
    }

    /// Character typed literally after `⌃V`: control chords map back to their
    /// C0 control character.
    pub fn literal_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) if self.mods.contains(KeyModifiers::CTRL) && c.is_ascii_alphabetic() => {
                char::from_u32(c.to_ascii_uppercase() as u32 - 0x40)
            }
            KeyCode::Char(c) => Some(c),
            KeyCode::Tab => Some('\t'),
            KeyCode::Enter => Some('\r'),
            KeyCode::Esc => Some('\u{1b}'),
            KeyCode::Backspace => Some('\u{7f}'),
            _ => None,
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.code {
            KeyCode::Char(c) if self.mods.contains(KeyModifiers::CTRL) => {
                return write!(f, "⌃{}", c.to_ascii_uppercase());
            }
            KeyCode::Char(c) => return write!(f, "{c}"),
            KeyCode::Enter => "Return",
            KeyCode::Esc => "Esc",
            KeyCode::Backspace => "Backspace",
            KeyCode::Tab => "Tab",
            KeyCode::Up => "Up",
            KeyCode::Down => "Down",
            KeyCode::Left => "Left",
            KeyCode::Right => "Right",
            KeyCode::Home => "Home",
            KeyCode::End => "End",
            KeyCode::PageUp => "PageUp",
            KeyCode::PageDown => "PageDown",
            KeyCode::Delete => "Delete",
        };
        f.write_str(name)
    }
}
