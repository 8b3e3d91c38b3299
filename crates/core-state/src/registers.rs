//! Registers: unnamed, numbered ring, named `a`-`z`, and the black hole `_`.
//!
//! Every write mirrors into the unnamed register and pushes onto the numbered
//! ring (newest at index 0, capacity 10). Uppercase names append to their
//! lowercase slot. The black hole discards writes.

use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    Charwise,
    Linewise,
}

/// Register payload. Linewise text holds whole lines joined by `\n` with no
/// trailing terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterContent {
    pub text: String,
    pub kind: RegisterKind,
}

impl RegisterContent {
    pub fn charwise(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: RegisterKind::Charwise,
        }
    }

    pub fn linewise(lines: &[String]) -> Self {
        Self {
            text: lines.join("\n"),
            kind: RegisterKind::Linewise,
        }
    }

    pub fn is_linewise(&self) -> bool {
        self.kind == RegisterKind::Linewise
    }

    pub fn lines(&self) -> Vec<String> {
        self.text.split('\n').map(str::to_string).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterName {
    Unnamed,
    /// Numbered ring entry (0 newest).
    Numbered(usize),
    /// Named register; uppercase appends on write.
    Named(char),
    BlackHole,
}

impl RegisterName {
    pub fn parse(c: char) -> Option<Self> {
        match c {
            '"' => Some(Self::Unnamed),
            '0'..='9' => Some(Self::Numbered(c as usize - '0' as usize)),
            c if c.is_ascii_alphabetic() => Some(Self::Named(c)),
            '_' => Some(Self::BlackHole),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasteError {
    #[error("Nothing in register {0}")]
    Empty(char),
    #[error("Invalid register name {0:?}")]
    InvalidRegister(char),
}

#[derive(Debug, Clone)]
pub struct Registers {
    unnamed: Option<RegisterContent>,
    numbered: Vec<RegisterContent>,
    named: [Option<RegisterContent>; 26],
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    pub const MAX: usize = 10; // ring capacity

    pub fn new() -> Self {
        Self {
            unnamed: None,
            numbered: Vec::new(),
            named: std::array::from_fn(|_| None),
        }
    }

    pub fn write_yank(&mut self, content: RegisterContent, target: Option<char>) -> Result<(), PasteError> {
        self.write(content, target, "yank")
    }

    pub fn write_delete(&mut self, content: RegisterContent, target: Option<char>) -> Result<(), PasteError> {
        self.write(content, target, "delete")
    }

    fn write(&mut self, content: RegisterContent, target: Option<char>, op: &'static str) -> Result<(), PasteError> {
        let name = match target {
            None => RegisterName::Unnamed,
            Some(c) => RegisterName::parse(c).ok_or(PasteError::InvalidRegister(c))?,
        };
        trace!(target: "state.registers", op, ?name, len = content.text.len(), "write");
        let stored = match name {
            RegisterName::BlackHole => return Ok(()),
            RegisterName::Named(c) => {
                let slot = &mut self.named[Self::named_index(c)];
                let merged = match slot.take() {
                    Some(prev) if c.is_ascii_uppercase() => append(prev, content),
                    _ => content,
                };
                *slot = Some(merged.clone());
                merged
            }
            RegisterName::Unnamed | RegisterName::Numbered(_) => content,
        };
        self.unnamed = Some(stored.clone());
        if self.numbered.len() == Self::MAX {
            self.numbered.pop();
        }
        self.numbered.insert(0, stored);
        Ok(())
    }

    /// Retrieve paste payload for the given register (clone-on-read).
    pub fn read(&self, source: Option<char>) -> Result<RegisterContent, PasteError> {
        let label = source.unwrap_or('"');
        let name = RegisterName::parse(label).ok_or(PasteError::InvalidRegister(label))?;
        let entry = match name {
            RegisterName::Unnamed => self.unnamed.as_ref(),
            RegisterName::Numbered(i) => self.numbered.get(i),
            RegisterName::Named(c) => self.named[Self::named_index(c)].as_ref(),
            RegisterName::BlackHole => None,
        };
        entry.cloned().ok_or(PasteError::Empty(label))
    }

    /// Return immutable slice of numbered ring (newest first).
    pub fn numbered(&self) -> &[RegisterContent] {
        &self.numbered
    }

    fn named_index(c: char) -> usize {
        (c.to_ascii_lowercase() as u8 - b'a') as usize
    }
}

fn append(prev: RegisterContent, next: RegisterContent) -> RegisterContent {
    if prev.is_linewise() || next.is_linewise() {
        RegisterContent {
            text: format!("{}\n{}", prev.text, next.text),
            kind: RegisterKind::Linewise,
        }
    } else {
        RegisterContent::charwise(prev.text + &next.text)
    }
}
