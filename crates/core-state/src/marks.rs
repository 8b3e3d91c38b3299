//! Named positions. Marks are plain coordinates; they are not adjusted when
//! text moves and are clamped by the owner when read back.

use core_text::Position;
use std::collections::HashMap;

/// Where the most recent insert session started.
pub const LAST_INSERT: char = '^';
/// Position before the latest jump (`G`, searches, `''`).
pub const PREVIOUS_CONTEXT: char = '\'';

#[derive(Debug, Clone, Default)]
pub struct Marks {
    map: HashMap<char, Position>,
}

impl Marks {
    /// Names a user or the editor may set: `a`-`z`, `^`, `'` (`` ` `` is an alias of `'`).
    pub fn is_valid_name(name: char) -> bool {
        name.is_ascii_lowercase() || matches!(name, LAST_INSERT | PREVIOUS_CONTEXT | '`')
    }

    fn canonical(name: char) -> char {
        if name == '`' { PREVIOUS_CONTEXT } else { name }
    }

    pub fn set(&mut self, name: char, pos: Position) -> bool {
        if !Self::is_valid_name(name) {
            return false;
        }
        self.map.insert(Self::canonical(name), pos);
        true
    }

    pub fn get(&self, name: char) -> Option<Position> {
        self.map.get(&Self::canonical(name)).copied()
    }
}
