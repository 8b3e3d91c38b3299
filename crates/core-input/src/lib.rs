//! Key sources: crossterm terminal events and raw byte streams.

pub mod decode;
mod key_token;

pub use decode::KeyDecoder;
pub use key_token::map_key_event;

use core_events::{KeyCode, KeyEvent};
use crossterm::event::Event as CEvent;

/// What one terminal event means to the editor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalInput {
    Key(KeyEvent),
    Resize(u16, u16),
    Ignored,
}

/// Translate a crossterm event. Only the key kind is logged, never the
/// typed character.
pub fn translate_event(event: &CEvent) -> TerminalInput {
    match event {
        CEvent::Key(k) => match map_key_event(k) {
            Some(key) => {
                log_key(&key);
                TerminalInput::Key(key)
            }
            None => TerminalInput::Ignored,
        },
        CEvent::Resize(cols, rows) => TerminalInput::Resize(*cols, *rows),
        _ => TerminalInput::Ignored,
    }
}

#[inline]
pub(crate) fn log_key(key: &KeyEvent) {
    let kind = match key.code {
        KeyCode::Char(_) => "char",
        _ => "named",
    };
    tracing::trace!(target: "input.key", kind, mods = key.mods.bits(), "key");
}
