use core_events::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::event::{
    KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyEventKind as CKeyEventKind,
    KeyModifiers as CKeyModifiers,
};

/// Map a crossterm key event into an editor key event.
///
/// Returns `None` for releases and for key codes the editor has no use for
/// (function keys, media keys, bare modifiers).
pub fn map_key_event(event: &CKeyEvent) -> Option<KeyEvent> {
    if event.kind == CKeyEventKind::Release {
        return None;
    }
    let code = map_key_code(&event.code)?;
    let mut mods = map_mods(event.modifiers);
    if let KeyCode::Char(c) = code
        && mods.contains(KeyModifiers::CTRL)
    {
        // Terminals disagree on the case of ctrl letters.
        return Some(KeyEvent::new(
            KeyCode::Char(c.to_ascii_lowercase()),
            mods - KeyModifiers::SHIFT,
        ));
    }
    if matches!(code, KeyCode::Char(_)) {
        // Shift is already folded into the char.
        mods -= KeyModifiers::SHIFT;
    }
    Some(KeyEvent::new(code, mods))
}

fn map_key_code(code: &CKeyCode) -> Option<KeyCode> {
    let code = match code {
        CKeyCode::Char(c) => KeyCode::Char(*c),
        CKeyCode::Enter => KeyCode::Enter,
        CKeyCode::Esc => KeyCode::Esc,
        CKeyCode::Backspace => KeyCode::Backspace,
        CKeyCode::Tab | CKeyCode::BackTab => KeyCode::Tab,
        CKeyCode::Up => KeyCode::Up,
        CKeyCode::Down => KeyCode::Down,
        CKeyCode::Left => KeyCode::Left,
        CKeyCode::Right => KeyCode::Right,
        CKeyCode::Home => KeyCode::Home,
        CKeyCode::End => KeyCode::End,
        CKeyCode::PageUp => KeyCode::PageUp,
        CKeyCode::PageDown => KeyCode::PageDown,
        CKeyCode::Delete => KeyCode::Delete,
        _ => return None,
    };
    Some(code)
}

pub(crate) fn map_mods(m: CKeyModifiers) -> KeyModifiers {
    let mut out = KeyModifiers::empty();
    if m.contains(CKeyModifiers::CONTROL) {
        out |= KeyModifiers::CTRL;
    }
    if m.contains(CKeyModifiers::ALT) {
        out |= KeyModifiers::ALT;
    }
    if m.contains(CKeyModifiers::SHIFT) {
        out |= KeyModifiers::SHIFT;
    }
    out
}
