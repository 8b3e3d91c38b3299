//! Vim-style key notation: `dw`, `A c<Esc>`, `:2,3d<CR>`, `<C-r>`.
//!
//! A `<` only starts a key name when it is followed by letters, digits or `-`
//! and a closing `>`; otherwise it is a literal `<` (so `<<` and `a<b` parse
//! as plain characters). `<lt>` spells a literal `<` explicitly.

use crate::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyNotationError {
    #[error("unknown key name <{0}>")]
    UnknownKey(String),
}

pub fn parse_keys(notation: &str) -> Result<Vec<KeyEvent>, KeyNotationError> {
    let chars: Vec<char> = notation.chars().collect();
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '<'
            && let Some(len) = bracket_len(&chars[i + 1..])
        {
            let name: String = chars[i + 1..i + 1 + len].iter().collect();
            out.push(named_key(&name)?);
            i += len + 2;
            continue;
        }
        out.push(KeyEvent::char(c));
        i += 1;
    }
    Ok(out)
}

/// Length of a `<name>` body if `rest` begins with one.
fn bracket_len(rest: &[char]) -> Option<usize> {
    let len = rest
        .iter()
        .take_while(|c| c.is_ascii_alphanumeric() || **c == '-')
        .count();
    if len == 0 || rest.get(len) != Some(&'>') {
        return None;
    }
    if !rest[0].is_ascii_alphabetic() {
        return None;
    }
    Some(len)
}

fn named_key(name: &str) -> Result<KeyEvent, KeyNotationError> {
    let lower = name.to_ascii_lowercase();
    if let Some(letter) = lower.strip_prefix("c-") {
        let mut it = letter.chars();
        if let (Some(c), None) = (it.next(), it.next()) {
            return Ok(KeyEvent::ctrl(c));
        }
        return Err(KeyNotationError::UnknownKey(name.to_string()));
    }
    let code = match lower.as_str() {
        "esc" => KeyCode::Esc,
        "cr" | "enter" | "return" => KeyCode::Enter,
        "bs" | "backspace" => KeyCode::Backspace,
        "tab" => KeyCode::Tab,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "del" | "delete" => KeyCode::Delete,
        "space" => KeyCode::Char(' '),
        "lt" => KeyCode::Char('<'),
        "bar" => KeyCode::Char('|'),
        _ => return Err(KeyNotationError::UnknownKey(name.to_string())),
    };
    Ok(KeyEvent::new(code, KeyModifiers::empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_and_named_keys() {
        let keys = parse_keys("A c<Esc>").unwrap();
        assert_eq!(
            keys,
            vec![
                KeyEvent::char('A'),
                KeyEvent::char(' '),
                KeyEvent::char('c'),
                KeyEvent::plain(KeyCode::Esc),
            ]
        );
    }

    #[test]
    fn control_chords() {
        let keys = parse_keys("<C-r><c-O>").unwrap();
        assert_eq!(keys, vec![KeyEvent::ctrl('r'), KeyEvent::ctrl('o')]);
    }

    #[test]
    fn literal_angle_brackets() {
        let keys = parse_keys("<<a<b<lt>").unwrap();
        let chars: Vec<_> = keys.iter().filter_map(|k| k.printable()).collect();
        assert_eq!(chars, vec!['<', '<', 'a', '<', 'b', '<']);
    }

    #[test]
    fn ex_line_with_return() {
        let keys = parse_keys(":2,3d<CR>").unwrap();
        assert_eq!(keys.len(), 6);
        assert_eq!(keys[5], KeyEvent::plain(KeyCode::Enter));
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert_eq!(
            parse_keys("<Nope>"),
            Err(KeyNotationError::UnknownKey("Nope".into()))
        );
    }
}
