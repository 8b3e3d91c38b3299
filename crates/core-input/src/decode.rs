//! Decode a raw byte stream (a pipe, a script file) into key events.
//!
//! * UTF-8 sequences become `Char`; malformed bytes become U+FFFD.
//! * CR and LF are both `Enter`; BS and DEL are `Backspace`; HT is `Tab`.
//! * Other C0 bytes become control chords (`0x03` is `⌃C`).
//! * `ESC [` introduces cursor and editing key sequences; any other ESC is a
//!   plain `Esc` (so scripts may follow Esc with `O` to open a line).

use core_events::{KeyCode, KeyEvent};
use std::collections::VecDeque;
use std::io::{self, BufReader, Read};
use tracing::trace;

pub struct KeyDecoder<R: Read> {
    reader: BufReader<R>,
    pending: VecDeque<u8>,
    eof: bool,
}

impl<R: Read> KeyDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            pending: VecDeque::new(),
            eof: false,
        }
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.pending.pop_front() {
            return Ok(Some(b));
        }
        if self.eof {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(None);
                }
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn peek_byte(&mut self, offset: usize) -> io::Result<Option<u8>> {
        while self.pending.len() <= offset {
            if self.eof {
                return Ok(None);
            }
            let mut byte = [0u8; 1];
            match self.reader.read(&mut byte) {
                Ok(0) => self.eof = true,
                Ok(_) => self.pending.push_back(byte[0]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(self.pending.get(offset).copied())
    }

    /// Next key, or `None` at end of input.
    pub fn next_key(&mut self) -> io::Result<Option<KeyEvent>> {
        loop {
            let Some(b) = self.next_byte()? else {
                return Ok(None);
            };
            let key = match b {
                0x1b => match self.escape_sequence()? {
                    Some(key) => key,
                    None => continue,
                },
                b'\r' | b'\n' => KeyEvent::plain(KeyCode::Enter),
                0x08 | 0x7f => KeyEvent::plain(KeyCode::Backspace),
                b'\t' => KeyEvent::plain(KeyCode::Tab),
                0x00 => KeyEvent::ctrl('@'),
                0x01..=0x1a => KeyEvent::ctrl(char::from(b + 0x60)),
                0x1c..=0x1f => KeyEvent::ctrl(char::from(b + 0x40)),
                0x20..=0x7e => KeyEvent::char(char::from(b)),
                lead => KeyEvent::char(self.utf8_char(lead)?),
            };
            return Ok(Some(key));
        }
    }

    /// Called after ESC. Returns `None` for a recognized-but-unsupported sequence.
    fn escape_sequence(&mut self) -> io::Result<Option<KeyEvent>> {
        let esc = KeyEvent::plain(KeyCode::Esc);
        let intro = self.peek_byte(0)?;
        if intro != Some(b'[') {
            return Ok(Some(esc));
        }
        // Require a complete sequence before committing to it.
        let mut len = 1;
        let final_byte = loop {
            match self.peek_byte(len)? {
                Some(0x30..=0x3f) => len += 1,
                Some(b @ 0x40..=0x7e) => break b,
                _ => return Ok(Some(esc)),
            }
        };
        let params: Vec<u8> = self.pending.range(1..len).copied().collect();
        self.pending.drain(..=len);
        let code = match (final_byte, params.as_slice()) {
            (b'A', _) => KeyCode::Up,
            (b'B', _) => KeyCode::Down,
            (b'C', _) => KeyCode::Right,
            (b'D', _) => KeyCode::Left,
            (b'H', _) | (b'~', b"1") | (b'~', b"7") => KeyCode::Home,
            (b'F', _) | (b'~', b"4") | (b'~', b"8") => KeyCode::End,
            (b'~', b"3") => KeyCode::Delete,
            (b'~', b"5") => KeyCode::PageUp,
            (b'~', b"6") => KeyCode::PageDown,
            _ => {
                trace!(target: "input.decode", final_byte, params = params.len(), "unsupported_sequence");
                return Ok(None);
            }
        };
        Ok(Some(KeyEvent::plain(code)))
    }

    fn utf8_char(&mut self, lead: u8) -> io::Result<char> {
        let width = match lead {
            0xc2..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf4 => 4,
            _ => return Ok(char::REPLACEMENT_CHARACTER),
        };
        let mut buf = vec![lead];
        for i in 0..width - 1 {
            match self.peek_byte(i)? {
                Some(b) if b & 0xc0 == 0x80 => buf.push(b),
                _ => {
                    self.pending.drain(..i);
                    return Ok(char::REPLACEMENT_CHARACTER);
                }
            }
        }
        self.pending.drain(..width - 1);
        Ok(std::str::from_utf8(&buf)
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER))
    }
}

impl<R: Read> Iterator for KeyDecoder<R> {
    type Item = io::Result<KeyEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_key().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Vec<KeyEvent> {
        KeyDecoder::new(bytes).map(|k| k.unwrap()).collect()
    }

    #[test]
    fn printable_and_utf8() {
        assert_eq!(
            decode("añ漢".as_bytes()),
            vec![KeyEvent::char('a'), KeyEvent::char('ñ'), KeyEvent::char('漢')]
        );
    }

    #[test]
    fn control_bytes() {
        assert_eq!(
            decode(b"\x03\x12\r\n\x7f\t"),
            vec![
                KeyEvent::ctrl('c'),
                KeyEvent::ctrl('r'),
                KeyEvent::plain(KeyCode::Enter),
                KeyEvent::plain(KeyCode::Enter),
                KeyEvent::plain(KeyCode::Backspace),
                KeyEvent::plain(KeyCode::Tab),
            ]
        );
    }

    #[test]
    fn escape_sequences() {
        assert_eq!(
            decode(b"\x1b[A\x1b[3~\x1b[H"),
            vec![
                KeyEvent::plain(KeyCode::Up),
                KeyEvent::plain(KeyCode::Delete),
                KeyEvent::plain(KeyCode::Home),
            ]
        );
        assert_eq!(
            decode(b"\x1bOx"),
            vec![
                KeyEvent::plain(KeyCode::Esc),
                KeyEvent::char('O'),
                KeyEvent::char('x'),
            ]
        );
    }

    #[test]
    fn lone_escape_keeps_following_bytes() {
        assert_eq!(
            decode(b"ix\x1b:q\n"),
            vec![
                KeyEvent::char('i'),
                KeyEvent::char('x'),
                KeyEvent::plain(KeyCode::Esc),
                KeyEvent::char(':'),
                KeyEvent::char('q'),
                KeyEvent::plain(KeyCode::Enter),
            ]
        );
        assert_eq!(decode(b"\x1b"), vec![KeyEvent::plain(KeyCode::Esc)]);
        assert_eq!(
            decode(b"\x1b["),
            vec![KeyEvent::plain(KeyCode::Esc), KeyEvent::char('[')]
        );
    }

    #[test]
    fn unsupported_sequences_are_dropped() {
        assert_eq!(decode(b"\x1b[99zq"), vec![KeyEvent::char('q')]);
    }

    #[test]
    fn malformed_utf8_becomes_replacement() {
        assert_eq!(
            decode(&[0xe6, b'a']),
            vec![KeyEvent::char(char::REPLACEMENT_CHARACTER), KeyEvent::char('a')]
        );
    }
}
