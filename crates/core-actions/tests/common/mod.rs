#![allow(dead_code)] // Shared across many integration tests; each test binary uses a subset of helpers.

use core_actions::{MemoryStore, Mode, Session};
use core_config::EditorConfig;
use core_events::parse_keys;
use core_state::FileTarget;
use core_text::Position;

pub const FILE: &str = "t.txt";

/// A session over one in-memory file, driven by key notation.
pub struct Harness {
    pub session: Session<MemoryStore>,
}

impl Harness {
    pub fn new(lines: &[&str]) -> Self {
        Self::with_config(lines, EditorConfig::default())
    }

    pub fn with_config(lines: &[&str], cfg: EditorConfig) -> Self {
        let mut text = lines.join("\n");
        text.push('\n');
        let store = MemoryStore::default().with_file(FILE, text);
        let session = Session::open(store, &cfg, vec![FileTarget::Path(FILE.into())], 20).unwrap();
        Self { session }
    }

    /// Feed keys written in `parse_keys` notation.
    pub fn keys(&mut self, notation: &str) -> &mut Self {
        for key in parse_keys(notation).unwrap() {
            self.session.handle_key(&key);
        }
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.session.buffer().lines()
    }

    pub fn cursor(&self) -> (usize, usize) {
        let Position { line, col } = self.session.buffer().cursor();
        (line, col)
    }

    pub fn mode(&self) -> Mode {
        self.session.mode()
    }

    pub fn message(&self) -> String {
        self.session.message().map(|m| m.text.clone()).unwrap_or_default()
    }

    pub fn register(&self, name: char) -> String {
        self.session.buffer().registers.read(Some(name)).map(|c| c.text).unwrap_or_default()
    }

    pub fn saved(&self) -> Option<&str> {
        self.session.store().file(FILE)
    }
}

/// Run `keys` on `lines` and return the resulting text.
pub fn edit(lines: &[&str], keys: &str) -> Vec<String> {
    let mut h = Harness::new(lines);
    h.keys(keys);
    h.lines()
}
