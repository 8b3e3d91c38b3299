#![allow(dead_code)] // Shared across many integration tests; each test binary uses a subset of helpers.

use core_actions::{MemoryStore, Session};
use core_config::EditorConfig;
use core_events::parse_keys;
use core_render::{RenderEngine, View, compose};
use core_state::FileTarget;
use core_terminal::{HeadlessDriver, TerminalDriver};

pub const FILE: &str = "t.txt";

/// A session painted onto an in-memory screen.
pub struct Screen {
    pub session: Session<MemoryStore>,
    pub engine: RenderEngine,
    pub driver: HeadlessDriver,
}

impl Screen {
    pub fn new(lines: &[&str], cols: u16, rows: u16) -> Self {
        let mut text = lines.join("\n");
        text.push('\n');
        let store = MemoryStore::default().with_file(FILE, text);
        let session = Session::open(
            store,
            &EditorConfig::default(),
            vec![FileTarget::Path(FILE.into())],
            rows as usize - 1,
        )
        .unwrap();
        let mut screen = Self {
            session,
            engine: RenderEngine::new(),
            driver: HeadlessDriver::scripted(Vec::new(), cols, rows),
        };
        screen.paint();
        screen
    }

    pub fn paint(&mut self) {
        let (w, h) = self.driver.size();
        let frame = compose(&View::of(&self.session), w, h);
        self.engine.render(&mut self.driver, &frame).unwrap();
    }

    /// Feed keys, then repaint.
    pub fn keys(&mut self, notation: &str) -> &mut Self {
        for key in parse_keys(notation).unwrap() {
            self.session.handle_key(&key);
        }
        self.paint();
        self
    }

    pub fn rows(&self) -> Vec<String> {
        self.driver.screen().rows()
    }

    pub fn status(&self) -> String {
        self.rows().last().cloned().unwrap_or_default()
    }

    pub fn cursor(&self) -> (u16, u16) {
        self.driver.screen().cursor()
    }
}
