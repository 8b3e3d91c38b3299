//! Configuration loading and parsing.
//!
//! `tvi.toml` is looked up at the path given on the command line, then in the
//! working directory, then in the platform config dir. Every field has a
//! default, so a missing file and a partial file both load. A file that fails
//! to parse is reported and replaced by defaults; the editor still starts.
//! Unknown fields are ignored.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const FILE_NAME: &str = "tvi.toml";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EditorConfig {
    pub wrapscan: bool,
    pub ignorecase: bool,
    /// `false` treats search patterns as literal text.
    pub regex: bool,
    pub number: bool,
    pub shiftwidth: usize,
    pub undolevels: usize,
    pub start_in_insert: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            wrapscan: true,
            ignorecase: false,
            regex: true,
            number: false,
            shiftwidth: 8,
            undolevels: 1000,
            start_in_insert: false,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive; `TVI_LOG` wins over it.
    pub filter: Option<String>,
    pub file: Option<PathBuf>,
}

/// Screen size assumed when no terminal is attached.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PipeConfig {
    pub rows: u16,
    pub columns: u16,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self { rows: 24, columns: 80 }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigFile {
    pub editor: EditorConfig,
    pub log: LogConfig,
    pub pipe: PipeConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file text when one was read
    pub path: Option<PathBuf>,
    pub file: ConfigFile,
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("tvi").join(FILE_NAME);
    }
    local
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            let mut cfg = Config {
                raw: Some(content),
                path: Some(path),
                file,
            };
            cfg.sanitize();
            Ok(cfg)
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Raise values the editor cannot work with to their minimum.
    fn sanitize(&mut self) {
        let editor = &mut self.file.editor;
        if editor.shiftwidth == 0 {
            info!(target: "config", raw = 0, clamped = 1, "shiftwidth_clamped");
            editor.shiftwidth = 1;
        }
        let pipe = &mut self.file.pipe;
        // One text row plus the status row.
        if pipe.rows < 2 || pipe.columns < 1 {
            info!(
                target: "config",
                rows = pipe.rows,
                columns = pipe.columns,
                "pipe_size_clamped"
            );
            pipe.rows = pipe.rows.max(2);
            pipe.columns = pipe.columns.max(1);
        }
    }

    pub fn editor(&self) -> &EditorConfig {
        &self.file.editor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), body).unwrap();
        tmp
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert!(cfg.raw.is_none());
        assert_eq!(cfg.file, ConfigFile::default());
        assert!(cfg.editor().wrapscan);
        assert_eq!(cfg.editor().shiftwidth, 8);
        assert_eq!(cfg.file.pipe, PipeConfig { rows: 24, columns: 80 });
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = write_config("[editor]\nignorecase = true\nregex = false\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert!(cfg.editor().ignorecase);
        assert!(!cfg.editor().regex);
        assert!(cfg.editor().wrapscan);
        assert_eq!(cfg.editor().undolevels, 1000);
        assert_eq!(cfg.path.as_deref(), Some(tmp.path()));
    }

    #[test]
    fn parses_every_section() {
        let tmp = write_config(
            "[editor]\nshiftwidth = 4\nnumber = true\nstart_in_insert = true\n\
             [log]\nfilter = \"debug\"\nfile = \"/tmp/x.log\"\n\
             [pipe]\nrows = 10\ncolumns = 40\n",
        );
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.editor().shiftwidth, 4);
        assert!(cfg.editor().number);
        assert!(cfg.editor().start_in_insert);
        assert_eq!(cfg.file.log.filter.as_deref(), Some("debug"));
        assert_eq!(cfg.file.log.file, Some(PathBuf::from("/tmp/x.log")));
        assert_eq!(cfg.file.pipe, PipeConfig { rows: 10, columns: 40 });
    }

    #[test]
    fn parse_error_falls_back_to_defaults_with_warning() {
        let tmp = write_config("[editor]\nshiftwidth = \"wide\"\n");
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::WARN)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        let cfg = with_default(subscriber, || load_from(Some(tmp.path().to_path_buf())).unwrap());

        assert_eq!(cfg.file, ConfigFile::default());
        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("WARN config:"));
        assert!(log_output.contains("config_parse_failed"));
    }

    #[test]
    fn unusable_values_are_clamped() {
        let tmp = write_config("[editor]\nshiftwidth = 0\n[pipe]\nrows = 0\ncolumns = 0\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.editor().shiftwidth, 1);
        assert_eq!(cfg.file.pipe, PipeConfig { rows: 2, columns: 1 });
    }
}
