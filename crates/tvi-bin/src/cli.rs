//! Command-line surface.

use clap::Parser;
use core_state::FileTarget;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tvi", version, about = "A modal text editor in the vi manner")]
pub struct Args {
    /// Ex command to run once the first file is loaded. Repeatable; `+EXCMD`
    /// is accepted as a synonym.
    #[arg(short = 'c', value_name = "EXCMD")]
    pub commands: Vec<String>,
    /// Configuration file (overrides discovery of `tvi.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Start in Insert mode.
    #[arg(long)]
    pub insert: bool,
    /// Files to edit. `-` (or nothing, when stdin is a pipe) reads the
    /// buffer from stdin and saves it to stdout.
    pub files: Vec<String>,
}

impl Args {
    /// Whether the buffer may come from stdin.
    pub fn reads_stdin_buffer(&self) -> bool {
        self.files.is_empty() || self.files.iter().any(|f| f == "-")
    }

    /// Edit targets in command-line order. With no files, a piped stdin is
    /// the one target; otherwise the session opens a scratch buffer.
    pub fn targets(&self, stdin_is_buffer: bool) -> Vec<FileTarget> {
        if self.files.is_empty() {
            return if stdin_is_buffer { vec![FileTarget::Stdio] } else { Vec::new() };
        }
        self.files
            .iter()
            .map(|f| match f.as_str() {
                "-" => FileTarget::Stdio,
                path => FileTarget::Path(PathBuf::from(path)),
            })
            .collect()
    }
}

/// Turn each `+EXCMD` argument into `-c EXCMD` (a lone `+` means `$`).
/// Arguments after `--` are left alone.
pub fn rewrite_plus_commands<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    let mut literal = false;
    for (i, arg) in args.into_iter().enumerate() {
        if i == 0 || literal {
            out.push(arg);
            continue;
        }
        if arg == "--" {
            literal = true;
            out.push(arg);
            continue;
        }
        match arg.to_str().and_then(|s| s.strip_prefix('+')) {
            Some(cmd) => {
                out.push(OsString::from("-c"));
                out.push(OsString::from(if cmd.is_empty() { "$" } else { cmd }));
            }
            None => out.push(arg),
        }
    }
    out
}
