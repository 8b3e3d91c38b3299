//! Ex command line (`:`).
//!
//! `[range]command[!][args]`, parsed by `parser`, addresses resolved by
//! `address`. Commands that touch files or the session lifetime become
//! [`Request`]s for the session; everything else is applied here.

mod address;
mod parser;
pub(crate) mod substitute;

use crate::dispatcher::motion::mark_jump;
use crate::dispatcher::{Env, Settings};
use crate::io_ops::FileError;
use crate::search::SearchError;
use crate::Request;
use core_state::BufferError;
use core_text::Position;
use core_text::motion::first_non_blank;
use parser::CommandName;
use std::path::PathBuf;
use substitute::{ConfirmSession, SubArgs, Substitution};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExError {
    #[error("{0}: Not an editor command")]
    Unknown(String),
    #[error("Invalid range")]
    InvalidRange,
    #[error("No write since last change (add ! to override)")]
    NoWriteSinceChange,
    #[error("{0} more files to edit")]
    MoreFiles(usize),
    #[error("No file name")]
    NoFileName,
    #[error("Pattern not found: {0}")]
    PatternNotFound(String),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("No previous substitute regular expression")]
    NoPreviousSubstitute,
    #[error("Unknown option: {0}")]
    UnknownOption(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Trailing characters: {0}")]
    TrailingCharacters(String),
    #[error("Mark not set")]
    MarkNotSet,
    #[error(transparent)]
    File(#[from] FileError),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error("File exists (add ! to override)")]
    FileExists,
    #[error("No more files to edit")]
    NoMoreFiles,
}

/// What the interpreter does after a command line ran.
#[derive(Debug)]
pub(crate) enum ExOutcome {
    Done,
    /// `:s///c`: answer each match in the confirm sub-mode.
    Confirm(ConfirmSession),
}

#[derive(Debug, Default)]
pub(crate) struct ExProcessor {
    last_substitute: Option<Substitution>,
}

impl ExProcessor {
    pub fn execute(&mut self, env: &mut Env, line: &str) -> Result<ExOutcome, ExError> {
        let line = line.trim_start_matches([':', ' ', '\t']);
        let cmd = parser::parse(line)?;
        debug!(target: "actions.ex", ?cmd, "execute");
        let range = address::resolve_range(&cmd.range, env)?;
        let current = env.buf.cursor().line;
        let last_line = env.buf.text().last_line();
        let (first, last) = range.unwrap_or((current, current));
        let Some(name) = cmd.name else {
            if let Some((_, target)) = range {
                goto_line(env, target);
            }
            return Ok(ExOutcome::Done);
        };
        let path = (!cmd.args.is_empty()).then(|| PathBuf::from(&cmd.args));
        match name {
            CommandName::Write => env.fx.requests.push(Request::Write {
                path,
                force: cmd.bang,
                only_if_dirty: false,
            }),
            CommandName::Quit => env.fx.requests.push(Request::Quit {
                force: cmd.bang,
                status: 0,
            }),
            CommandName::WriteQuit | CommandName::Xit => {
                env.fx.requests.push(Request::Write {
                    path,
                    force: cmd.bang,
                    only_if_dirty: name == CommandName::Xit,
                });
                env.fx.requests.push(Request::Quit {
                    force: false,
                    status: 0,
                });
            }
            CommandName::Next => env.fx.requests.push(Request::Next { force: cmd.bang }),
            CommandName::WriteNext => {
                env.fx.requests.push(Request::Write {
                    path: None,
                    force: cmd.bang,
                    only_if_dirty: false,
                });
                env.fx.requests.push(Request::Next { force: false });
            }
            CommandName::Edit => env.fx.requests.push(Request::Edit { path, force: cmd.bang }),
            CommandName::Substitute => {
                let args = substitute::parse(&cmd.args)?;
                return self.substitute(env, args, first, last);
            }
            CommandName::RepeatSubstitute => {
                let flags = substitute::parse_flags(&cmd.args)?;
                return self.substitute(env, SubArgs::Repeat(flags), first, last);
            }
            CommandName::Delete | CommandName::Yank => {
                let (register, count) = register_and_count(&cmd.args)?;
                let (first, last) = match count {
                    Some(n) => (last, last.saturating_add(n - 1).min(last_line)),
                    None => (first, last),
                };
                let start = Position::new(first, 0);
                let end = Position::new(last, 0);
                let n = last - first + 1;
                if name == CommandName::Delete {
                    let removed = env.buf.delete_range(start, end, true)?;
                    env.buf.registers.write_delete(removed, register).map_err(BufferError::from)?;
                    let l = first.min(env.buf.text().last_line());
                    env.buf.set_cursor_clamped(Position::new(l, first_non_blank(env.buf.text(), l)));
                    env.report_lines(n, "fewer lines");
                } else {
                    env.buf.yank(start, end, true, register)?;
                    env.report_lines(n, "lines yanked");
                }
            }
            CommandName::Join => {
                let (_, count) = register_and_count(&cmd.args)?;
                let (first, n) = match (range, count) {
                    (_, Some(c)) => (last, c),
                    (Some((a, b)), None) if b > a => (a, b - a + 1),
                    _ => (first, 2),
                };
                if env.buf.join_lines(first, n, !cmd.bang)?.is_none() {
                    return Err(ExError::InvalidRange);
                }
            }
            CommandName::Global | CommandName::VGlobal => {
                let (first, last) = range.unwrap_or((0, last_line));
                let invert = name == CommandName::VGlobal || cmd.bang;
                global(env, &cmd.args, first, last, invert)?;
            }
            CommandName::Undo => {
                if !env.buf.undo() {
                    env.warn("Already at oldest change");
                }
            }
            CommandName::Redo => {
                if !env.buf.redo() {
                    env.warn("Already at newest change");
                }
            }
            CommandName::Set => set_options(env, &cmd.args)?,
            CommandName::LineNumber => {
                let line = range.map_or(last_line, |(_, b)| b);
                env.info((line + 1).to_string());
            }
            CommandName::Visual => {}
        }
        Ok(ExOutcome::Done)
    }

    fn substitute(&mut self, env: &mut Env, args: SubArgs, first: usize, last: usize) -> Result<ExOutcome, ExError> {
        let mut sub = match args {
            SubArgs::New(sub) => sub,
            SubArgs::Repeat(flags) => {
                let prev = self.last_substitute.clone().ok_or(ExError::NoPreviousSubstitute)?;
                Substitution { flags, ..prev }
            }
        };
        if sub.pattern.is_empty() {
            sub.pattern = env.search.last_pattern().ok_or(SearchError::NoPrevious)?.to_string();
        }
        let re = env.search.compile(&sub.pattern, sub.flags.case_sensitive)?;
        let forward = env.search.is_forward();
        env.search.set_pattern(&sub.pattern, forward)?;
        self.last_substitute = Some(sub.clone());
        if sub.flags.confirm {
            let session = ConfirmSession::start(env, re, &sub, first, last)?;
            env.info(session.prompt());
            return Ok(ExOutcome::Confirm(session));
        }
        let n = substitute::apply(env, &re, &sub, first, last)?;
        env.info(substitute::count_message(n));
        Ok(ExOutcome::Done)
    }
}

fn goto_line(env: &mut Env, line: usize) {
    let from = env.buf.cursor();
    mark_jump(env, from);
    let col = first_non_blank(env.buf.text(), line);
    env.buf.set_cursor_clamped(Position::new(line, col));
}

/// `[x] [count]` as taken by `:d`, `:y` and `:j`.
fn register_and_count(args: &str) -> Result<(Option<char>, Option<usize>), ExError> {
    let mut register = None;
    let mut count = None;
    let mut rest = args.trim();
    if let Some(c) = rest.chars().next()
        && !c.is_ascii_digit()
    {
        if core_state::RegisterName::parse(c).is_none() {
            return Err(ExError::TrailingCharacters(rest.to_string()));
        }
        register = Some(c);
        rest = rest[c.len_utf8()..].trim_start();
    }
    if !rest.is_empty() {
        let n: usize = rest
            .parse()
            .map_err(|_| ExError::TrailingCharacters(rest.to_string()))?;
        if n == 0 {
            return Err(ExError::InvalidArgument(rest.to_string()));
        }
        count = Some(n);
    }
    Ok((register, count))
}

/// `:g/pat/[d|p]`; `invert` selects non-matching lines.
fn global(env: &mut Env, args: &str, first: usize, last: usize, invert: bool) -> Result<(), ExError> {
    let mut sc = address::Scanner::new(args);
    let delim = sc.bump().ok_or_else(|| ExError::InvalidArgument(args.to_string()))?;
    let pattern = sc.delimited(delim);
    let action = sc.rest().trim().to_string();
    env.search.set_pattern(&pattern, true)?;
    let re = env.search.resolve_pattern("", None)?;
    let matched: Vec<usize> = (first..=last)
        .filter(|&l| re.is_match(&env.buf.text().line(l).unwrap_or_default()) != invert)
        .collect();
    let Some(&last_match) = matched.last() else {
        let shown = env.search.last_pattern().unwrap_or_default().to_string();
        return Err(ExError::PatternNotFound(shown));
    };
    match action.as_str() {
        "d" | "de" | "del" | "delete" => {
            let kept: Vec<String> = (first..=last)
                .filter(|l| !matched.contains(l))
                .filter_map(|l| env.buf.text().line(l))
                .collect();
            env.buf.replace_lines(first..last + 1, kept)?;
            let l = matched[0].min(env.buf.text().last_line());
            env.buf.set_cursor_clamped(Position::new(l, first_non_blank(env.buf.text(), l)));
            env.report_lines(matched.len(), "fewer lines");
        }
        "" | "p" | "pr" | "print" => {
            let text = env.buf.text().line(last_match).unwrap_or_default();
            env.buf
                .set_cursor_clamped(Position::new(last_match, first_non_blank(env.buf.text(), last_match)));
            env.info(text);
        }
        other => return Err(ExError::Unknown(other.to_string())),
    }
    Ok(())
}

fn set_options(env: &mut Env, args: &str) -> Result<(), ExError> {
    if args.is_empty() || args == "all" {
        env.info(describe_all(env));
        return Ok(());
    }
    let mut shown = Vec::new();
    for word in args.split_whitespace() {
        if let Some(name) = word.strip_suffix('?') {
            shown.push(describe(env, name)?);
            continue;
        }
        if let Some((name, value)) = word.split_once('=') {
            match name {
                "shiftwidth" | "sw" => {
                    let n: usize = value
                        .parse()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| ExError::InvalidArgument(word.to_string()))?;
                    env.settings.shiftwidth = n;
                }
                _ => return Err(ExError::UnknownOption(name.to_string())),
            }
            continue;
        }
        if matches!(word, "shiftwidth" | "sw") {
            shown.push(describe(env, word)?);
            continue;
        }
        let (name, on) = if let Some(rest) = word.strip_prefix("inv")
            && let Some(current) = flag_value(env, rest)
        {
            (rest, !current)
        } else {
            match word.strip_prefix("no") {
                Some(rest) if flag_value(env, rest).is_some() => (rest, false),
                _ => (word, true),
            }
        };
        set_flag(env, name, on).map_err(|e| match e {
            ExError::UnknownOption(_) => ExError::UnknownOption(word.to_string()),
            other => other,
        })?;
    }
    if !shown.is_empty() {
        env.info(shown.join(" "));
    }
    Ok(())
}

/// Flip a boolean option and return the `:set` line that would restore it.
pub(crate) fn toggle_option(env: &mut Env, name: &str) -> Result<String, ExError> {
    let current = flag_value(env, name).ok_or_else(|| ExError::UnknownOption(name.to_string()))?;
    set_flag(env, name, !current)?;
    Ok(format!(":set {}", describe(env, name)?))
}

fn set_flag(env: &mut Env, name: &str, on: bool) -> Result<(), ExError> {
    match name {
        "ignorecase" | "ic" => env.search.set_ignorecase(on)?,
        "wrapscan" | "ws" => env.search.set_wrapscan(on),
        "number" | "nu" => env.settings.number = on,
        "regex" | "re" => env.search.set_regex_mode(on)?,
        _ => return Err(ExError::UnknownOption(name.to_string())),
    }
    debug!(target: "actions.ex", option = name, on, "set");
    Ok(())
}

fn flag_value(env: &Env, name: &str) -> Option<bool> {
    match name {
        "ignorecase" | "ic" => Some(env.search.ignorecase()),
        "wrapscan" | "ws" => Some(env.search.wrapscan()),
        "number" | "nu" => Some(env.settings.number),
        "regex" | "re" => Some(env.search.regex_mode()),
        _ => None,
    }
}

fn flag(name: &str, on: bool) -> String {
    if on { name.to_string() } else { format!("no{name}") }
}

fn describe(env: &Env, name: &str) -> Result<String, ExError> {
    Ok(match name {
        "ignorecase" | "ic" => flag("ignorecase", env.search.ignorecase()),
        "wrapscan" | "ws" => flag("wrapscan", env.search.wrapscan()),
        "number" | "nu" => flag("number", env.settings.number),
        "regex" | "re" => flag("regex", env.search.regex_mode()),
        "shiftwidth" | "sw" => format!("shiftwidth={}", env.settings.shiftwidth),
        _ => return Err(ExError::UnknownOption(name.to_string())),
    })
}

fn describe_all(env: &Env) -> String {
    let Settings { number, shiftwidth, .. } = *env.settings;
    format!(
        "{} {} {} {} shiftwidth={shiftwidth}",
        flag("ignorecase", env.search.ignorecase()),
        flag("number", number),
        flag("regex", env.search.regex_mode()),
        flag("wrapscan", env.search.wrapscan()),
    )
}
