//! tvi entrypoint.
mod app;
mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Args, rewrite_plus_commands};
use core_config::{LogConfig, load_from};
use core_terminal::TerminalCapabilities;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Once;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "TVI_LOG";
const DEFAULT_FILTER: &str = "warn";

fn main() -> ExitCode {
    // Usage errors exit 2 from inside clap.
    let args = Args::parse_from(rewrite_plus_commands(std::env::args_os()));
    match start(&args) {
        Ok(status) => ExitCode::from(status.clamp(0, 255) as u8),
        Err(e) => {
            error!(target: "runtime", error = %format!("{e:#}"), "fatal");
            eprintln!("tvi: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn start(args: &Args) -> Result<i32> {
    let config = load_from(args.config.clone())?;
    let _log_guard = configure_logging(&config.file.log);
    install_panic_hook();
    info!(
        target: "config",
        path = ?config.path,
        "config_loaded"
    );

    let caps = TerminalCapabilities::detect();
    let mode = caps.launch_mode(args.reads_stdin_buffer());
    app::run(args, &config, mode)
}

fn log_path(log: &LogConfig) -> Option<PathBuf> {
    log.file
        .clone()
        .or_else(|| dirs::cache_dir().map(|d| d.join("tvi").join("tvi.log")))
}

/// Filter precedence: `TVI_LOG`, then `log.filter`, then `warn`.
fn env_filter(log: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(log.filter.as_deref().unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Truncating file log. Logging is best effort: without a writable log
/// location the editor runs silently.
fn configure_logging(log: &LogConfig) -> Option<WorkerGuard> {
    let path = log_path(log)?;
    let dir = path.parent().filter(|d| !d.as_os_str().is_empty())?.to_path_buf();
    let name = path.file_name()?.to_owned();
    std::fs::create_dir_all(&dir).ok()?;
    if path.exists() {
        let _ = std::fs::remove_file(&path);
    }

    let file_appender = tracing_appender::rolling::never(&dir, name);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(log))
        .with_writer(nb_writer)
        .with_ansi(false)
        .try_init()
        .ok()
        .map(|_| guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_log_file_wins_over_cache_dir() {
        let log = LogConfig {
            filter: None,
            file: Some(PathBuf::from("/tmp/x/tvi.log")),
        };
        assert_eq!(log_path(&log), Some(PathBuf::from("/tmp/x/tvi.log")));
    }

    #[test]
    fn config_filter_applies_without_env_override() {
        let log = LogConfig {
            filter: Some("debug".into()),
            file: None,
        };
        // TVI_LOG is not set in the test environment.
        assert_eq!(env_filter(&log).to_string(), "debug");
    }
}
