//! Stderr diagnostics for the CLI.
//!
//! Wire traffic is logged by the library crates at `debug`/`trace`; the
//! filter lets those targets be raised without flooding the output with
//! dependency chatter.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Consulted in order when `--log-level` is not given.
pub const LOG_ENV_VARS: [&str; 2] = ["KMBOX_LOG", "RUST_LOG"];

const KMBOX_TARGETS: [&str; 4] = ["kmbox", "kmbox_transport", "kmbox_frame", "kmbox_session"];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// `level` for the kmbox crates, `warn` for everything else.
pub fn level_directives(level: LogLevel) -> String {
    let mut directives = String::from("warn");
    for target in KMBOX_TARGETS {
        directives.push(',');
        directives.push_str(target);
        directives.push('=');
        directives.push_str(level.as_str());
    }
    directives
}

/// An explicit level wins, then the first non-empty variable in
/// [`LOG_ENV_VARS`], then `info`.
pub fn resolve_directives(
    level: Option<LogLevel>,
    lookup: impl Fn(&str) -> Option<String>,
) -> String {
    if let Some(level) = level {
        return level_directives(level);
    }
    LOG_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| level_directives(LogLevel::Info))
}

pub fn init_logging(format: LogFormat, level: Option<LogLevel>) {
    let directives = resolve_directives(level, |name| std::env::var(name).ok());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|err| {
        eprintln!("warning: ignoring log filter {directives:?}: {err}");
        EnvFilter::new(level_directives(LogLevel::Info))
    });

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
