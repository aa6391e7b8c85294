//! One-call logging setup, suitable for small applications.

use std::io::{self, IsTerminal, Write};

use log::LevelFilter;

use crate::format::{ConsoleFormatter, EventFormatter, JsonFormatter};
use crate::EcsLogger;

/// Where initialized logging writes its lines.
pub enum LogStream {
    Stdout,
    Stderr,
    Writer(Box<dyn Write + Send>),
}

impl LogStream {
    fn is_terminal(&self) -> bool {
        match self {
            Self::Stdout => io::stdout().is_terminal(),
            Self::Stderr => io::stderr().is_terminal(),
            Self::Writer(_) => false,
        }
    }

    fn into_writer(self) -> Box<dyn Write + Send> {
        match self {
            Self::Stdout => Box::new(io::stdout()),
            Self::Stderr => Box::new(io::stderr()),
            Self::Writer(writer) => writer,
        }
    }
}

impl std::fmt::Debug for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Stdout => "Stdout",
            Self::Stderr => "Stderr",
            Self::Writer(_) => "Writer",
        };
        f.write_str(name)
    }
}

fn level_from(value: Option<&str>) -> LevelFilter {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// A very simple way to configure logging.
///
/// The level falls back to the `LOGLEVEL` environment variable and then to
/// `Info`; the stream defaults to stdout; the formatter defaults to
/// [`ConsoleFormatter`] on a terminal and [`JsonFormatter`] otherwise.
///
/// # Errors
///
/// Returns an error if a logger has already been set.
pub fn try_initialize_logging(
    log_level: Option<LevelFilter>,
    stream: Option<LogStream>,
    formatter: Option<Box<dyn EventFormatter + Send + Sync>>,
) -> Result<(), log::SetLoggerError> {
    let level = log_level
        .unwrap_or_else(|| level_from(std::env::var("LOGLEVEL").ok().as_deref()));
    let stream = stream.unwrap_or(LogStream::Stdout);
    let formatter = formatter.unwrap_or_else(|| {
        if stream.is_terminal() {
            Box::new(ConsoleFormatter)
        } else {
            Box::new(JsonFormatter)
        }
    });

    EcsLogger::boxed(formatter)
        .with_writer(stream.into_writer())
        .with_level(level)
        .try_init()
}

/// As [`try_initialize_logging`] with all defaults.
///
/// # Panics
///
/// Panics if a logger has already been set.
pub fn initialize_logging() {
    try_initialize_logging(None, None, None)
        .expect("initialize_logging should not be called after logger initialization");
}
