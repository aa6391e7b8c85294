//! # Overview
//!
//! Scoped logging context and ECS-style formatters for the [`log`] crate.
//!
//! Applications often need rich, structured context in their logs without
//! threading fields through every call site. This crate provides:
//!
//! - A per-thread stack of context scopes: fields recorded in a scope are
//!   attached to every log statement emitted while the scope is active and
//!   disappear exactly when it exits, including on panic.
//! - Propagation of a context across async boundaries ([`FutureExt`]).
//! - Capture of selected function arguments into the context
//!   ([`capture`]).
//! - Formatters rendering records as colorized console lines, plain text,
//!   or single-line ECS JSON (`log.level`, `error.type`, ... field names),
//!   with dotted keys expanded to nested objects.
//!
//! [`EcsLogger`] wires these together as a [`Log`](log::Log)
//! implementation, so existing `log::info!` statements pick the context up
//! unchanged.
//!
//! ## Basic example
//!
//! ```
//! use ecs_context_logger::{EcsLogger, JsonFormatter, LogContext};
//!
//! EcsLogger::new(JsonFormatter)
//!     .with_level(log::LevelFilter::Info)
//!     .init();
//!
//! let _guard = LogContext::new()
//!     .record("request_id", "req-123")
//!     .record("user_id", 42)
//!     .enter();
//!
//! // Emits {"@timestamp":...,"log.level":"INFO","message":"processing
//! // request",...,"request_id":"req-123","user_id":42}
//! log::info!("processing request");
//! ```

use std::borrow::Cow;
use std::io::Write;
use std::sync::Mutex;

pub use self::{
    context::LogContext,
    format::{ConsoleFormatter, EventFormatter, JsonFormatter, PlainTextFormatter},
    future::FutureExt,
    init::{LogStream, initialize_logging, try_initialize_logging},
    record::{ErrorInfo, EventRecord},
    stack::current_logging_context,
    value::ContextValue,
};

pub mod capture;
mod context;
pub mod event;
pub mod fields;
pub mod format;
pub mod future;
pub mod guard;
mod init;
mod record;
mod stack;
mod value;

type StaticCowStr = Cow<'static, str>;

/// A [`log::Log`] implementation that renders records through an
/// [`EventFormatter`] and writes them to a configured stream.
///
/// Log statements emitted while a [`LogContext`] scope is active carry the
/// scope's fields. Rendering and writing never panic and never propagate
/// errors into the application; the worst case is a degraded or rerouted
/// log line.
pub struct EcsLogger {
    formatter: Box<dyn EventFormatter + Send + Sync>,
    writer: Mutex<Box<dyn Write + Send>>,
    filter: log::LevelFilter,
    overrides: Vec<(String, log::LevelFilter)>,
}

impl EcsLogger {
    /// Creates a logger rendering through `formatter` to stdout.
    pub fn new<F>(formatter: F) -> Self
    where
        F: EventFormatter + Send + Sync + 'static,
    {
        Self::boxed(Box::new(formatter))
    }

    /// As [`new`](Self::new), for an already boxed formatter.
    pub fn boxed(formatter: Box<dyn EventFormatter + Send + Sync>) -> Self {
        Self {
            formatter,
            writer: Mutex::new(Box::new(std::io::stdout())),
            filter: log::LevelFilter::Info,
            overrides: Vec::new(),
        }
    }

    /// Redirects output to `writer`.
    #[must_use]
    pub fn with_writer<W>(mut self, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        self.writer = Mutex::new(Box::new(writer));
        self
    }

    /// Sets the default level filter.
    #[must_use]
    pub const fn with_level(mut self, filter: log::LevelFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Overrides the level for one logger and its descendants (matched on
    /// `::` path boundaries, longest prefix first).
    #[must_use]
    pub fn with_override(mut self, logger: impl Into<String>, filter: log::LevelFilter) -> Self {
        self.overrides.push((logger.into(), filter));
        self
    }

    /// Initializes the global logger.
    ///
    /// This should be called early in the execution of a Rust program. Any
    /// log events that occur before initialization will be ignored.
    ///
    /// # Panics
    ///
    /// Panics if a logger has already been set.
    pub fn init(self) {
        self.try_init()
            .expect("EcsLogger::init should not be called after logger initialization");
    }

    /// Initializes the global logger.
    ///
    /// # Errors
    ///
    /// Returns an error if a logger has already been set.
    pub fn try_init(self) -> Result<(), log::SetLoggerError> {
        let max_level = self
            .overrides
            .iter()
            .map(|(_, filter)| *filter)
            .fold(self.filter, std::cmp::max);
        log::set_max_level(max_level);
        log::set_boxed_logger(Box::new(self))
    }

    fn effective_filter(&self, target: &str) -> log::LevelFilter {
        self.overrides
            .iter()
            .filter(|(logger, _)| {
                target == logger
                    || (target.starts_with(logger.as_str())
                        && target[logger.len()..].starts_with("::"))
            })
            .max_by_key(|(logger, _)| logger.len())
            .map_or(self.filter, |(_, filter)| *filter)
    }
}

impl std::fmt::Debug for EcsLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcsLogger")
            .field("filter", &self.filter)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

impl log::Log for EcsLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.effective_filter(metadata.target())
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let event = EventRecord::from_log(record);
        let line = self.formatter.format(&event);

        match self.writer.lock() {
            Ok(mut writer) => {
                if writeln!(writer, "{line}").is_err() {
                    // We can't use `log::error!` here because we are in the
                    // middle of logging and the invocation would recurse.
                    eprintln!("{line}");
                }
            }
            Err(_) => eprintln!("{line}"),
        }
    }

    fn flush(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
