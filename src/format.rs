//! Rendering events as colorized text, plain text, or ECS-style JSON.

use colored::{Color, Colorize};
use serde_json::Value;

use crate::event::build_event;
use crate::fields::{FieldMap, normalize_dict};
use crate::record::EventRecord;

/// Renders one record as a complete line. Implementations never fail;
/// malformed input degrades to a best-effort string.
pub trait EventFormatter {
    fn format(&self, record: &EventRecord) -> String;
}

/// Origin and process fields left out of a console line's key=value tail.
const CONSOLE_SUPPRESSED_FIELDS: &[&str] = &[
    "error.type",
    "error.message",
    "error.stack_trace",
    "log.file.path",
    "log.origin.file.name",
    "log.origin.file.line",
    "log.origin.function",
    "process.pid",
    "process.name",
    "process.thread.id",
    "process.thread.name",
];

// The error trio is rendered separately, after the line.
const PLAIN_SUPPRESSED_FIELDS: &[&str] = &["error.type", "error.message", "error.stack_trace"];

/// Strings pass through; anything else is JSON-encoded, with a plain string
/// conversion as the fallback.
fn format_extra(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn pop_string(event: &mut FieldMap, key: &str) -> String {
    match event.shift_remove(key) {
        Some(Value::String(text)) => text,
        Some(other) => format_extra(&other),
        None => String::new(),
    }
}

fn error_tail(record: &EventRecord) -> String {
    match &record.error {
        Some(error) => {
            let mut tail = format!("\n{}: {}", error.kind, error.message);
            if !error.stack_trace.is_empty() {
                tail.push('\n');
                tail.push_str(error.stack_trace.trim_end_matches('\n'));
            }
            tail
        }
        None => String::new(),
    }
}

/// `[timestamp] [LEVEL] message | key=value …` without any colors.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextFormatter;

impl EventFormatter for PlainTextFormatter {
    fn format(&self, record: &EventRecord) -> String {
        let mut event = build_event(record);

        let timestamp = pop_string(&mut event, "@timestamp");
        let mut message = pop_string(&mut event, "message");
        let level = pop_string(&mut event, "log.level");

        for field in PLAIN_SUPPRESSED_FIELDS {
            event.shift_remove(*field);
        }

        let extra_pairs: Vec<String> = event
            .iter()
            .map(|(key, value)| format!("{key}={}", format_extra(value)))
            .collect();
        if !extra_pairs.is_empty() {
            message = format!("{message} | {}", extra_pairs.join(" "));
        }

        format!("[{timestamp}] [{level}] {message}{}", error_tail(record))
    }
}

/// The colorized variant of [`PlainTextFormatter`] for terminals: level and
/// message take the severity color, keys are green, and the line ends with
/// an explicit reset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFormatter;

const RESET: &str = "\x1b[0m";

impl ConsoleFormatter {
    const fn level_color(level: log::Level) -> Color {
        match level {
            log::Level::Trace | log::Level::Debug => Color::White,
            log::Level::Info => Color::BrightWhite,
            log::Level::Warn => Color::Yellow,
            log::Level::Error => Color::Red,
        }
    }

    fn colorize(text: &str, color: Color) -> String {
        text.color(color).to_string()
    }
}

impl EventFormatter for ConsoleFormatter {
    fn format(&self, record: &EventRecord) -> String {
        let mut event = build_event(record);
        let color = Self::level_color(record.level);

        let timestamp = pop_string(&mut event, "@timestamp");
        let message = Self::colorize(&pop_string(&mut event, "message"), color);
        let level = Self::colorize(&pop_string(&mut event, "log.level"), color);

        for field in CONSOLE_SUPPRESSED_FIELDS {
            event.shift_remove(*field);
        }

        let extra_pairs: Vec<String> = event
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    Self::colorize(key, Color::Green),
                    format_extra(value)
                )
            })
            .collect();
        let message = if extra_pairs.is_empty() {
            message
        } else {
            format!("{message} | {}", extra_pairs.join(" "))
        };

        format!(
            "[{timestamp}] [{level}] {message}{}{RESET}",
            error_tail(record)
        )
    }
}

/// Renders the event as a single line of ECS-style JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Turns a flattened event into an ECS-compatible JSON document.
    ///
    /// `@timestamp`, `log.level` and `message` come first in that order
    /// when present; the remaining top-level keys are sorted, expanded to
    /// nested form, and appended. Output is compact, with stable key order.
    pub fn format_json(&self, event: FieldMap) -> String {
        let mut event = event;
        let mut ordered = FieldMap::new();
        for key in ["@timestamp", "log.level", "message"] {
            if let Some(value) = event.shift_remove(key) {
                ordered.insert(key.to_owned(), value);
            }
        }

        let mut rest: Vec<(String, Value)> = event.into_iter().collect();
        rest.sort_by(|left, right| left.0.cmp(&right.0));
        let sorted: FieldMap = rest.into_iter().collect();
        for (key, value) in normalize_dict(&sorted) {
            ordered.insert(key, value);
        }

        serde_json::to_string(&ordered).unwrap_or_else(|_| "{}".to_owned())
    }
}

impl EventFormatter for JsonFormatter {
    fn format(&self, record: &EventRecord) -> String {
        self.format_json(build_event(record))
    }
}
