//! The record abstraction consumed by the event assembler.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde_json::Value;

use crate::fields::FieldMap;

/// A single log event, decoupled from the `log` crate so formatters can be
/// driven directly.
///
/// Instances are ephemeral: one is built per log call and discarded after
/// rendering.
#[derive(Debug)]
pub struct EventRecord {
    pub timestamp: DateTime<FixedOffset>,
    pub level: log::Level,
    pub message: String,
    /// Logger name, the record's target.
    pub logger: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    /// Closest equivalent of an origin function name.
    pub function: Option<String>,
    pub module_path: Option<String>,
    pub process_id: u32,
    pub process_name: Option<String>,
    pub thread_id: Option<String>,
    pub thread_name: Option<String>,
    /// Explicit per-call fields; these take final precedence in the event.
    pub extra: FieldMap,
    pub error: Option<ErrorInfo>,
}

/// Exception details attached to a record.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// The error's type name.
    pub kind: String,
    pub message: String,
    /// Rendered cause chain, outermost first.
    pub stack_trace: String,
}

impl ErrorInfo {
    pub fn new(
        kind: impl Into<String>,
        message: impl Into<String>,
        stack_trace: impl Into<String>,
    ) -> Self {
        let stack_trace = stack_trace.into();
        Self {
            kind: kind.into(),
            message: message.into(),
            stack_trace: stack_trace.trim_start_matches('\n').to_owned(),
        }
    }

    /// Captures an error's type name, message and source chain.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut trace = String::new();
        let mut source = error.source();
        while let Some(cause) = source {
            trace.push_str(&format!("caused by: {cause}\n"));
            source = cause.source();
        }
        Self::new(short_type_name::<E>(), error.to_string(), trace)
    }
}

fn process_name() -> Option<String> {
    std::env::current_exe().ok().and_then(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
    })
}

fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full).to_owned()
}

impl EventRecord {
    /// Builds a record from a [`log::Record`], capturing the clock, process
    /// and thread identity, and the record's key/value pairs.
    pub fn from_log(record: &log::Record<'_>) -> Self {
        let thread = std::thread::current();
        Self {
            timestamp: Utc::now().fixed_offset(),
            level: record.level(),
            message: record.args().to_string(),
            logger: record.target().to_owned(),
            file: record.file().map(ToOwned::to_owned),
            line: record.line(),
            function: record.module_path().map(ToOwned::to_owned),
            module_path: record.module_path().map(ToOwned::to_owned),
            process_id: std::process::id(),
            process_name: process_name(),
            thread_id: Some(format!("{:?}", thread.id())),
            thread_name: thread.name().map(ToOwned::to_owned),
            extra: collect_key_values(record),
            error: None,
        }
    }

    #[must_use]
    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    /// The record timestamp in ISO-8601 form.
    ///
    /// A zero offset renders as the explicit `Z` designator; any other
    /// offset renders numerically and is never silently converted to `Z`.
    pub fn iso_timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// Harvests a record's key/value pairs into concrete field values. Values
/// that fail to serialize degrade to their string form.
fn collect_key_values(record: &log::Record<'_>) -> FieldMap {
    struct Collector(FieldMap);

    impl<'kvs> log::kv::VisitSource<'kvs> for Collector {
        fn visit_pair(
            &mut self,
            key: log::kv::Key<'kvs>,
            value: log::kv::Value<'kvs>,
        ) -> Result<(), log::kv::Error> {
            let json = serde_json::to_value(&value)
                .unwrap_or_else(|_| Value::String(value.to_string()));
            self.0.insert(key.as_str().to_owned(), json);
            Ok(())
        }
    }

    let mut collector = Collector(FieldMap::new());
    // A misbehaving kv source degrades the record, never the log call.
    let _ = record.key_values().visit(&mut collector);
    collector.0
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_iso_timestamp_uses_z_for_utc() {
        let record = test_record(FixedOffset::east_opt(0).unwrap());
        assert_eq!(record.iso_timestamp(), "2024-05-04T03:02:01.000500Z");
    }

    #[test]
    fn test_iso_timestamp_keeps_real_offset() {
        let record = test_record(FixedOffset::west_opt(8 * 3600).unwrap());
        assert_eq!(record.iso_timestamp(), "2024-05-04T03:02:01.000500-08:00");
    }

    #[test]
    fn test_error_info_from_error() {
        let inner = std::io::Error::other("disk on fire");
        let info = ErrorInfo::from_error(&inner);
        assert_eq!(info.kind, "Error");
        assert_eq!(info.message, "disk on fire");
        assert_eq!(info.stack_trace, "");
    }

    #[test]
    fn test_error_info_strips_leading_blank_lines() {
        let info = ErrorInfo::new("Oops", "bad", "\n\ncaused by: worse\n");
        assert_eq!(info.stack_trace, "caused by: worse\n");
    }

    fn test_record(offset: FixedOffset) -> EventRecord {
        EventRecord {
            timestamp: offset
                .with_ymd_and_hms(2024, 5, 4, 3, 2, 1)
                .unwrap()
                .checked_add_signed(chrono::Duration::microseconds(500))
                .unwrap(),
            level: log::Level::Info,
            message: "hello".to_owned(),
            logger: "test".to_owned(),
            file: None,
            line: None,
            function: None,
            module_path: None,
            process_id: 1,
            process_name: None,
            thread_id: None,
            thread_name: None,
            extra: FieldMap::new(),
            error: None,
        }
    }
}
