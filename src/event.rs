//! Assembling a flat, ECS-named event map from a record.

use serde_json::Value;

use crate::fields::{FieldMap, flatten_dict};
use crate::record::EventRecord;
use crate::stack::current_logging_context;

/// Record attribute names mapped to their ECS field names.
///
/// An empty target drops the attribute as noise; attributes missing from
/// the table pass through under their own name.
pub const RECORD_MAPPINGS: &[(&str, &str)] = &[
    ("level", "log.level"),
    ("logger", "log.logger"),
    ("file", "log.origin.file.name"),
    ("line", "log.origin.file.line"),
    ("function", "log.origin.function"),
    ("path", "log.file.path"),
    ("module_path", ""),
    ("pid", "process.pid"),
    ("process_name", "process.name"),
    ("thread_id", "process.thread.id"),
    ("thread_name", "process.thread.name"),
];

fn map_attribute(name: &str) -> Option<&'static str> {
    RECORD_MAPPINGS
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
}

fn file_basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Prepares a flattened event map with the basic ECS fields.
///
/// Precedence, lowest to highest: record-derived attributes, the active
/// context snapshot, the record's explicit extra fields. Error details are
/// added last under `error.*`. Users of this library are expected to be
/// hygienic about their use of field names.
pub fn build_event(record: &EventRecord) -> FieldMap {
    let mut event = FieldMap::new();
    event.insert("@timestamp".to_owned(), Value::String(record.iso_timestamp()));
    event.insert("message".to_owned(), Value::String(record.message.clone()));

    for (name, value) in record_attributes(record) {
        match map_attribute(name) {
            Some("") => {}
            Some(target) => {
                event.insert(target.to_owned(), value);
            }
            None => {
                event.insert(name.to_owned(), value);
            }
        }
    }

    for (key, value) in current_logging_context() {
        event.insert(key, value);
    }

    for (key, value) in &record.extra {
        event.insert(key.clone(), value.clone());
    }

    if let Some(error) = &record.error {
        event.insert("error.type".to_owned(), Value::String(error.kind.clone()));
        event.insert(
            "error.message".to_owned(),
            Value::String(error.message.clone()),
        );
        event.insert(
            "error.stack_trace".to_owned(),
            Value::String(error.stack_trace.clone()),
        );
    }

    flatten_dict(&event)
}

/// The record's attributes under their source names. Absent attributes are
/// skipped rather than rendered as nulls.
fn record_attributes(record: &EventRecord) -> Vec<(&'static str, Value)> {
    let mut attributes = vec![
        ("level", Value::String(record.level.to_string())),
        ("logger", Value::String(record.logger.clone())),
        ("pid", Value::Number(record.process_id.into())),
    ];
    if let Some(file) = &record.file {
        attributes.push(("path", Value::String(file.clone())));
        attributes.push(("file", Value::String(file_basename(file).to_owned())));
    }
    if let Some(line) = record.line {
        attributes.push(("line", Value::Number(line.into())));
    }
    if let Some(function) = &record.function {
        attributes.push(("function", Value::String(function.clone())));
    }
    if let Some(module_path) = &record.module_path {
        attributes.push(("module_path", Value::String(module_path.clone())));
    }
    if let Some(process_name) = &record.process_name {
        attributes.push(("process_name", Value::String(process_name.clone())));
    }
    if let Some(thread_id) = &record.thread_id {
        attributes.push(("thread_id", Value::String(thread_id.clone())));
    }
    if let Some(thread_name) = &record.thread_name {
        attributes.push(("thread_name", Value::String(thread_name.clone())));
    }
    attributes
}
