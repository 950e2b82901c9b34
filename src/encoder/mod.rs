//! Batch body encoding for the Logz.io listener.
//!
//! Each record becomes one JSON object; objects are joined with `",\n"`.
//! The listener reads this as its line-delimited bulk format, so the body is
//! deliberately not wrapped in an array.

pub mod convert;

use crate::domain::EventRecord;
use chrono::SecondsFormat;
use serde_json::{Map, Value};

pub use convert::to_json;

pub const CONTENT_TYPE: &str = "application/json";
pub const RECORD_SEPARATOR: &str = ",\n";

const PROPERTIES_PREFIX: &str = "Properties.";
const SOURCE_CONTEXT: &str = "SourceContext";
const THREAD_ID: &str = "ThreadId";

// Rough per-record size used to presize the output buffer.
const ESTIMATED_RECORD_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadEncoder {
    flatten_properties: bool,
}

impl PayloadEncoder {
    pub fn new(flatten_properties: bool) -> Self {
        Self { flatten_properties }
    }

    pub fn flatten_properties(&self) -> bool {
        self.flatten_properties
    }

    pub fn encode(&self, records: &[EventRecord]) -> String {
        let mut body = String::with_capacity(records.len().saturating_mul(ESTIMATED_RECORD_SIZE));
        for (i, record) in records.iter().enumerate() {
            if i > 0 {
                body.push_str(RECORD_SEPARATOR);
            }
            body.push_str(&Value::Object(self.record_object(record)).to_string());
        }
        body
    }

    /// Builds the JSON object for one record.
    pub fn record_object(&self, record: &EventRecord) -> Map<String, Value> {
        let mut object = Map::new();
        object.insert(
            "@timestamp".to_string(),
            Value::String(
                record
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Micros, false),
            ),
        );
        object.insert(
            "level".to_string(),
            Value::String(record.level.as_str().to_string()),
        );
        object.insert(
            "message".to_string(),
            Value::String(record.message_template.clone()),
        );
        object.insert(
            "RenderedMessage".to_string(),
            Value::String(record.rendered_message.clone()),
        );
        object.insert(
            "Exception".to_string(),
            record
                .exception
                .as_ref()
                .map_or(Value::Null, |e| Value::String(e.clone())),
        );

        if let Some(source_context) = record.properties.get(SOURCE_CONTEXT) {
            let hoisted = match source_context.as_str() {
                Some(s) => Value::String(s.to_string()),
                None => to_json(source_context),
            };
            object.insert(SOURCE_CONTEXT.to_string(), hoisted);
        }

        if let Some(thread_id) = record.properties.get(THREAD_ID) {
            object.insert(THREAD_ID.to_string(), to_json(thread_id));
        }

        let prefix = if self.flatten_properties {
            ""
        } else {
            PROPERTIES_PREFIX
        };
        for (name, value) in &record.properties {
            object.insert(format!("{prefix}{name}"), to_json(value));
        }

        object
    }
}

/// Encodes `records` into one request body.
pub fn encode(records: &[EventRecord], flatten_properties: bool) -> String {
    PayloadEncoder::new(flatten_properties).encode(records)
}
