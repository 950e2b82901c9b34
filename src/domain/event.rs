use super::level::Level;
use super::value::PropertyValue;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A log event handed to the engine.
///
/// The message arrives already rendered; the template is kept alongside it so
/// the ingestion side can group events by template.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message_template: String,
    pub rendered_message: String,
    pub exception: Option<String>,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl EventRecord {
    pub fn new(
        level: Level,
        message_template: impl Into<String>,
        rendered_message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message_template: message_template.into(),
            rendered_message: rendered_message.into(),
            exception: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn builder(level: Level, message_template: impl Into<String>) -> EventRecordBuilder {
        EventRecordBuilder {
            record: EventRecord::new(level, message_template, String::new()),
            rendered: false,
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

pub struct EventRecordBuilder {
    record: EventRecord,
    rendered: bool,
}

impl EventRecordBuilder {
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.record.timestamp = timestamp;
        self
    }

    pub fn rendered(mut self, rendered_message: impl Into<String>) -> Self {
        self.record.rendered_message = rendered_message.into();
        self.rendered = true;
        self
    }

    pub fn exception(mut self, exception: impl Into<String>) -> Self {
        self.record.exception = Some(exception.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.record.properties.insert(name.into(), value.into());
        self
    }

    /// Falls back to the template text when no rendered message was given.
    pub fn build(mut self) -> EventRecord {
        if !self.rendered {
            self.record.rendered_message = self.record.message_template.clone();
        }
        self.record
    }
}
