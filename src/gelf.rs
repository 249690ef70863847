// Copyright (C) 2026 The gelf-tracing Authors
//
// This file is part of gelf-tracing.
//
// gelf-tracing is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// gelf-tracing is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with gelf-tracing.  If
// not, see <http://www.gnu.org/licenses/>.

//! GELF [1.1]-compliant document conversion
//!
//! [1.1]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//!
//! [`Gelf`] converts a [`LogEvent`] into a GELF 1.1 JSON document: a *flat* JSON object with six
//! fixed fields (`version`, `host`, `short_message`, `full_message`, `timestamp`, `level`) and
//! any number of `_`-prefixed "additional fields". Since GELF forbids nested objects as field
//! values, arbitrarily nested property values are recursively flattened into composite-keyed
//! scalar leaves (`{"p": {"a": 1}}` becomes `"_p_a": 1`).
//!
//! Three rules govern additional-field keys:
//!
//! 1. keys are camel-cased, the convention Graylog dashboards expect;
//! 2. a key matching `id` case-insensitively is renamed to `id_` — the server reserves `_id`
//!    and would silently drop or mangle a message that carried it;
//! 3. keys not already starting with `_` get one prepended.

use crate::{
    error::{Error, Result},
    level::Level,
};

use backtrace::Backtrace;
use chrono::prelude::*;
use serde_json::{Map, Value};

const SHORT_MESSAGE_MAX_LENGTH: usize = 250;
const GELF_VERSION: &str = "1.1";

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          log events                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Details of a caught error, carried alongside a [`LogEvent`].
///
/// All three fields are optional; whichever are present are lifted into the event's property bag
/// (as `ExceptionSource`, `ExceptionMessage` & `StackTrace`) during conversion so that they pass
/// through the same key-naming pipeline as user properties.
#[derive(Clone, Debug, Default)]
pub struct Exception {
    pub source: Option<String>,
    pub message: Option<String>,
    pub stack_trace: Option<String>,
}

/// A structured log event: the converter's input.
///
/// Ordinarily assembled by the [`EventMapper`] from a [`tracing`] [`Event`], but the fields are
/// public so callers can build one by hand.
///
/// [`EventMapper`]: crate::tracing::EventMapper
/// [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
#[derive(Clone, Debug)]
pub struct LogEvent {
    /// The rendered log message. An event without one produces no document.
    pub message: Option<String>,
    pub level: Level,
    pub timestamp: DateTime<Utc>,
    /// The emitting logger's name (the `tracing` target, for mapped events).
    pub logger_name: Option<String>,
    /// Source file of the call site, if known.
    pub file: Option<String>,
    /// Source line of the call site, if known.
    pub line: Option<u32>,
    pub exception: Option<Exception>,
    /// Caller-supplied key/value pairs of unbounded nesting depth. Insertion order is
    /// preserved (`serde_json`'s `preserve_order` feature).
    pub properties: Map<String, Value>,
}

impl LogEvent {
    /// A minimal event with the given message & level, timestamped now. Everything else can be
    /// filled in through the public fields.
    pub fn new<M: Into<String>>(message: M, level: Level) -> LogEvent {
        LogEvent {
            message: Some(message.into()),
            level,
            timestamp: Utc::now(),
            logger_name: None,
            file: None,
            line: None,
            exception: None,
            properties: Map::new(),
        }
    }
}

impl std::default::Default for LogEvent {
    fn default() -> Self {
        LogEvent {
            message: None,
            level: Level::default(),
            timestamp: Utc::now(),
            logger_name: None,
            file: None,
            line: None,
            exception: None,
            properties: Map::new(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        key-naming policy                                       //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Newtonsoft-style camel casing, the de-facto convention for GELF additional fields.
///
/// Lower-cases the leading run of upper-case characters, stopping before an upper-case character
/// that begins a new word: `StackTrace` ⇒ `stackTrace`, `URLValue` ⇒ `urlValue`, `ID` ⇒ `id`.
/// Keys that don't start with an upper-case character pass through unchanged.
pub fn camel_case(key: &str) -> String {
    let mut chars: Vec<char> = key.chars().collect();
    if chars.is_empty() || !chars[0].is_uppercase() {
        return key.to_owned();
    }
    for i in 0..chars.len() {
        if !chars[i].is_uppercase() {
            break;
        }
        // The last upper-case char of a run starts the next word; leave it alone.
        if i > 0 && i + 1 < chars.len() && !chars[i + 1].is_uppercase() {
            break;
        }
        chars[i] = chars[i].to_lowercase().next().unwrap_or(chars[i]);
    }
    chars.into_iter().collect()
}

/// Attempt to figure-out the local hostname for the GELF `host` field.
///
/// Tries [gethostname()] first, then falls back to a local IP address, then to `localhost`; it
/// cannot fail.
///
/// [gethostname()]: https://man7.org/linux/man-pages/man2/gethostname.2.html
fn system_hostname() -> String {
    // `hostname::get()` returns a `Result<OsString,_>`, which is really kind of a hassle to
    // work with...
    hostname::get()
        .map_err(|err| Error::NoHostname {
            source: Box::new(err),
            back: Backtrace::new(),
        })
        .map(|hn| hn.to_string_lossy().into_owned())
        // vvv :=> StdResult<String, Error>
        .or_else(|_err| {
            local_ip_address::local_ip()
                .map(|ip| ip.to_string())
                .map_err(|err| Error::NoHostname {
                    source: Box::new(err),
                    back: Backtrace::new(),
                })
        })
        .unwrap_or_else(|_err| "localhost".to_owned())
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          struct Gelf                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A converter that produces GELF [1.1]-conformant JSON documents.
///
/// [1.1]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
///
/// Holds only read-only configuration (hostname, facility, the key-casing policy), so one
/// instance may be shared freely across threads; each [`convert`](Gelf::convert) call allocates
/// its own document.
pub struct Gelf {
    hostname: String,
    facility: Option<String>,
    key_casing: Box<dyn Fn(&str) -> String + Send + Sync>,
}

impl std::default::Default for Gelf {
    fn default() -> Self {
        Gelf {
            hostname: system_hostname(),
            facility: None,
            key_casing: Box::new(camel_case),
        }
    }
}

pub struct GelfBuilder {
    imp: Gelf,
}

impl GelfBuilder {
    /// Free-text label naming the logical subsystem emitting events; lands in the `_facility`
    /// additional field when non-blank.
    pub fn facility<S: Into<String>>(mut self, facility: S) -> Self {
        self.imp.facility = Some(facility.into());
        self
    }
    pub fn hostname<S: Into<String>>(mut self, hostname: S) -> Self {
        self.imp.hostname = hostname.into();
        self
    }
    /// Replace the default camel-casing policy applied to additional-field keys (including the
    /// names of nested object properties encountered while flattening).
    pub fn key_casing<F>(mut self, key_casing: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.imp.key_casing = Box::new(key_casing);
        self
    }
    pub fn build(self) -> Gelf {
        self.imp
    }
}

impl Gelf {
    pub fn builder() -> GelfBuilder {
        GelfBuilder {
            imp: Gelf::default(),
        }
    }

    /// Convert `event` into a GELF document, or `None` if the event carries no message.
    ///
    /// A `None` return is a silent drop, not a failure; an event whose message could not be
    /// rendered has nothing worth shipping, and no side effects will have occurred.
    ///
    /// Note that this *mutates* the caller's event: the exception fields (when present) and the
    /// synthetic `loggerName`/`facility`/`line`/`file` entries are injected into
    /// `event.properties` so that they run through the same keying & flattening pipeline as user
    /// properties. The `&mut` receiver makes the single-writer rule — one `convert` call per
    /// event at a time — a compile-time fact.
    pub fn convert(&self, event: &mut LogEvent) -> Option<Map<String, Value>> {
        let message = match event.message.as_deref() {
            Some(msg) if !msg.is_empty() => msg.to_owned(),
            _ => return None,
        };

        // Absent exception fields are omitted outright, *not* emitted as null; ordinary null
        // properties elsewhere do come through as null. The asymmetry is intentional.
        if let Some(exception) = &event.exception {
            if let Some(source) = &exception.source {
                event
                    .properties
                    .insert("ExceptionSource".to_owned(), Value::from(source.clone()));
            }
            if let Some(message) = &exception.message {
                event
                    .properties
                    .insert("ExceptionMessage".to_owned(), Value::from(message.clone()));
            }
            if let Some(stack_trace) = &exception.stack_trace {
                event
                    .properties
                    .insert("StackTrace".to_owned(), Value::from(stack_trace.clone()));
            }
        }

        // A raw cut, not word-boundary aware.
        let short_message: String = if message.chars().count() > SHORT_MESSAGE_MAX_LENGTH {
            message.chars().take(SHORT_MESSAGE_MAX_LENGTH).collect()
        } else {
            message.clone()
        };

        let mut doc = Map::new();
        doc.insert("version".to_owned(), Value::from(GELF_VERSION));
        doc.insert("host".to_owned(), Value::from(self.hostname.clone()));
        doc.insert("short_message".to_owned(), Value::from(short_message));
        doc.insert("full_message".to_owned(), Value::from(message));
        doc.insert(
            "timestamp".to_owned(),
            Value::from(unix_timestamp(&event.timestamp)),
        );
        doc.insert("level".to_owned(), Value::from(event.level.severity()));

        // `loggerName` rides along even when unset; facility & source location only when
        // present and non-blank.
        event.properties.insert(
            "loggerName".to_owned(),
            event
                .logger_name
                .clone()
                .map(Value::from)
                .unwrap_or(Value::Null),
        );
        if let Some(facility) = self.facility.as_deref().filter(|f| !f.trim().is_empty()) {
            event
                .properties
                .insert("facility".to_owned(), Value::from(facility));
        }
        if let Some(line) = event.line {
            event.properties.insert("line".to_owned(), Value::from(line));
        }
        if let Some(file) = event.file.clone().filter(|f| !f.trim().is_empty()) {
            event.properties.insert("file".to_owned(), Value::from(file));
        }

        for (key, value) in &event.properties {
            self.add_additional_field(&mut doc, key, value);
        }

        Some(doc)
    }

    /// [`convert`](Gelf::convert) and serialize: the UTF-8 JSON text handed to a
    /// [`Transport`](crate::transport::Transport), one document per datagram.
    pub fn format(&self, event: &mut LogEvent) -> Result<Option<Vec<u8>>> {
        match self.convert(event) {
            Some(doc) => serde_json::to_vec(&Value::Object(doc))
                .map(Some)
                .map_err(|err| Error::Format {
                    source: Box::new(err),
                    back: Backtrace::new(),
                }),
            None => Ok(None),
        }
    }

    fn add_additional_field(&self, doc: &mut Map<String, Value>, key: &str, value: &Value) {
        let key = self.normalize_key(key);

        if value.is_null() {
            doc.insert(key, Value::Null);
            return;
        }

        if has_children(value) {
            self.flatten_into(doc, &key, value);
        } else {
            // Scalars, and composites that decompose into nothing (`{}`, `[]`), land directly.
            doc.insert(key, value.clone());
        }
    }

    fn normalize_key(&self, key: &str) -> String {
        let key = (self.key_casing)(key);

        // GELF reserves `_id` for the server; it would shadow the storage engine's primary
        // key, so a property so named is renamed rather than refused.
        let key = if key.eq_ignore_ascii_case("id") {
            "id_".to_owned()
        } else {
            key
        };

        if key.starts_with('_') {
            key
        } else {
            format!("_{}", key)
        }
    }

    /// Emit the fully-flattened leaves of a composite `value` under composite keys formed by
    /// joining the parent key and each child's name (object property names, run through the
    /// casing policy, or array indices) with `_`. Intermediate composites themselves are never
    /// emitted. Later writes for a colliding key overwrite earlier ones; the converter does not
    /// guard against ambiguous nestings.
    fn flatten_into(&self, doc: &mut Map<String, Value>, key: &str, value: &Value) {
        match value {
            Value::Object(entries) => {
                for (name, child) in entries {
                    let child_key = format!("{}_{}", key, (self.key_casing)(name));
                    self.flatten_child(doc, &child_key, child);
                }
            }
            Value::Array(elements) => {
                for (index, child) in elements.iter().enumerate() {
                    let child_key = format!("{}_{}", key, index);
                    self.flatten_child(doc, &child_key, child);
                }
            }
            _ => {}
        }
    }

    fn flatten_child(&self, doc: &mut Map<String, Value>, child_key: &str, child: &Value) {
        if has_children(child) {
            self.flatten_into(doc, child_key, child);
        } else {
            doc.insert(child_key.to_owned(), child.clone());
        }
    }
}

/// GELF timestamps are seconds since the epoch, fractional part for sub-second precision.
fn unix_timestamp(timestamp: &DateTime<Utc>) -> f64 {
    timestamp.timestamp_millis() as f64 / 1000.0
}

fn has_children(value: &Value) -> bool {
    match value {
        Value::Object(entries) => !entries.is_empty(),
        Value::Array(elements) => !elements.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use serde_json::json;

    fn converter() -> Gelf {
        Gelf::builder()
            .hostname("test-host")
            .facility("TestFacility")
            .build()
    }

    fn test_event(message: &str) -> LogEvent {
        let mut event = LogEvent::new(message, Level::Info);
        event.logger_name = Some("GelfConverterTestLogger".to_owned());
        event
    }

    #[test]
    fn creates_gelf_json_correctly() {
        let mut event = test_event("Test Log Message");
        event
            .properties
            .insert("customproperty1".to_owned(), json!("customvalue1"));
        event
            .properties
            .insert("customproperty2".to_owned(), json!("customvalue2"));

        let doc = converter().convert(&mut event).unwrap();

        assert_eq!(doc["version"], json!("1.1"));
        assert_eq!(doc["host"], json!("test-host"));
        assert_eq!(doc["short_message"], json!("Test Log Message"));
        assert_eq!(doc["full_message"], json!("Test Log Message"));
        assert_eq!(doc["timestamp"], json!(unix_timestamp(&event.timestamp)));
        assert_eq!(doc["level"], json!(6));
        assert_eq!(doc["_facility"], json!("TestFacility"));
        assert_eq!(doc["_customproperty1"], json!("customvalue1"));
        assert_eq!(doc["_customproperty2"], json!("customvalue2"));
        assert_eq!(doc["_loggerName"], json!("GelfConverterTestLogger"));
        // ...and no other junk in there.
        assert_eq!(doc.len(), 10);
    }

    #[test]
    fn creates_gelf_json_correctly_with_flattened_extra_objects() {
        let mut event = test_event("Test Log Message");
        event
            .properties
            .insert("customproperty4".to_owned(), json!([1, 2, 3]));
        event
            .properties
            .insert("_customproperty1".to_owned(), json!("customvalue1"));
        event.properties.insert(
            "_customproperty2".to_owned(),
            json!({
                "Value1": "customvalue1",
                "Value2": "customvalue2",
                "Extra2": { "Value3": "customvalue3" }
            }),
        );
        event.properties.insert("customproperty3".to_owned(), json!(2));

        let doc = converter().convert(&mut event).unwrap();

        assert_eq!(doc["version"], json!("1.1"));
        assert_eq!(doc["level"], json!(6));
        assert_eq!(doc["_customproperty4_0"], json!(1));
        assert_eq!(doc["_customproperty4_1"], json!(2));
        assert_eq!(doc["_customproperty4_2"], json!(3));
        assert_eq!(doc["_customproperty1"], json!("customvalue1"));
        assert_eq!(doc["_customproperty2_value1"], json!("customvalue1"));
        assert_eq!(doc["_customproperty2_value2"], json!("customvalue2"));
        assert_eq!(doc["_customproperty2_extra2_value3"], json!("customvalue3"));
        assert_eq!(doc["_customproperty3"], json!(2));
        assert_eq!(doc["_loggerName"], json!("GelfConverterTestLogger"));
        assert_eq!(doc["_facility"], json!("TestFacility"));
        // No intermediate composite keys...
        assert!(!doc.contains_key("_customproperty2"));
        assert!(!doc.contains_key("_customproperty2_extra2"));
        assert!(!doc.contains_key("_customproperty4"));
        // ...and no other junk in there.
        assert_eq!(doc.len(), 16);
    }

    #[test]
    fn handles_exceptions_correctly() {
        let mut event = LogEvent::new("Test Message", Level::Error);
        event.exception = Some(Exception {
            source: None,
            message: Some("div by 0".to_owned()),
            stack_trace: None,
        });

        let doc = converter().convert(&mut event).unwrap();

        assert_eq!(doc["short_message"], json!("Test Message"));
        assert_eq!(doc["full_message"], json!("Test Message"));
        assert_eq!(doc["level"], json!(3));
        assert_eq!(doc["_facility"], json!("TestFacility"));
        assert_eq!(doc["_exceptionMessage"], json!("div by 0"));
        // Absent exception fields are omitted, not emitted as null...
        assert!(!doc.contains_key("_exceptionSource"));
        assert!(!doc.contains_key("_stackTrace"));
        // ...while the unset logger name does come through as null.
        assert_eq!(doc["_loggerName"], Value::Null);

        // The lift is a documented mutation of the caller's event.
        assert_eq!(event.properties["ExceptionMessage"], json!("div by 0"));
        assert!(!event.properties.contains_key("ExceptionSource"));
    }

    #[test]
    fn handles_long_message_correctly() {
        // 300 characters; the short message is a raw 250-character cut.
        let mut event = LogEvent::new("x".repeat(300), Level::Info);

        let doc = converter().convert(&mut event).unwrap();

        assert_eq!(doc["short_message"].as_str().unwrap().chars().count(), 250);
        assert_eq!(doc["full_message"].as_str().unwrap().chars().count(), 300);
    }

    #[test]
    fn short_message_untouched_at_the_boundary() {
        let mut event = LogEvent::new("y".repeat(250), Level::Info);

        let doc = converter().convert(&mut event).unwrap();

        assert_eq!(doc["short_message"], doc["full_message"]);
        assert_eq!(doc["short_message"].as_str().unwrap().chars().count(), 250);
    }

    #[test]
    fn handles_property_called_id_properly() {
        let mut event = LogEvent::new("Test", Level::Info);
        event
            .properties
            .insert("Id".to_owned(), json!("not_important"));

        let doc = converter().convert(&mut event).unwrap();

        assert!(!doc.contains_key("_id"));
        assert_eq!(doc["_id_"], json!("not_important"));
    }

    #[test]
    fn null_property_is_emitted_as_null() {
        let mut event = LogEvent::new("Test", Level::Info);
        event.properties.insert("p".to_owned(), Value::Null);

        let doc = converter().convert(&mut event).unwrap();

        assert!(doc.contains_key("_p"));
        assert_eq!(doc["_p"], Value::Null);
    }

    #[test]
    fn nested_objects_flatten_to_leaves_only() {
        let mut event = LogEvent::new("Test", Level::Info);
        event
            .properties
            .insert("p".to_owned(), json!({ "a": "x", "b": { "c": "y" } }));

        let doc = converter().convert(&mut event).unwrap();

        assert_eq!(doc["_p_a"], json!("x"));
        assert_eq!(doc["_p_b_c"], json!("y"));
        assert!(!doc.contains_key("_p"));
        assert!(!doc.contains_key("_p_b"));
    }

    #[test]
    fn empty_composites_are_emitted_directly() {
        let mut event = LogEvent::new("Test", Level::Info);
        event.properties.insert("empty_obj".to_owned(), json!({}));
        event.properties.insert("empty_arr".to_owned(), json!([]));
        event
            .properties
            .insert("nested".to_owned(), json!({ "inner": {} }));

        let doc = converter().convert(&mut event).unwrap();

        assert_eq!(doc["_empty_obj"], json!({}));
        assert_eq!(doc["_empty_arr"], json!([]));
        // A nested empty composite surfaces at its child key.
        assert_eq!(doc["_nested_inner"], json!({}));
    }

    #[test]
    fn missing_message_yields_no_document() {
        let mut event = LogEvent::default();
        assert!(converter().convert(&mut event).is_none());

        let mut event = LogEvent::new("", Level::Info);
        assert!(converter().convert(&mut event).is_none());
        // The silent drop has no side effects.
        assert!(event.properties.is_empty());
    }

    #[test]
    fn severity_table() {
        for (level, expected) in [
            (Level::Debug, 7),
            (Level::Trace, 6),
            (Level::Info, 6),
            (Level::Warn, 4),
            (Level::Error, 3),
            (Level::Fatal, 2),
        ] {
            let mut event = LogEvent::new("Test", level);
            let doc = converter().convert(&mut event).unwrap();
            assert_eq!(doc["level"], json!(expected), "level {}", level);
        }
    }

    #[test]
    fn document_round_trips_through_json() {
        let mut event = test_event("Round trip");
        event
            .properties
            .insert("p".to_owned(), json!({ "a": 1, "b": [true, null, 2.5] }));

        let gelf = converter();
        let doc = gelf.convert(&mut event.clone()).unwrap();
        let bytes = gelf.format(&mut event).unwrap().unwrap();
        let decoded: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(decoded, Value::Object(doc));
    }

    #[test]
    fn blank_facility_is_omitted() {
        let gelf = Gelf::builder().hostname("h").facility("   ").build();
        let mut event = LogEvent::new("Test", Level::Info);

        let doc = gelf.convert(&mut event).unwrap();

        assert!(!doc.contains_key("_facility"));
    }

    #[test]
    fn source_location_is_emitted_when_present() {
        let mut event = LogEvent::new("Test", Level::Info);
        event.file = Some("src/main.rs".to_owned());
        event.line = Some(42);

        let doc = converter().convert(&mut event).unwrap();

        assert_eq!(doc["_file"], json!("src/main.rs"));
        assert_eq!(doc["_line"], json!(42));
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("StackTrace"), "stackTrace");
        assert_eq!(camel_case("ExceptionMessage"), "exceptionMessage");
        assert_eq!(camel_case("URLValue"), "urlValue");
        assert_eq!(camel_case("Id"), "id");
        assert_eq!(camel_case("ID"), "id");
        assert_eq!(camel_case("customproperty1"), "customproperty1");
        assert_eq!(camel_case("_customproperty1"), "_customproperty1");
        assert_eq!(camel_case(""), "");
    }
}
