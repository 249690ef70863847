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

//! Primitives for mapping [`tracing`] entities to [`LogEvent`]s.
//!
//! [`EventMapper`] implementations handle rendering [`Event`]s into the converter's input
//! model. This module provides a single implementation, [`DefaultEventMapper`], which takes an
//! [`Event`]'s "message" field as the log message and every other field as a property.
//!
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html

use crate::{
    error::Error,
    gelf::LogEvent,
    level::Level,
};

use backtrace::Backtrace;
use serde_json::{Map, Value};

// When the tracing-log feature is enabled, use NormalizeEvent to extract file/line metadata
// from events that originated from the `log` crate. This follows the same pattern used by
// tracing-subscriber's fmt layer.
// See: https://github.com/tokio-rs/tracing/blob/master/tracing-subscriber/src/fmt/fmt_layer.rs
#[cfg(feature = "tracing-log")]
use tracing_log::NormalizeEvent;

type StdResult<T, E> = std::result::Result<T, E>;

/// Render [`tracing`] [`Event`]s into [`LogEvent`]s.
///
/// [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
/// [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
///
/// The trip from a [`tracing`] event to a collector occurs in three parts:
///
/// 1. rendering the Event into a [`LogEvent`] (message, level, source location, properties)
///
/// 2. converting that [`LogEvent`] into a GELF document & serializing it
///
/// 3. transporting the resulting payload to the collector
///
/// Trait [`EventMapper`] formally defines step 1. An implementation shall indicate, firstly,
/// whether this event shall produce a log document at all, and if so, what the fields of the
/// [`LogEvent`] shall be. Implementations have the [`Context`] at their disposal should they
/// wish to incorporate span-scoped values; [`DefaultEventMapper`] does not.
///
/// [`Context`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/struct.Context.html
pub trait EventMapper<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    type Error: std::error::Error + Send + Sync + 'static;
    /// An event has occurred
    fn on_event(
        &self,
        event: &tracing::Event,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> StdResult<Option<LogEvent>, Self::Error>;
}

fn default_level_mapping(level: &tracing::Level) -> Level {
    Level::from(level)
}

/// An [`EventMapper`] that takes an [`Event`]'s "message" field as the log message (fails if
/// there is none) and records every other field as a property, preserving native JSON types
/// where the [`Visit`] API surfaces them.
///
/// [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
/// [`Visit`]: https://docs.rs/tracing/0.1.35/tracing/field/trait.Visit.html
pub struct DefaultEventMapper {
    map_level: Box<dyn Fn(&tracing::Level) -> Level + Send + Sync>,
}

impl DefaultEventMapper {
    /// Replace the default [`tracing::Level`] to [`Level`] mapping.
    pub fn with_level_mapping<F>(map_level: F) -> Self
    where
        F: Fn(&tracing::Level) -> Level + Send + Sync + 'static,
    {
        DefaultEventMapper {
            map_level: Box::new(map_level),
        }
    }
}

impl std::default::Default for DefaultEventMapper {
    fn default() -> Self {
        DefaultEventMapper {
            map_level: Box::new(default_level_mapping),
        }
    }
}

struct GelfEventVisitor {
    message: Option<String>,
    properties: Map<String, Value>,
}

impl tracing::field::Visit for GelfEventVisitor {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.properties
            .insert(field.name().to_owned(), Value::from(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.properties
            .insert(field.name().to_owned(), Value::from(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.properties
            .insert(field.name().to_owned(), Value::from(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.properties
            .insert(field.name().to_owned(), Value::from(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        } else {
            self.properties
                .insert(field.name().to_owned(), Value::from(value));
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            // Regrettably, we have only a `Debug` implementation available to us; but the tracing
            // macros `info!()`, `event!()` & the like all take care to "pre-format" the `mesage`
            // field so that `value` actually refers to a `std::fmt::Arguments` instance, which will
            // print to a debug format without enclosing double-quotes.
            self.message = Some(format!("{:?}", value));
        } else {
            self.properties
                .insert(field.name().to_owned(), Value::from(format!("{:?}", value)));
        }
    }
}

impl<S> EventMapper<S> for DefaultEventMapper
where
    S: tracing_core::subscriber::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    type Error = Error;
    fn on_event(
        &self,
        event: &tracing::Event,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> StdResult<Option<LogEvent>, Error> {
        // When the tracing-log feature is enabled, use normalized_metadata() to get file/line
        // info for events that originated from the `log` crate. For native tracing events,
        // normalized_metadata() returns None and we use the event's own metadata.
        #[cfg(feature = "tracing-log")]
        let normalized_meta = event.normalized_metadata();
        #[cfg(feature = "tracing-log")]
        let meta = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());
        #[cfg(not(feature = "tracing-log"))]
        let meta = event.metadata();

        let mut visitor = GelfEventVisitor {
            message: None,
            properties: Map::new(),
        };
        event.record(&mut visitor);

        let message = visitor.message.ok_or(Error::NoMessageField {
            name: event.metadata().name(),
            back: Backtrace::new(),
        })?;

        let mut log_event = LogEvent::new(message, (self.map_level)(meta.level()));
        log_event.logger_name = Some(meta.target().to_owned());
        log_event.file = meta.file().map(|f| f.to_owned());
        log_event.line = meta.line();
        log_event.properties = visitor.properties;

        Ok(Some(log_event))
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use serde_json::json;
    use tracing::Callsite;
    use tracing::field::Visit;

    // Just enough `tracing` machinery to hand ourselves Fields against which to drive the
    // visitor; `tracing` internals are explicitly unstable, so we keep this minimal.

    struct TestCallsite {
        metadata: &'static tracing::Metadata<'static>,
    }
    impl tracing_core::callsite::Callsite for TestCallsite {
        fn set_interest(&self, _interest: tracing_core::subscriber::Interest) {}
        fn metadata(&self) -> &tracing::Metadata<'static> {
            self.metadata
        }
    }
    impl TestCallsite {
        pub const fn new(metadata: &'static tracing::Metadata<'static>) -> TestCallsite {
            TestCallsite { metadata }
        }
    }

    static CALLSITE: TestCallsite = {
        static METADATA: tracing::Metadata = tracing::Metadata::new(
            "test event metadata",
            "test-target",
            tracing::Level::INFO,
            Some(file!()),
            Some(line!()),
            Some(module_path!()),
            tracing::field::FieldSet::new(
                &["message", "music", "count", "flag"],
                tracing_core::callsite::Identifier(&CALLSITE),
            ),
            tracing_core::metadata::Kind::EVENT,
        );
        TestCallsite::new(&METADATA)
    };

    #[test]
    fn visitor_captures_message_and_typed_properties() {
        let fields = CALLSITE.metadata().fields();
        let mut visitor = GelfEventVisitor {
            message: None,
            properties: Map::new(),
        };

        visitor.record_debug(
            &fields.field("message").unwrap(),
            &format_args!("we need to go deeper"),
        );
        visitor.record_str(&fields.field("music").unwrap(), "hans zimmer");
        visitor.record_i64(&fields.field("count").unwrap(), -3);
        visitor.record_bool(&fields.field("flag").unwrap(), true);

        assert_eq!(visitor.message.as_deref(), Some("we need to go deeper"));
        assert_eq!(visitor.properties["music"], json!("hans zimmer"));
        assert_eq!(visitor.properties["count"], json!(-3));
        assert_eq!(visitor.properties["flag"], json!(true));
        assert_eq!(visitor.properties.len(), 3);
    }

    #[test]
    fn message_recorded_as_str_is_not_a_property() {
        let fields = CALLSITE.metadata().fields();
        let mut visitor = GelfEventVisitor {
            message: None,
            properties: Map::new(),
        };

        visitor.record_str(&fields.field("message").unwrap(), "plain");

        assert_eq!(visitor.message.as_deref(), Some("plain"));
        assert!(visitor.properties.is_empty());
    }
}
