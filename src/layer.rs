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

//! [gelf-tracing](crate) [`Layer`] implementations.
//!
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//!
//! A basic struct [`Layer`] is defined, with constructors for the sensible combinations of type
//! parameters. Consumers of this crate are of course free to implement the [`EventMapper`] and
//! [`Transport`] traits for themselves & provide their own implementations.
//!
//! The layer is a thin shim with no logic of its own: map the event, convert it, hand the
//! payload to the transport. Failures anywhere along that path are logged & dropped —
//! fire-and-forget delivery means the logging caller never sees them.

use crate::{
    error::{Error, Result},
    gelf::Gelf,
    tracing::{DefaultEventMapper, EventMapper},
    transport::{Transport, UdpTransport},
};

use backtrace::Backtrace;
use tracing::Event;
use tracing_subscriber::layer::Context;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          struct Layer                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A [`tracing-subscriber`]-compliant [`Layer`] implementation that will ship [`Event`]s to a
/// GELF collector.
///
/// [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
/// [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
pub struct Layer<S, M: EventMapper<S>, T: Transport>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    formatter: Gelf,
    mapper: M,
    transport: T,
    // I need the Subscriber implementation type as a type parameter to transmit it to the
    // EventMapper trait. 👇 gets the compiler to shut-up about unused type parameters.
    subscriber_type: std::marker::PhantomData<S>,
}

/// A [`Layer`] implementation with the following characteristics:
///
/// - Uses the default mapper for rendering Tracing events into log events
/// - Produces GELF 1.1 documents with default configuration (no facility, discovered hostname)
/// - Sends the resulting documents over UDP to port 12201 on localhost
///
/// May be used with any [`tracing_subscriber::Subscriber`] implementation that supports
/// [`LookupSpan`].
///
/// [`tracing_subscriber::Subscriber`]: https://docs.rs/tracing/latest/tracing/trait.Subscriber.html
/// [`LookupSpan`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/registry/trait.LookupSpan.html
impl<S> Layer<S, DefaultEventMapper, UdpTransport>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    /// Attempt to construct a [`Layer`] that will ship GELF documents via UDP to port 12201 on
    /// localhost
    pub fn try_default() -> Result<Self> {
        Ok(Layer {
            formatter: Gelf::default(),
            mapper: DefaultEventMapper::default(),
            transport: UdpTransport::local()?,
            subscriber_type: std::marker::PhantomData,
        })
    }
}

impl<S, M: EventMapper<S>, T: Transport> Layer<S, M, T>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    /// construct Layer with custom inners
    pub fn new(formatter: Gelf, mapper: M, transport: T) -> Self {
        Layer {
            formatter,
            mapper,
            transport,
            subscriber_type: std::marker::PhantomData,
        }
    }
}

/// Customize a [`Layer`] implementation with a custom [`Transport`] implementation (and,
/// optionally, a custom-configured [`Gelf`] converter). May be used with any
/// [`tracing_subscriber::Subscriber`] implementation that supports [`LookupSpan`].
///
/// [`tracing_subscriber::Subscriber`]: https://docs.rs/tracing/latest/tracing/trait.Subscriber.html
/// [`LookupSpan`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/registry/trait.LookupSpan.html
impl<S, T: Transport> Layer<S, DefaultEventMapper, T>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    /// Construct a Layer that will ship GELF documents via transport `transport`
    pub fn with_transport(transport: T) -> Self {
        Layer {
            formatter: Gelf::default(),
            mapper: DefaultEventMapper::default(),
            transport,
            subscriber_type: std::marker::PhantomData,
        }
    }

    /// Construct a Layer that will ship documents produced by `formatter` via transport
    /// `transport`
    pub fn with_transport_and_formatter(transport: T, formatter: Gelf) -> Self {
        Layer {
            formatter,
            mapper: DefaultEventMapper::default(),
            transport,
            subscriber_type: std::marker::PhantomData,
        }
    }
}

/// This is the Big Tuna-- the [`Layer`] implementation.
///
/// [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
impl<S, M, T> tracing_subscriber::layer::Layer<S> for Layer<S, M, T>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    M: EventMapper<S> + 'static,
    T: Transport + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        self.mapper
            .on_event(event, ctx) // :=> StdResult<Option<LogEvent>, <M as EventMapper>::Error>
            .map_err(|err| Error::Format {
                source: Box::new(err),
                back: Backtrace::new(),
            }) // 👈:=> StdResult<Option<LogEvent>, Error>
            .and_then(|x| {
                // x is an Option<LogEvent>; a None from the converter is a silent drop, not
                // an error (the event had nothing worth shipping).
                if let Some(mut log_event) = x {
                    match self.formatter.format(&mut log_event)? {
                        Some(buf) => self.transport.send(&buf).map(|_| ()),
                        None => Ok(()),
                    }
                } else {
                    Ok(())
                }
            })
            .unwrap_or_else(|_err| {
                ::tracing::error!("gelf-tracing failed to ship an event");
            })
    }
}

#[cfg(test)]
mod smoke {

    use super::*;

    use serde_json::Value;
    use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
    use tracing_subscriber::registry::Registry;

    /// End-to-end over loopback UDP: fire an event through a real subscriber stack, receive the
    /// datagram, and check the document.
    #[test]
    fn ships_a_gelf_document_over_loopback() {
        let receiver = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(std::time::Duration::from_secs(5)))
            .unwrap();
        let addr = receiver.local_addr().unwrap();

        let formatter = Gelf::builder()
            .hostname("bree.local")
            .facility("prototyping")
            .build();
        let layer =
            Layer::with_transport_and_formatter(UdpTransport::new(addr).unwrap(), formatter);
        let subscriber = Registry::default().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(music = "hans zimmer", "we need to go deeper");
        });

        let mut buf = [0u8; 8192];
        let (received, _) = receiver.recv_from(&mut buf).unwrap();
        let doc: Value = serde_json::from_slice(&buf[..received]).unwrap();

        assert_eq!(doc["version"], "1.1");
        assert_eq!(doc["host"], "bree.local");
        assert_eq!(doc["short_message"], "we need to go deeper");
        assert_eq!(doc["full_message"], "we need to go deeper");
        assert_eq!(doc["level"], 6);
        assert_eq!(doc["_music"], "hans zimmer");
        assert_eq!(doc["_facility"], "prototyping");
        assert_eq!(doc["_loggerName"], module_path!());
        assert_eq!(doc["_file"], file!());
        assert!(doc["_line"].is_u64());
        assert!(doc["timestamp"].is_f64());
        // The document is flat: no value is a non-empty object or array.
        for (_key, value) in doc.as_object().unwrap() {
            assert!(!value.is_object() && !value.is_array());
        }
    }
}
