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
//! A [`tracing-subscriber`] [`Layer`] implementation for shipping [`tracing`] [`Event`]s to a
//! [GELF] collector such as [Graylog]
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//! [`tracing`]: https://docs.rs/tracing/0.1.35/tracing/index.html
//! [`Event`]: https://docs.rs/tracing/0.1.35/tracing/struct.Event.html
//! [GELF]: https://go2docs.graylog.org/current/getting_in_log_data/gelf.html
//! [Graylog]: https://graylog.org/
//!
//! # Introduction
//!
//! GELF (the "Graylog Extended Log Format") is a JSON-based structured log wire format: a small
//! set of mandatory fields (`version`, `host`, `short_message`, `full_message`, `timestamp`,
//! `level`) plus an "additional field" convention (`_`-prefixed keys) for arbitrary structured
//! metadata. Crucially, a GELF document is *flat* -- the format forbids nested objects as field
//! values -- while the events a structured logging framework hands you carry arbitrarily nested
//! values. The heart of this crate is therefore the [`Gelf`] converter, which recursively
//! flattens nested property values into composite-keyed scalar leaves, translates severities to
//! the syslog scale GELF uses, truncates the short message to 250 characters, and keeps the
//! reserved `_id` key from ever reaching the server.
//!
//! [`Gelf`]: crate::gelf::Gelf
//!
//! Around that core sit three collaborators, each replaceable through a trait or builder:
//!
//! 1. an [`EventMapper`] renders a [`tracing`] [`Event`] into a [`LogEvent`] (message, level,
//!    source location, property bag);
//!
//! 2. the [`Gelf`] converter turns the [`LogEvent`] into a GELF 1.1 document & serializes it;
//!
//! 3. a [`Transport`] ships the payload, one document per UDP datagram, fire-and-forget.
//!
//! [`EventMapper`]: crate::tracing::EventMapper
//! [`LogEvent`]: crate::gelf::LogEvent
//! [`Transport`]: crate::transport::Transport
//!
//! There is deliberately no chunking, compression, batching, retry or acknowledgement logic in
//! the transport: GELF over UDP is a lossy, zero-ceremony path, and a logging backend should
//! never block or crash its host application. Delivery failures are logged & swallowed.
//!
//! # Usage
//!
//! [gelf-tracing](crate)'s [`Layer`] comes with sane defaults:
//!
//! ```no_run
//! use tracing::info;
//! use gelf_tracing::layer::Layer;
//! use tracing_subscriber::registry::Registry;
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//!
//! // The default configuration is to ship GELF 1.1 documents via UDP to port 12201
//! // on the localhost.
//! let subscriber = Registry::default().with(Layer::try_default().unwrap());
//!
//! info!("Hello, world!");
//! ```
//!
//! That said, the transport, the converter configuration and the means of rendering [`tracing`]
//! [`Event`]s are all configurable:
//!
//! ```no_run
//! use tracing::info;
//! use gelf_tracing::gelf::Gelf;
//! use gelf_tracing::layer::Layer;
//! use gelf_tracing::transport::UdpTransport;
//! use tracing_subscriber::registry::Registry;
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//!
//! let formatter = Gelf::builder().facility("checkout-service").build();
//! let subscriber = Registry::default().with(Layer::with_transport_and_formatter(
//!     UdpTransport::new("graylog.domain.io:12201").unwrap(),
//!     formatter,
//! ));
//!
//! info!(order_id = 42, "order accepted");
//! ```
//!
//! Will land in the collector as something like:
//!
//! ```text
//! {"version":"1.1","host":"app-host","short_message":"order accepted",
//!  "full_message":"order accepted","timestamp":1767225600.123,"level":6,
//!  "_order_id":42,"_loggerName":"checkout","_facility":"checkout-service",
//!  "_line":128,"_file":"src/checkout.rs"}
//! ```

pub mod error;
pub mod gelf;
pub mod layer;
pub mod level;
pub mod tracing;
pub mod transport;
