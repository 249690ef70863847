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

//! Log level definitions & their GELF severities.
//!
//! GELF inherits its `level` field from the syslog severity scale (integer 0-7, lower = more
//! severe), but log frameworks almost universally expose the six levels modelled by [`Level`]
//! instead. The mapping between the two is fixed by convention and collectors depend on the
//! exact integers, so it lives here as a plain `match` rather than anything configurable.

type StdResult<T, E> = std::result::Result<T, E>;

/// The six conventional log-framework levels, ordered from least to most severe.
///
/// Note that this is *not* the syslog scale: two of syslog's eight severities (Emergency &
/// Alert) have no log-framework counterpart, and Trace & Info collapse onto the same syslog
/// severity (Informational). [`Level::severity`] performs that translation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Level {
    /// finer-grained than debug; typically per-iteration noise
    Trace,
    /// diagnostic information of interest to developers
    Debug,
    /// normal operational messages
    Info,
    /// something unexpected, but the application can continue
    Warn,
    /// an operation failed
    Error,
    /// the application cannot continue
    Fatal,
}

impl Level {
    /// The syslog severity integer carried on the wire in the GELF `level` field.
    ///
    /// Debug => 7 (Debug), Trace & Info => 6 (Informational), Warn => 4 (Warning),
    /// Error => 3 (Error), Fatal => 2 (Critical). These values are load-bearing; Graylog
    /// filters & alerts key off them.
    pub fn severity(&self) -> u8 {
        match self {
            Level::Debug => 7,
            Level::Trace | Level::Info => 6,
            Level::Warn => 4,
            Level::Error => 3,
            Level::Fatal => 2,
        }
    }
}

impl std::default::Default for Level {
    /// The default level is `Info`.
    fn default() -> Self {
        Level::Info
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Level::Trace => "Trace",
                Level::Debug => "Debug",
                Level::Info => "Info",
                Level::Warn => "Warn",
                Level::Error => "Error",
                Level::Fatal => "Fatal",
            }
        )
    }
}

impl std::convert::From<&tracing::Level> for Level {
    /// [`tracing`] has no Fatal level, so this mapping never produces one.
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

#[cfg(test)]
mod level_tests {
    use super::*;
    /// The severity table is part of the wire contract; pin every row.
    #[test]
    fn test_severities() {
        assert_eq!(7, Level::Debug.severity());
        assert_eq!(6, Level::Trace.severity());
        assert_eq!(6, Level::Info.severity());
        assert_eq!(4, Level::Warn.severity());
        assert_eq!(3, Level::Error.severity());
        assert_eq!(2, Level::Fatal.severity());
        assert_eq!(format!("{}", Level::Warn), "Warn".to_string());
    }

    #[test]
    fn test_tracing_mapping() {
        assert_eq!(Level::Trace, Level::from(&tracing::Level::TRACE));
        assert_eq!(Level::Debug, Level::from(&tracing::Level::DEBUG));
        assert_eq!(Level::Info, Level::from(&tracing::Level::INFO));
        assert_eq!(Level::Warn, Level::from(&tracing::Level::WARN));
        assert_eq!(Level::Error, Level::from(&tracing::Level::ERROR));
    }
}
