// Copyright 2026 The Manifold contributors
// SPDX-License-Identifier: Apache-2.0

//! Structured diagnostics.
//!
//! The compiler emits [`LogRecord`]s to a [`LoggingSink`]; rendering and
//! filtering for display are the sink's concern. The [`Logger`] wraps a
//! sink with a level filter and counts warnings and errors so the compile
//! entry point can report success or failure (a CLI maps zero errors to
//! exit status 0, anything else to 1).

use ecow::EcoString;

use crate::source_analysis::{Location, SourceFile, Span};

/// A diagnostic level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Developer-facing detail.
    Debug,
    /// Informational messages.
    Info,
    /// The default level for user-facing output.
    Notice,
    /// Something suspicious; compilation continues.
    Warning,
    /// A compilation error.
    Error,
    /// An alert.
    Alert,
    /// An emergency.
    Emergency,
    /// A critical failure.
    Critical,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Debug => "Debug",
            Self::Info => "Info",
            Self::Notice => "Notice",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Alert => "Alert",
            Self::Emergency => "Emergency",
            Self::Critical => "Critical",
        };
        write!(f, "{text}")
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "notice" => Ok(Self::Notice),
            "warning" => Ok(Self::Warning),
            "err" | "error" => Ok(Self::Error),
            "alert" => Ok(Self::Alert),
            "emerg" | "emergency" => Ok(Self::Emergency),
            "crit" | "critical" => Ok(Self::Critical),
            other => Err(format!(
                "invalid log level '{other}': expected debug, info, notice, warning, error, alert, emergency, or critical."
            )),
        }
    }
}

/// One structured diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// The level.
    pub level: Level,
    /// The manifest path, if the record has a source position.
    pub path: Option<EcoString>,
    /// The line/column position, if known.
    pub location: Option<Location>,
    /// The text of the offending source line, if known.
    pub line_text: Option<EcoString>,
    /// The message.
    pub message: EcoString,
}

impl LogRecord {
    /// Creates a record with no source position.
    #[must_use]
    pub fn bare(level: Level, message: impl Into<EcoString>) -> Self {
        Self {
            level,
            path: None,
            location: None,
            line_text: None,
            message: message.into(),
        }
    }
}

/// Receives log records; rendering is external.
pub trait LoggingSink {
    /// Receives one record.
    fn emit(&mut self, record: &LogRecord);
}

/// A sink that stores records (used by tests and embedders).
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// The received records.
    pub records: Vec<LogRecord>,
}

impl CollectingSink {
    /// Creates an empty collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the messages logged at a level.
    #[must_use]
    pub fn messages_at(&self, level: Level) -> Vec<&str> {
        self.records
            .iter()
            .filter(|record| record.level == level)
            .map(|record| record.message.as_str())
            .collect()
    }
}

impl LoggingSink for CollectingSink {
    fn emit(&mut self, record: &LogRecord) {
        self.records.push(record.clone());
    }
}

/// A level-filtering, counting logger over a sink.
pub struct Logger<'a> {
    sink: &'a mut dyn LoggingSink,
    level: Level,
    warnings: usize,
    errors: usize,
}

impl<'a> Logger<'a> {
    /// Creates a logger at the default `Notice` level.
    pub fn new(sink: &'a mut dyn LoggingSink) -> Self {
        Self {
            sink,
            level: Level::Notice,
            warnings: 0,
            errors: 0,
        }
    }

    /// Sets the minimum level that is emitted.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Returns true if a record at `level` would be emitted.
    #[must_use]
    pub fn would_log(&self, level: Level) -> bool {
        level >= self.level
    }

    /// Returns the number of warnings logged.
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.warnings
    }

    /// Returns the number of errors logged.
    #[must_use]
    pub fn errors(&self) -> usize {
        self.errors
    }

    /// Logs a record.
    pub fn log(&mut self, record: &LogRecord) {
        if !self.would_log(record.level) {
            return;
        }
        if record.level == Level::Warning {
            self.warnings += 1;
        } else if record.level >= Level::Error {
            self.errors += 1;
        }
        self.sink.emit(record);
    }

    /// Logs a message with no source position.
    pub fn log_message(&mut self, level: Level, message: impl Into<EcoString>) {
        self.log(&LogRecord::bare(level, message));
    }

    /// Logs a message at a position in a source file, attaching the
    /// offending line's text.
    pub fn log_at(
        &mut self,
        level: Level,
        source: &SourceFile,
        span: Span,
        message: impl Into<EcoString>,
    ) {
        let location = source.location(span.start());
        self.log(&LogRecord {
            level,
            path: Some(source.path().as_str().into()),
            location: Some(location),
            line_text: Some(source.line_text(location.line).into()),
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering_and_parsing() {
        assert!(Level::Error > Level::Warning);
        assert!(Level::Critical > Level::Emergency);
        assert_eq!("err".parse::<Level>().unwrap(), Level::Error);
        assert_eq!("NOTICE".parse::<Level>().unwrap(), Level::Notice);
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn logger_counts_warnings_and_errors() {
        let mut sink = CollectingSink::new();
        let mut logger = Logger::new(&mut sink);
        logger.log_message(Level::Notice, "hello");
        logger.log_message(Level::Warning, "careful");
        logger.log_message(Level::Error, "boom");
        assert_eq!(logger.warnings(), 1);
        assert_eq!(logger.errors(), 1);
        assert_eq!(sink.records.len(), 3);
    }

    #[test]
    fn logger_filters_below_level() {
        let mut sink = CollectingSink::new();
        let mut logger = Logger::new(&mut sink);
        logger.log_message(Level::Debug, "hidden");
        assert!(sink.records.is_empty());
    }

    #[test]
    fn log_at_attaches_line_text() {
        let source = SourceFile::new("site.mf", "$x = 1\n1/0\n");
        let mut sink = CollectingSink::new();
        let mut logger = Logger::new(&mut sink);
        logger.log_at(Level::Error, &source, Span::new(7, 10), "cannot divide by zero.");
        let record = &sink.records[0];
        assert_eq!(record.location.unwrap().line, 2);
        assert_eq!(record.line_text.as_deref(), Some("1/0"));
    }
}
