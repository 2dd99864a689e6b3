//! Tracing subscriber set-up.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::AppError;

const DEFAULT_FILTER: &str = "haven_core=info,haven=info";

/// Output format of the log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines on stderr.
    #[default]
    Pretty,
    /// Bunyan-style JSON records on stderr.
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" | "bunyan" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!("Unknown log format: {}", other))),
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
///
/// Fails if a subscriber is already installed.
pub fn init(format: LogFormat) -> Result<(), AppError> {
    dispatch(format, std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Internal(format!("Failed to install tracing subscriber: {}", e)))?;
    tracing::debug!(?format, "Tracing initialized");
    Ok(())
}

/// Builds the subscriber for `format` without installing it.
pub fn dispatch<W>(format: LogFormat, writer: W) -> Dispatch
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match format {
        LogFormat::Json => Dispatch::new(
            tracing_subscriber::registry()
                .with(env_filter)
                .with(JsonStorageLayer)
                .with(BunyanFormattingLayer::new("haven".into(), writer)),
        ),
        LogFormat::Pretty => Dispatch::new(
            tracing_subscriber::registry().with(env_filter).with(
                fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_ansi(false)
                    .compact(),
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// In-memory log sink.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(format: LogFormat) -> String {
        let sink = Captured::default();
        let dispatch = temp_env::with_var_unset("RUST_LOG", || dispatch(format, sink.clone()));
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::info!(depth = 3, "Turn complete");
            tracing::debug!("below the default level");
        });
        sink.text()
    }

    #[test]
    fn test_parse_log_format() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!(matches!("xml".parse::<LogFormat>(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_json_records_are_bunyan() {
        let output = capture(LogFormat::Json);
        let records: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "haven");
        assert_eq!(records[0]["msg"], "Turn complete");
        assert_eq!(records[0]["depth"], 3);
        assert_eq!(records[0]["level"], 30);
    }

    #[test]
    fn test_pretty_lines_respect_default_filter() {
        let output = capture(LogFormat::Pretty);
        assert!(output.contains("Turn complete"));
        assert!(output.contains("depth=3"));
        assert!(!output.contains("below the default level"));
    }
}
