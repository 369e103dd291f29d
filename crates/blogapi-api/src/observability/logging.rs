//! Logging subscriber setup.
//!
//! `RUST_LOG` always wins over the configured level. Without it the filter is
//! the configured level for everything, with the SQL driver capped at `warn`
//! so statement logs do not drown request logs.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How log events are rendered.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// One JSON object per line instead of human readable text.
    pub json_format: bool,
    /// Level used when `RUST_LOG` is not set.
    pub default_level: Level,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json_format: false,
            default_level: Level::INFO,
        }
    }
}

impl LoggingConfig {
    pub fn json() -> Self {
        Self {
            json_format: true,
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    fn default_directives(&self) -> String {
        format!("{},sqlx=warn", self.default_level.to_string().to_lowercase())
    }
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_logging(config: LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directives()));

    if config.json_format {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_file(false)
                .with_line_number(false),
        );
        let _ = tracing::subscriber::set_global_default(subscriber);
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true));
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

/// A JSON subscriber writing to `writer`, for capturing log output.
pub fn create_json_subscriber<W>(writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'writer> fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::registry().with(EnvFilter::new("trace")).with(
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_current_span(true),
    )
}

/// In-memory writer for asserting on log output.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct CaptureWriter {
    buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

#[cfg(test)]
impl CaptureWriter {
    pub(crate) fn output(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).to_string()
    }
}

#[cfg(test)]
impl std::io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
impl<'a> fmt::MakeWriter<'a> for CaptureWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_defaults_to_text_info() {
        let config = LoggingConfig::default();
        assert!(!config.json_format);
        assert_eq!(config.default_level, Level::INFO);
        assert_eq!(config.default_directives(), "info,sqlx=warn");
    }

    #[test]
    fn test_logging_config_builders() {
        let config = LoggingConfig::json().with_level(Level::DEBUG);
        assert!(config.json_format);
        assert_eq!(config.default_directives(), "debug,sqlx=warn");
    }

    #[test]
    fn test_json_lines_carry_level_target_and_fields() {
        let writer = CaptureWriter::default();
        let subscriber = create_json_subscriber(writer.clone());

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "blogapi::http", status = 201, "Response status");
        });

        let output = writer.output();
        let line = output.lines().find(|l| !l.is_empty()).expect("one log line");
        let json: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(json["level"], "INFO");
        assert_eq!(json["target"], "blogapi::http");
        assert_eq!(json["fields"]["message"], "Response status");
        assert_eq!(json["fields"]["status"], 201);
    }
}
