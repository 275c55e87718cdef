use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use serde_json::Value;
use shared_logging::{JsonLogger, LogLevel, LogRecord, LogSink};

/// Builder for [`LearningTelemetry`].
pub struct LearningTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    min_level: LogLevel,
    sink: Option<Arc<dyn LogSink>>,
}

impl LearningTelemetryBuilder {
    /// Creates a builder for `module`.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            min_level: LogLevel::Info,
            sink: None,
        }
    }

    /// Writes JSON lines to `path`.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Minimum level written to the log file.
    #[must_use]
    pub const fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Uses an existing sink; takes precedence over `log_path`.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Builds telemetry.
    pub fn build(self) -> Result<LearningTelemetry> {
        let sink = match (self.sink, self.log_path) {
            (Some(sink), _) => Some(sink),
            (None, Some(path)) => {
                let logger = JsonLogger::new(&path)
                    .with_context(|| format!("failed to open log file {}", path.display()))?
                    .with_min_level(self.min_level);
                Some(Arc::new(logger) as Arc<dyn LogSink>)
            }
            (None, None) => None,
        };
        Ok(LearningTelemetry {
            module: self.module,
            sink,
        })
    }
}

/// Telemetry handle for learning modules and experiments.
#[derive(Clone)]
pub struct LearningTelemetry {
    module: String,
    sink: Option<Arc<dyn LogSink>>,
}

impl fmt::Debug for LearningTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LearningTelemetry")
            .field("module", &self.module)
            .field("enabled", &self.sink.is_some())
            .finish()
    }
}

impl LearningTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> LearningTelemetryBuilder {
        LearningTelemetryBuilder::new(module)
    }

    /// Shared sink, handed to the environment so both crates write one log.
    #[must_use]
    pub fn sink(&self) -> Option<Arc<dyn LogSink>> {
        self.sink.clone()
    }

    /// Logs an event.
    pub fn log(&self, level: LogLevel, message: &str, trial: Option<u64>, metadata: Value) -> Result<()> {
        let Some(sink) = &self.sink else {
            return Ok(());
        };
        if level < sink.min_level() {
            return Ok(());
        }
        let mut record = LogRecord::new(&self.module, level, message).with_metadata(metadata);
        record.trial = trial;
        sink.log(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn file_telemetry_filters_debug() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("learning.log");
        let telemetry = LearningTelemetry::builder("learning")
            .log_path(&path)
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Debug, "learning.module.chosen", Some(1), json!({}))
            .unwrap();
        telemetry
            .log(LogLevel::Info, "experiment.saved", Some(1), json!({"modules": 6}))
            .unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("experiment.saved"));
    }

    #[test]
    fn disabled_telemetry_is_silent() {
        let telemetry = LearningTelemetry::builder("learning").build().unwrap();
        assert!(telemetry.sink().is_none());
        assert!(telemetry
            .log(LogLevel::Error, "noop", None, json!(null))
            .is_ok());
    }
}
