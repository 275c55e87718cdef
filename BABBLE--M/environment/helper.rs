use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde_json::Value;
use shared_logging::{JsonLogger, LogLevel, LogRecord, LogSink};

/// Telemetry builder for the environment.
pub struct EnvironmentTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    sink: Option<Arc<dyn LogSink>>,
}

impl EnvironmentTelemetryBuilder {
    /// Creates a new builder scoped to a module label.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            sink: None,
        }
    }

    /// Writes records to a JSON-lines file.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Sends records to an existing sink. Takes precedence over `log_path`.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Builds telemetry.
    pub fn build(self) -> Result<EnvironmentTelemetry> {
        let sink = match (self.sink, self.log_path) {
            (Some(sink), _) => Some(sink),
            (None, Some(path)) => Some(Arc::new(JsonLogger::new(path)?) as Arc<dyn LogSink>),
            (None, None) => None,
        };
        Ok(EnvironmentTelemetry {
            module: self.module,
            sink,
        })
    }
}

/// Telemetry handle shared by the world and its runtime.
#[derive(Clone)]
pub struct EnvironmentTelemetry {
    module: String,
    sink: Option<Arc<dyn LogSink>>,
}

impl fmt::Debug for EnvironmentTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentTelemetry")
            .field("module", &self.module)
            .field("enabled", &self.sink.is_some())
            .finish()
    }
}

impl EnvironmentTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> EnvironmentTelemetryBuilder {
        EnvironmentTelemetryBuilder::new(module)
    }

    /// Logs an event, optionally tagged with a trial index.
    pub fn log(
        &self,
        level: LogLevel,
        message: &str,
        trial: Option<u64>,
        metadata: Value,
    ) -> Result<()> {
        if let Some(sink) = &self.sink {
            if level < sink.min_level() {
                return Ok(());
            }
            let mut record = LogRecord::new(&self.module, level, message).with_metadata(metadata);
            record.trial = trial;
            sink.log(&record)?;
        }
        Ok(())
    }

    /// Module label.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }
}

/// Generates a random seed for experiment runs.
#[must_use]
pub fn random_seed() -> u64 {
    rand::thread_rng().gen()
}

/// Returns a reproducible RNG.
#[must_use]
pub fn seeded_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Wraps an angle expressed in units of pi into `[-1, 1)`.
#[must_use]
pub fn wrap_unit_angle(angle: f64) -> f64 {
    (angle + 1.0).rem_euclid(2.0) - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_logging::MemoryLogger;
    use tempfile::tempdir;

    #[test]
    fn telemetry_writes_to_file() {
        let tmp = tempdir().unwrap();
        let log_path = tmp.path().join("env.log");
        let telemetry = EnvironmentTelemetry::builder("environment")
            .log_path(&log_path)
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Info, "environment.start", Some(3), json!({ "seed": 1 }))
            .unwrap();
        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("environment.start"));
        assert!(content.contains("\"trial\":3"));
    }

    #[test]
    fn telemetry_without_sink_is_noop() {
        let telemetry = EnvironmentTelemetry::builder("environment").build().unwrap();
        assert!(telemetry.log(LogLevel::Error, "x", None, json!({})).is_ok());
    }

    #[test]
    fn telemetry_routes_to_shared_sink() {
        let sink = Arc::new(MemoryLogger::new());
        let telemetry = EnvironmentTelemetry::builder("environment")
            .sink(sink.clone())
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Debug, "environment.trial.completed", Some(0), json!({}))
            .unwrap();
        assert_eq!(sink.records()[0].module, "environment");
    }

    #[test]
    fn angles_wrap_into_unit_interval() {
        assert!((wrap_unit_angle(1.5) + 0.5).abs() < 1e-12);
        assert!((wrap_unit_angle(-1.0) + 1.0).abs() < 1e-12);
        assert!((wrap_unit_angle(1.0) + 1.0).abs() < 1e-12);
        assert!((wrap_unit_angle(0.25) - 0.25).abs() < 1e-12);
    }
}
