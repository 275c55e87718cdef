use babble_environment::EnvironmentError;
use thiserror::Error;

/// Errors raised by learning modules and their models.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LearningError {
    /// Sensorimotor model has no data to infer from yet.
    #[error("sensorimotor model has no data yet")]
    Bootstrap,
    /// Vector handed to a model has the wrong length.
    #[error("expected {expected} values, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Received length.
        actual: usize,
    },
    /// Module name not present in the experiment.
    #[error("unknown learning module `{0}`")]
    UnknownModule(String),
    /// Environment rejected a command.
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
}
