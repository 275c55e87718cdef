use thiserror::Error;

/// Errors raised by the world simulator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnvironmentError {
    /// Vector or trajectory has the wrong length.
    #[error("expected {expected} values, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Received length.
        actual: usize,
    },
    /// Both effector ranges are active in the same command.
    #[error("arm (|m|={arm_norm:.4}) and vocal (|m|={vocal_norm:.4}) effectors both active")]
    InvalidMotorCommand {
        /// L2 norm of the arm range.
        arm_norm: f64,
        /// L2 norm of the vocal range.
        vocal_norm: f64,
    },
    /// Caller asked the caregiver for a behaviour it does not have.
    #[error("caregiver cannot give label for `{0}`")]
    UnsupportedLabelRequest(String),
    /// Configuration value out of range.
    #[error("invalid environment config: {0}")]
    InvalidConfig(String),
}
