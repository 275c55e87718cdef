use std::ops::Range;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::EnvironmentError;

/// Motor dims driving the arm (3 joints x 7 primitive parameters).
pub const ARM_DIMS: usize = 21;
/// Motor dims driving the vocal tract (7 articulators x 4 primitive parameters).
pub const VOCAL_DIMS: usize = 28;
/// Total motor dims.
pub const MOTOR_DIMS: usize = ARM_DIMS + VOCAL_DIMS;
/// Lower bound of every motor dim.
pub const MOTOR_MIN: f64 = -1.0;
/// Upper bound of every motor dim.
pub const MOTOR_MAX: f64 = 1.0;

/// Effector driven by one sub-range of the motor command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effector {
    /// Planar three-segment arm.
    Arm,
    /// Vocal tract.
    Vocal,
}

impl Effector {
    /// Both effectors, arm first.
    pub const ALL: [Self; 2] = [Self::Arm, Self::Vocal];

    /// Indices of this effector in the full motor command.
    #[must_use]
    pub const fn range(self) -> Range<usize> {
        match self {
            Self::Arm => 0..ARM_DIMS,
            Self::Vocal => ARM_DIMS..MOTOR_DIMS,
        }
    }

    /// Number of motor dims owned by the effector.
    #[must_use]
    pub const fn dims(self) -> usize {
        match self {
            Self::Arm => ARM_DIMS,
            Self::Vocal => VOCAL_DIMS,
        }
    }

    /// Label for logging.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Arm => "arm",
            Self::Vocal => "vocal",
        }
    }
}

/// Full motor command; at most one effector range may be non-zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorCommand(Vec<f64>);

impl MotorCommand {
    /// Wraps raw values after checking the length. Values are clipped to bounds.
    pub fn new(values: Vec<f64>) -> Result<Self, EnvironmentError> {
        if values.len() != MOTOR_DIMS {
            return Err(EnvironmentError::DimensionMismatch {
                expected: MOTOR_DIMS,
                actual: values.len(),
            });
        }
        Ok(Self(
            values
                .into_iter()
                .map(|v| v.clamp(MOTOR_MIN, MOTOR_MAX))
                .collect(),
        ))
    }

    /// All-zero command (rest arm, silent voice).
    #[must_use]
    pub fn zeros() -> Self {
        Self(vec![0.0; MOTOR_DIMS])
    }

    /// Embeds one effector's sub-command, leaving the other range at zero.
    pub fn from_effector(effector: Effector, values: &[f64]) -> Result<Self, EnvironmentError> {
        if values.len() != effector.dims() {
            return Err(EnvironmentError::DimensionMismatch {
                expected: effector.dims(),
                actual: values.len(),
            });
        }
        let mut full = vec![0.0; MOTOR_DIMS];
        full[effector.range()].copy_from_slice(values);
        Self::new(full)
    }

    /// Uniform random command restricted to one effector. A random effector is
    /// picked when `effector` is `None`.
    pub fn babble<R: Rng + ?Sized>(effector: Option<Effector>, rng: &mut R) -> Self {
        let effector = effector.unwrap_or_else(|| {
            if rng.gen_bool(0.5) {
                Effector::Arm
            } else {
                Effector::Vocal
            }
        });
        let mut full = vec![0.0; MOTOR_DIMS];
        for value in &mut full[effector.range()] {
            *value = rng.gen_range(MOTOR_MIN..MOTOR_MAX);
        }
        Self(full)
    }

    /// Arm sub-command.
    #[must_use]
    pub fn arm(&self) -> &[f64] {
        &self.0[Effector::Arm.range()]
    }

    /// Vocal sub-command.
    #[must_use]
    pub fn vocal(&self) -> &[f64] {
        &self.0[Effector::Vocal.range()]
    }

    /// Raw values.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Consumes the command.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    /// Effector driven by this command.
    ///
    /// A non-zero arm range makes an arm trial; anything else, including the
    /// all-zero command, is a vocal trial. Both ranges non-zero is rejected.
    pub fn active_effector(&self) -> Result<Effector, EnvironmentError> {
        let arm_norm = l2(self.arm());
        let vocal_norm = l2(self.vocal());
        if arm_norm > 0.0 && vocal_norm > 0.0 {
            return Err(EnvironmentError::InvalidMotorCommand {
                arm_norm,
                vocal_norm,
            });
        }
        Ok(if arm_norm > 0.0 {
            Effector::Arm
        } else {
            Effector::Vocal
        })
    }
}

impl AsRef<[f64]> for MotorCommand {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

fn l2(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}
