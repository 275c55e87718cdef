use serde::{Deserialize, Serialize};

use crate::error::EnvironmentError;

/// Tunable constants of the world simulator.
///
/// Every field has a default, so a TOML `[environment]` table only needs the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Length of the stick from handle to working end.
    pub tool_length: f64,
    /// Hand-to-handle distance under which the tool is grasped.
    pub handle_tol: f64,
    /// Uniform noise amplitude added to the held tool's angle.
    pub handle_noise: f64,
    /// Hand-to-toy distance under which the hand grasps the toy.
    pub object_tol_hand: f64,
    /// Working-end-to-toy distance under which the tool catches the toy.
    pub object_tol_tool: f64,
    /// Fraction of the remaining distance the caregiver moves the toy per step.
    pub caregiver_gives_obj_factor: f64,
    /// Keyframe distance under which a produced sound matches a template.
    pub sound_tol: f64,
    /// Trials between toy re-placements during reset.
    pub toy_reset_period: u64,
    /// Trials between best-error history snapshots.
    pub snapshot_period: u64,
    /// Trials between best-error progress reports.
    pub report_period: u64,
    /// Initial tool `[x, y, angle]`.
    pub initial_tool: [f64; 3],
    /// Initial toy `[x, y]`.
    pub initial_toy: [f64; 2],
    /// Initial caregiver `[x, y]`.
    pub initial_caregiver: [f64; 2],
    /// RNG seed; a random one is drawn when absent.
    pub seed: Option<u64>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            tool_length: 0.5,
            handle_tol: 0.2,
            handle_noise: 0.0,
            object_tol_hand: 0.2,
            object_tol_tool: 0.2,
            caregiver_gives_obj_factor: 0.01,
            sound_tol: 0.4,
            toy_reset_period: 20,
            snapshot_period: 100,
            report_period: 1000,
            initial_tool: [-0.5, 0.0, 0.5],
            initial_toy: [0.5, 0.5],
            initial_caregiver: [0.0, 1.7],
            seed: None,
        }
    }
}

impl EnvironmentConfig {
    /// Checks tolerances and periods.
    pub fn validate(&self) -> Result<(), EnvironmentError> {
        let positive = [
            ("tool_length", self.tool_length),
            ("handle_tol", self.handle_tol),
            ("object_tol_hand", self.object_tol_hand),
            ("object_tol_tool", self.object_tol_tool),
            ("sound_tol", self.sound_tol),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(EnvironmentError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.caregiver_gives_obj_factor) {
            return Err(EnvironmentError::InvalidConfig(
                "caregiver_gives_obj_factor must lie in [0, 1]".into(),
            ));
        }
        if !(self.handle_noise.is_finite() && self.handle_noise >= 0.0) {
            return Err(EnvironmentError::InvalidConfig(
                "handle_noise must be non-negative".into(),
            ));
        }
        if self.toy_reset_period == 0 || self.snapshot_period == 0 || self.report_period == 0 {
            return Err(EnvironmentError::InvalidConfig(
                "periods must be at least one trial".into(),
            ));
        }
        Ok(())
    }

    /// Squared grasp tolerances `(handle, hand, tool)`.
    #[must_use]
    pub fn squared_tolerances(&self) -> (f64, f64, f64) {
        (
            self.handle_tol * self.handle_tol,
            self.object_tol_hand * self.object_tol_hand,
            self.object_tol_tool * self.object_tol_tool,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EnvironmentConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: EnvironmentConfig = toml::from_str("sound_tol = 0.3\nseed = 9").unwrap();
        assert!((config.sound_tol - 0.3).abs() < 1e-12);
        assert_eq!(config.seed, Some(9));
        assert!((config.tool_length - 0.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_zero_tolerance() {
        let config = EnvironmentConfig {
            handle_tol: 0.0,
            ..EnvironmentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EnvironmentError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_zero_period() {
        let config = EnvironmentConfig {
            snapshot_period: 0,
            ..EnvironmentConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
