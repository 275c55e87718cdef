use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::{
    helper::wrap_unit_angle,
    motor::{ARM_DIMS, VOCAL_DIMS},
    TIMESTEPS,
};

/// Hand pose at one step: position and orientation in units of pi.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmPose {
    /// Hand x.
    pub x: f64,
    /// Hand y.
    pub y: f64,
    /// Hand orientation in `[-1, 1)`.
    pub angle: f64,
}

/// First and second formant at one step, in log2 Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Formants {
    /// First formant.
    pub f1: f64,
    /// Second formant.
    pub f2: f64,
}

/// Generates a hand trajectory from the arm sub-command.
pub trait ArmKinematics: Send {
    /// Returns exactly [`TIMESTEPS`] poses. Must be deterministic.
    fn trajectory(&self, command: &[f64]) -> Vec<ArmPose>;
}

/// Generates a formant trajectory from the vocal sub-command.
pub trait VocalTract: Send {
    /// Returns exactly [`TIMESTEPS`] formant pairs. Must be deterministic.
    fn trajectory(&self, command: &[f64]) -> Vec<Formants>;
}

/// One-dimensional movement primitive: smooth transition from `start` to
/// `goal` shaped by Gaussian bumps that vanish at both ends.
fn primitive(start: f64, goal: f64, weights: &[f64], steps: usize) -> Vec<f64> {
    let n = weights.len();
    let width = 1.0 / (2.0 * (n as f64 + 1.0));
    (0..steps)
        .map(|step| {
            let s = if steps > 1 {
                step as f64 / (steps - 1) as f64
            } else {
                1.0
            };
            let phase = s * s * (3.0 - 2.0 * s);
            let envelope = 4.0 * s * (1.0 - s);
            let shaping: f64 = weights
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let centre = (k as f64 + 1.0) / (n as f64 + 1.0);
                    w * (-(s - centre).powi(2) / (2.0 * width * width)).exp()
                })
                .sum();
            (start + (goal - start) * phase + envelope * shaping).clamp(-1.0, 1.0)
        })
        .collect()
}

/// Planar arm with three segments whose joints follow movement primitives.
#[derive(Debug, Clone)]
pub struct PlanarArm {
    lengths: [f64; 3],
    angle_shift: f64,
    rest_state: [f64; 3],
}

impl PlanarArm {
    /// Basis functions per joint; each joint also takes a goal parameter.
    pub const BASIS: usize = 6;

    /// Creates an arm.
    #[must_use]
    pub const fn new(lengths: [f64; 3], angle_shift: f64, rest_state: [f64; 3]) -> Self {
        Self {
            lengths,
            angle_shift,
            rest_state,
        }
    }

    /// Forward kinematics for joint angles in units of pi.
    #[must_use]
    pub fn forward(&self, joints: [f64; 3]) -> ArmPose {
        let (mut x, mut y, mut cumulative) = (0.0, 0.0, self.angle_shift);
        for (joint, length) in joints.iter().zip(self.lengths) {
            cumulative += joint;
            x += length * (PI * cumulative).cos();
            y += length * (PI * cumulative).sin();
        }
        ArmPose {
            x,
            y,
            angle: wrap_unit_angle(cumulative),
        }
    }
}

impl Default for PlanarArm {
    fn default() -> Self {
        Self::new([0.5, 0.3, 0.2], 0.5, [0.0; 3])
    }
}

impl ArmKinematics for PlanarArm {
    fn trajectory(&self, command: &[f64]) -> Vec<ArmPose> {
        debug_assert_eq!(command.len(), ARM_DIMS);
        let per_joint = Self::BASIS + 1;
        let joints: Vec<Vec<f64>> = (0..3)
            .map(|j| {
                let params = &command[j * per_joint..(j + 1) * per_joint];
                let rest = self.rest_state[j];
                primitive(rest, rest + params[Self::BASIS], &params[..Self::BASIS], TIMESTEPS)
            })
            .collect();
        (0..TIMESTEPS)
            .map(|t| self.forward([joints[0][t], joints[1][t], joints[2][t]]))
            .collect()
    }
}

/// Seven articulators mapped affinely onto two formants.
#[derive(Debug, Clone)]
pub struct LinearVocalTract {
    neutral: Formants,
    f1_gains: [f64; 7],
    f2_gains: [f64; 7],
    f1_bounds: (f64, f64),
    f2_bounds: (f64, f64),
}

impl LinearVocalTract {
    /// Number of articulators.
    pub const ARTICULATORS: usize = 7;

    /// Formant produced by an articulator vector.
    #[must_use]
    pub fn formants(&self, articulators: &[f64]) -> Formants {
        let dot = |gains: &[f64; 7]| -> f64 {
            gains
                .iter()
                .zip(articulators)
                .map(|(g, a)| g * a)
                .sum::<f64>()
        };
        Formants {
            f1: (self.neutral.f1 + dot(&self.f1_gains)).clamp(self.f1_bounds.0, self.f1_bounds.1),
            f2: (self.neutral.f2 + dot(&self.f2_gains)).clamp(self.f2_bounds.0, self.f2_bounds.1),
        }
    }
}

impl Default for LinearVocalTract {
    fn default() -> Self {
        Self {
            neutral: Formants { f1: 8.5, f2: 10.25 },
            f1_gains: [0.5, -0.3, 0.2, 0.1, -0.1, 0.05, 0.0],
            f2_gains: [0.2, 0.8, -0.4, 0.3, 0.1, -0.05, 0.2],
            f1_bounds: (7.5, 9.5),
            f2_bounds: (9.25, 11.25),
        }
    }
}

impl VocalTract for LinearVocalTract {
    fn trajectory(&self, command: &[f64]) -> Vec<Formants> {
        debug_assert_eq!(command.len(), VOCAL_DIMS);
        let articulators: Vec<Vec<f64>> = command
            .chunks(4)
            .take(Self::ARTICULATORS)
            .map(|p| primitive(p[0], p[1], &p[2..4], TIMESTEPS))
            .collect();
        (0..TIMESTEPS)
            .map(|t| {
                let frame: Vec<f64> = articulators.iter().map(|a| a[t]).collect();
                self.formants(&frame)
            })
            .collect()
    }
}
