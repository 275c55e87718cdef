#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]
#![allow(clippy::cast_precision_loss, clippy::module_name_repetitions)]

//! Babble environment: a planar arm, a stick tool, a toy, a caregiver and a
//! vocal tract simulated for 50 steps per trial, summarised as a 56-dim
//! sensory vector.

/// Telemetry and RNG helpers.
#[path = "../helper.rs"]
pub mod helper;

/// Error types raised by the environment.
#[path = "../error.rs"]
pub mod error;

/// Environment configuration.
#[path = "../config.rs"]
pub mod config;

/// Motor command layout and babbling.
#[path = "../motor.rs"]
pub mod motor;

/// Arm and vocal-tract trajectory generators.
#[path = "../kinematics.rs"]
pub mod kinematics;

/// Tool, toy and caregiver entities.
#[path = "../objects.rs"]
pub mod objects;

/// Caregiver sound templates and recognition.
#[path = "../sound.rs"]
pub mod sound;

/// Sensory vector layout and per-trial keyframe buffers.
#[path = "../sensory.rs"]
pub mod sensory;

/// Random placement of toys and caregiver between trials.
#[path = "../scenario.rs"]
pub mod scenario;

/// Running counters and snapshots.
#[path = "../stats.rs"]
pub mod stats;

/// Per-trial world simulation.
#[path = "../world.rs"]
pub mod world;

/// Runtime entry point wrapping the world with reset/batch semantics.
#[path = "../main.rs"]
pub mod runtime;

pub use config::EnvironmentConfig;
pub use error::EnvironmentError;
pub use helper::{EnvironmentTelemetry, EnvironmentTelemetryBuilder};
pub use kinematics::{ArmKinematics, ArmPose, Formants, LinearVocalTract, PlanarArm, VocalTract};
pub use motor::{Effector, MotorCommand, MOTOR_DIMS};
pub use objects::{Caregiver, Point, Tool, ToolGrip, Toy, ToyState};
pub use runtime::{EnvironmentRuntime, EnvironmentRuntimeBuilder};
pub use scenario::{Region, ScenarioGenerator};
pub use sensory::{SensoryBlock, SensoryOutcome, TrialBuffers, SENSORY_DIMS};
pub use sound::{HumanSoundTemplate, LabelRequest, Recognition, SoundRecognizer};
pub use stats::{EnvironmentSnapshot, ExperimentStats};
pub use world::WorldState;

/// Number of simulated steps in one trial.
pub const TIMESTEPS: usize = 50;

/// Steps sampled to summarise a trajectory.
pub const KEYFRAMES: [usize; 5] = [0, 12, 24, 37, 49];
