#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]
#![allow(clippy::cast_precision_loss, clippy::module_name_repetitions)]

//! Babble learning stack: goal-babbling learning modules driving the babble
//! environment, their adaptive models, and the experiment that schedules them.

/// Error types raised by the learning stack.
#[path = "../error.rs"]
pub mod error;

/// Telemetry helpers for logging.
#[path = "../helper.rs"]
pub mod helper;

/// Experiment configuration loaded from TOML.
#[path = "../config.rs"]
pub mod config;

/// Collaborator interfaces of a learning module.
#[path = "../models.rs"]
pub mod models;

/// Nearest-neighbour sensorimotor model.
#[path = "../nearest.rs"]
pub mod nearest;

/// Random-goal interest model with competence progress.
#[path = "../interest.rs"]
pub mod interest;

/// Exploration loop of a single learning module.
#[path = "../module.rs"]
pub mod module;

/// Multi-module experiment orchestration.
#[path = "../main.rs"]
pub mod experiment;

pub use config::{ExperimentConfig, LearningConfig, ModuleConfig};
pub use error::LearningError;
pub use experiment::{Experiment, ExperimentBuilder, ExperimentSnapshot, ModuleSnapshot, TrialRecord};
pub use helper::{LearningTelemetry, LearningTelemetryBuilder};
pub use interest::RandomInterest;
pub use models::{ImitationSource, InferenceMode, InterestModel, SensorimotorModel};
pub use module::{LearningModule, ModuleSettings, Phase, Production};
pub use nearest::NearestNeighborModel;
