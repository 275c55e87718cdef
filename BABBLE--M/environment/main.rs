use anyhow::{Context, Result};
use serde_json::json;
use shared_logging::LogLevel;

use crate::{
    config::EnvironmentConfig,
    helper::EnvironmentTelemetry,
    kinematics::{ArmKinematics, VocalTract},
    motor::{Effector, MotorCommand},
    sensory::SensoryOutcome,
    stats::EnvironmentSnapshot,
    world::WorldState,
};

/// Batched entry point over a [`WorldState`].
pub struct EnvironmentRuntime {
    world: WorldState,
    telemetry: Option<EnvironmentTelemetry>,
}

impl EnvironmentRuntime {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> EnvironmentRuntimeBuilder {
        EnvironmentRuntimeBuilder::default()
    }

    /// Runs `commands` in order, resetting the scene after each one when
    /// `reset` is set. Stops at the first invalid command.
    pub fn update(&mut self, commands: &[MotorCommand], reset: bool) -> Result<Vec<SensoryOutcome>> {
        let mut outcomes = Vec::with_capacity(commands.len());
        for command in commands {
            let outcome = self
                .world
                .advance(command)
                .with_context(|| format!("trial {} rejected", self.world.t() + 1))?;
            if reset {
                self.world.reset();
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Runs a single command.
    pub fn step(&mut self, command: &MotorCommand, reset: bool) -> Result<SensoryOutcome> {
        let mut outcomes = self.update(std::slice::from_ref(command), reset)?;
        outcomes.pop().context("no outcome produced")
    }

    /// Uniform random command restricted to one effector, random when `None`.
    pub fn motor_babbling(&mut self, effector: Option<Effector>) -> MotorCommand {
        MotorCommand::babble(effector, self.world.rng())
    }

    /// Snapshot of the environment, logged when telemetry is attached.
    pub fn save(&self) -> EnvironmentSnapshot {
        let snapshot = self.world.save();
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(
                LogLevel::Info,
                "environment.saved",
                Some(snapshot.t),
                json!({ "trials": snapshot.stats.trials() }),
            );
        }
        snapshot
    }

    /// Human readable statistics.
    #[must_use]
    pub fn report(&self) -> String {
        self.world.save().to_string()
    }

    /// Underlying world.
    #[must_use]
    pub const fn world(&self) -> &WorldState {
        &self.world
    }

    /// Mutable world, for scripted scenarios.
    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    /// Returns telemetry handle.
    #[must_use]
    pub const fn telemetry(&self) -> Option<&EnvironmentTelemetry> {
        self.telemetry.as_ref()
    }
}

/// Builder for `EnvironmentRuntime`.
#[derive(Default)]
pub struct EnvironmentRuntimeBuilder {
    config: EnvironmentConfig,
    telemetry: Option<EnvironmentTelemetry>,
    arm: Option<Box<dyn ArmKinematics>>,
    vocal: Option<Box<dyn VocalTract>>,
}

impl EnvironmentRuntimeBuilder {
    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: EnvironmentConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets telemetry.
    #[must_use]
    pub fn telemetry(mut self, telemetry: EnvironmentTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Seeds the world RNG.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Replaces the arm.
    #[must_use]
    pub fn arm(mut self, arm: Box<dyn ArmKinematics>) -> Self {
        self.arm = Some(arm);
        self
    }

    /// Replaces the vocal tract.
    #[must_use]
    pub fn vocal(mut self, vocal: Box<dyn VocalTract>) -> Self {
        self.vocal = Some(vocal);
        self
    }

    /// Builds the runtime and prepares the first trial.
    pub fn build(self) -> Result<EnvironmentRuntime> {
        let arm = self
            .arm
            .unwrap_or_else(|| Box::new(crate::kinematics::PlanarArm::default()));
        let vocal = self
            .vocal
            .unwrap_or_else(|| Box::new(crate::kinematics::LinearVocalTract::default()));
        let mut world = WorldState::new(self.config, arm, vocal)
            .context("invalid environment configuration")?
            .with_telemetry(self.telemetry.clone());
        world.reset();
        Ok(EnvironmentRuntime {
            world,
            telemetry: self.telemetry,
        })
    }
}
