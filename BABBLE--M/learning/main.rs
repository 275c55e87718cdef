use std::fmt;

use anyhow::{Context, Result};
use babble_environment::{
    helper::{random_seed, seeded_rng},
    Effector, EnvironmentRuntime, EnvironmentSnapshot, EnvironmentTelemetry, SensoryBlock,
};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rand::{distributions::WeightedIndex, prelude::Distribution, rngs::SmallRng, Rng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;
use uuid::Uuid;

use crate::{
    config::ExperimentConfig,
    error::LearningError,
    helper::LearningTelemetry,
    module::{LearningModule, ModuleSettings, Phase},
};

/// What happened in one experiment trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Trial index, starting at 1.
    pub trial: u64,
    /// Module that produced the command.
    pub module: String,
    /// How the command was produced.
    pub phase: Phase,
    /// Effector driven.
    pub effector: Effector,
    /// Modules whose sensorimotor model learned from the trial.
    pub learned_by: Vec<String>,
}

/// Per-module part of an [`ExperimentSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSnapshot {
    /// Module name.
    pub name: String,
    /// Driven effector.
    pub effector: Effector,
    /// Goal space.
    pub block: SensoryBlock,
    /// Goals conditioned on the trial context.
    #[serde(default)]
    pub context: bool,
    /// Times the module was chosen.
    pub chosen: u64,
    /// Trials learned from.
    pub t: u64,
    /// Current competence.
    pub competence: f64,
    /// Current progress.
    pub progress: f64,
    /// Current interest.
    pub interest: f64,
}

/// Everything an external persistence layer needs from a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSnapshot {
    /// Identifier of the run.
    pub run_id: Uuid,
    /// Time the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    /// Environment counters and best errors.
    pub environment: EnvironmentSnapshot,
    /// Learning modules in scheduling order.
    pub modules: Vec<ModuleSnapshot>,
}

impl fmt::Display for ExperimentSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run {}", self.run_id)?;
        writeln!(f, "{}", self.environment)?;
        writeln!(f, "----------------------")?;
        writeln!(f, "Learning modules")?;
        writeln!(f, "----------------------")?;
        for module in &self.modules {
            writeln!(
                f,
                "# {:<10} chosen={:<6} learned={:<6} competence={:.3} interest={:.4}",
                module.name, module.chosen, module.t, module.competence, module.interest
            )?;
        }
        Ok(())
    }
}

/// Intrinsically motivated exploration over several learning modules sharing
/// one environment.
pub struct Experiment {
    runtime: EnvironmentRuntime,
    modules: Vec<LearningModule>,
    chosen: IndexMap<String, u64>,
    random_choice_ratio: f64,
    rng: SmallRng,
    trial: u64,
    run_id: Uuid,
    telemetry: Option<LearningTelemetry>,
}

impl Experiment {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> ExperimentBuilder {
        ExperimentBuilder::default()
    }

    /// Runs one trial: picks a module, lets it produce a command, advances
    /// the world and feeds the outcome back.
    pub fn run_trial(&mut self) -> Result<TrialRecord> {
        let index = self.choose_module();
        let context = self.runtime.world().context();
        let production = self.produce(index, &context)?;
        let chosen = &self.modules[index];
        let effector = chosen.settings().effector;
        let command = chosen.command(&production.motor)?;
        let outcome = self.runtime.step(&command, true)?;
        self.trial += 1;

        let motor = &command.as_slice()[effector.range()];
        let mut learned_by = Vec::new();
        for module in self
            .modules
            .iter_mut()
            .filter(|m| m.settings().effector == effector)
        {
            let sensory = module.settings().sensory(&outcome);
            if module.update_sm(motor, &sensory)? {
                learned_by.push(module.name().to_string());
            }
        }
        let chosen = &mut self.modules[index];
        let sensory = chosen.settings().sensory(&outcome);
        chosen.update_im(motor, &sensory);
        let name = chosen.name().to_string();
        *self.chosen.entry(name.clone()).or_insert(0) += 1;

        if let Some(tel) = &self.telemetry {
            let _ = tel.log(
                LogLevel::Debug,
                "learning.module.chosen",
                Some(self.trial),
                json!({
                    "module": name,
                    "phase": production.phase,
                    "learned_by": learned_by,
                }),
            );
        }
        Ok(TrialRecord {
            trial: self.trial,
            module: name,
            phase: production.phase,
            effector,
            learned_by,
        })
    }

    /// Runs `trials` trials.
    pub fn run(&mut self, trials: u64) -> Result<Vec<TrialRecord>> {
        (0..trials)
            .map(|_| self.run_trial())
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("experiment stopped after {} trials", self.trial))
    }

    /// Snapshot of the environment and every module, logged as
    /// `experiment.saved`.
    pub fn save(&self) -> ExperimentSnapshot {
        let snapshot = self.snapshot(self.runtime.save());
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(
                LogLevel::Info,
                "experiment.saved",
                Some(self.trial),
                json!({ "run_id": self.run_id, "modules": snapshot.modules.len() }),
            );
        }
        snapshot
    }

    /// Human readable report. Nothing is logged.
    #[must_use]
    pub fn report(&self) -> String {
        self.snapshot(self.runtime.world().save()).to_string()
    }

    /// Module by name.
    pub fn module(&self, name: &str) -> Result<&LearningModule, LearningError> {
        self.modules
            .iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| LearningError::UnknownModule(name.to_string()))
    }

    /// Modules in scheduling order.
    #[must_use]
    pub fn modules(&self) -> &[LearningModule] {
        &self.modules
    }

    /// Environment runtime.
    #[must_use]
    pub const fn runtime(&self) -> &EnvironmentRuntime {
        &self.runtime
    }

    /// Trials run so far.
    #[must_use]
    pub const fn trials(&self) -> u64 {
        self.trial
    }

    /// Run identifier.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    fn snapshot(&self, environment: EnvironmentSnapshot) -> ExperimentSnapshot {
        ExperimentSnapshot {
            run_id: self.run_id,
            saved_at: Utc::now(),
            environment,
            modules: self
                .modules
                .iter()
                .map(|m| ModuleSnapshot {
                    name: m.name().to_string(),
                    effector: m.settings().effector,
                    block: m.settings().block,
                    context: m.settings().context,
                    chosen: self.chosen.get(m.name()).copied().unwrap_or(0),
                    t: m.t(),
                    competence: m.competence(),
                    progress: m.progress(),
                    interest: m.interest(),
                })
                .collect(),
        }
    }

    /// Uniform pick with probability `random_choice_ratio`, otherwise
    /// proportional to interest, uniform again when no module is interesting.
    fn choose_module(&mut self) -> usize {
        let n = self.modules.len();
        if self.rng.gen::<f64>() < self.random_choice_ratio {
            return self.rng.gen_range(0..n);
        }
        let weights: Vec<f64> = self.modules.iter().map(LearningModule::interest).collect();
        match WeightedIndex::new(&weights) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => self.rng.gen_range(0..n),
        }
    }

    fn produce(&mut self, index: usize, context: &[f64]) -> Result<crate::module::Production> {
        let source = match &self.modules[index].settings().imitate {
            Some(name) => Some(
                self.modules
                    .iter()
                    .position(|m| m.name() == name)
                    .ok_or_else(|| LearningError::UnknownModule(name.clone()))?,
            ),
            None => None,
        };
        let production = match source {
            Some(source) if source != index => {
                let (chosen, imitated) = pair_mut(&mut self.modules, index, source);
                chosen.produce(context, Some(imitated))
            }
            _ => self.modules[index].produce(context, None),
        };
        Ok(production)
    }
}

/// Mutable access to `modules[a]` alongside shared access to `modules[b]`.
fn pair_mut(modules: &mut [LearningModule], a: usize, b: usize) -> (&mut LearningModule, &LearningModule) {
    if a < b {
        let (left, right) = modules.split_at_mut(b);
        (&mut left[a], &right[0])
    } else {
        let (left, right) = modules.split_at_mut(a);
        (&mut right[0], &left[b])
    }
}

/// Builder for `Experiment`.
#[derive(Default)]
pub struct ExperimentBuilder {
    config: ExperimentConfig,
    telemetry: Option<LearningTelemetry>,
    seed: Option<u64>,
}

impl ExperimentBuilder {
    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: ExperimentConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets telemetry; the environment logs to the same sink.
    #[must_use]
    pub fn telemetry(mut self, telemetry: LearningTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Seeds the whole run, overriding the configured environment seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the experiment.
    pub fn build(self) -> Result<Experiment> {
        let mut config = self.config;
        config.validate()?;
        let seed = self
            .seed
            .or(config.environment.seed)
            .unwrap_or_else(random_seed);
        config.environment.seed = Some(seed);

        let mut runtime = EnvironmentRuntime::builder().config(config.environment.clone());
        if let Some(sink) = self.telemetry.as_ref().and_then(LearningTelemetry::sink) {
            runtime = runtime.telemetry(EnvironmentTelemetry::builder("environment").sink(sink).build()?);
        }
        let runtime = runtime.build()?;

        let learning = &config.learning;
        let modules = config
            .modules
            .iter()
            .zip(2_u64..)
            .map(|(module, offset)| {
                LearningModule::with_reference_models(
                    ModuleSettings::from_config(module, learning),
                    learning.explo_noise,
                    learning.interest_window,
                    seed.wrapping_add(offset * 3),
                )
                .with_context(|| format!("failed to build module `{}`", module.name))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Experiment {
            runtime,
            chosen: modules.iter().map(|m| (m.name().to_string(), 0)).collect(),
            modules,
            random_choice_ratio: learning.random_choice_ratio,
            rng: seeded_rng(seed.wrapping_add(1)),
            trial: 0,
            run_id: Uuid::new_v4(),
            telemetry: self.telemetry,
        })
    }
}
