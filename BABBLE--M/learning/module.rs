use std::fmt;

use babble_environment::{Effector, MotorCommand, SensoryBlock, SensoryOutcome};
use indexmap::IndexMap;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    config::{LearningConfig, ModuleConfig},
    error::LearningError,
    interest::RandomInterest,
    models::{ImitationSource, InferenceMode, InterestModel, SensorimotorModel},
    nearest::NearestNeighborModel,
};

/// Minimum spread of a sensory block around its mean for a trial to count.
const MOVED_EPSILON: f64 = 0.001;

/// How a motor command was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Uniform random command.
    Babble,
    /// Goal taken from the imitated module's observations.
    Imitate,
    /// Goal chosen by the interest model.
    Goal,
}

/// Output of [`LearningModule::produce`].
#[derive(Debug, Clone, PartialEq)]
pub struct Production {
    /// Phase that produced the command.
    pub phase: Phase,
    /// Command over the module's effector range.
    pub motor: Vec<f64>,
    /// Sensory goal the command aims at, context first for contextual
    /// modules; zeros when babbling.
    pub expected: Vec<f64>,
    /// Sensory outcome predicted by the model; zeros when babbling.
    pub prediction: Vec<f64>,
}

/// Exploration settings of one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSettings {
    /// Module name.
    pub name: String,
    /// Driven effector.
    pub effector: Effector,
    /// Goal space.
    pub block: SensoryBlock,
    /// Module whose observations are imitated.
    pub imitate: Option<String>,
    /// Trials of pure motor babbling.
    pub motor_babbling_n_iter: u64,
    /// Probability of imitating when a source is handed to `produce`.
    pub proba_imitate: f64,
    /// Source observations pooled as goals.
    pub imitation_window: usize,
    /// Sensory space starts with the trial context.
    #[serde(default)]
    pub context: bool,
}

impl ModuleSettings {
    /// Combines a module declaration with the shared learning settings.
    #[must_use]
    pub fn from_config(module: &ModuleConfig, learning: &LearningConfig) -> Self {
        Self {
            name: module.name.clone(),
            effector: module.effector,
            block: module.block,
            imitate: module.imitate.clone(),
            motor_babbling_n_iter: learning.motor_babbling_n_iter,
            proba_imitate: learning.proba_imitate,
            imitation_window: learning.imitation_window,
            context: module.context,
        }
    }

    /// Motor dims of the effector.
    #[must_use]
    pub const fn m_dims(&self) -> usize {
        self.effector.dims()
    }

    /// Leading context dims of the sensory space; zero unless contextual.
    #[must_use]
    pub fn c_dims(&self) -> usize {
        if self.context {
            SensoryBlock::Context.range().len()
        } else {
            0
        }
    }

    /// Dims of the goal block.
    #[must_use]
    pub fn goal_dims(&self) -> usize {
        self.block.range().len()
    }

    /// Sensory dims the models work in: context, if any, then the goal block.
    #[must_use]
    pub fn s_dims(&self) -> usize {
        self.c_dims() + self.goal_dims()
    }

    /// The module's view of a trial outcome.
    #[must_use]
    pub fn sensory(&self, outcome: &SensoryOutcome) -> Vec<f64> {
        let goal = outcome.block(self.block);
        if self.context {
            let mut sensory = outcome.block(SensoryBlock::Context).to_vec();
            sensory.extend_from_slice(goal);
            sensory
        } else {
            goal.to_vec()
        }
    }
}

/// Goal-babbling agent bound to one effector and one sensory block.
pub struct LearningModule {
    settings: ModuleSettings,
    sensorimotor: Box<dyn SensorimotorModel>,
    interest: Box<dyn InterestModel>,
    goal_pool: IndexMap<Vec<u64>, Vec<f64>>,
    last: Option<Production>,
    t: u64,
    rng: SmallRng,
}

impl fmt::Debug for LearningModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LearningModule")
            .field("name", &self.settings.name)
            .field("effector", &self.settings.effector)
            .field("block", &self.settings.block)
            .field("t", &self.t)
            .field("observations", &self.sensorimotor.len())
            .finish_non_exhaustive()
    }
}

impl LearningModule {
    /// Creates a module from explicit models.
    #[must_use]
    pub fn new(
        settings: ModuleSettings,
        sensorimotor: Box<dyn SensorimotorModel>,
        interest: Box<dyn InterestModel>,
        seed: u64,
    ) -> Self {
        Self {
            settings,
            sensorimotor,
            interest,
            goal_pool: IndexMap::new(),
            last: None,
            t: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Module backed by [`NearestNeighborModel`] and [`RandomInterest`] over
    /// unit bounds.
    pub fn with_reference_models(
        settings: ModuleSettings,
        explo_noise: f64,
        interest_window: usize,
        seed: u64,
    ) -> Result<Self, LearningError> {
        let (m_dims, s_dims) = (settings.m_dims(), settings.s_dims());
        let sensorimotor = NearestNeighborModel::unit(m_dims, s_dims, explo_noise, seed)?;
        let interest = RandomInterest::unit(m_dims, s_dims, interest_window, seed.wrapping_add(1))
            .with_context_dims(settings.c_dims());
        Ok(Self::new(
            settings,
            Box::new(sensorimotor),
            Box::new(interest),
            seed.wrapping_add(2),
        ))
    }

    /// Produces the next command over the module's effector range.
    ///
    /// Babbles while `t` is below the babbling budget; otherwise imitates
    /// `imitate` with probability `proba_imitate`, else asks the interest
    /// model for a goal, and inverts the goal with the sensorimotor model.
    /// Contextual modules aim at `context` followed by the goal.
    /// An empty sensorimotor model makes the module babble for this trial.
    pub fn produce(&mut self, context: &[f64], imitate: Option<&dyn ImitationSource>) -> Production {
        let production = if self.t < self.settings.motor_babbling_n_iter {
            self.babble(Phase::Babble, vec![0.0; self.settings.s_dims()])
        } else {
            let (phase, goal) = match imitate {
                Some(source) if self.rng.gen::<f64>() < self.settings.proba_imitate => {
                    let goal = self.imitate_goal(source);
                    (Phase::Imitate, self.in_context(context, goal))
                }
                _ => (Phase::Goal, self.interest.choose(context)),
            };
            self.sensorimotor.set_mode(InferenceMode::Explore);
            let (m_dims, s_dims) = (self.settings.m_dims(), self.settings.s_dims());
            let expl_dims: Vec<usize> = (m_dims..m_dims + s_dims).collect();
            let inf_dims: Vec<usize> = (0..m_dims).collect();
            match self.sensorimotor.infer(&expl_dims, &inf_dims, &goal) {
                Ok((motor, prediction)) => Production {
                    phase,
                    motor,
                    expected: goal,
                    prediction,
                },
                Err(err) => {
                    tracing::debug!(module = %self.settings.name, error = %err, "inference failed, babbling");
                    self.babble(phase, goal)
                }
            }
        };
        self.last = Some(production.clone());
        production
    }

    /// Embeds a module-level command into a full motor command.
    pub fn command(&self, motor: &[f64]) -> Result<MotorCommand, LearningError> {
        Ok(MotorCommand::from_effector(self.settings.effector, motor)?)
    }

    /// Stores the pair in the sensorimotor model if the goal block moved;
    /// leading context dims are not part of the check. Returns whether the
    /// model was updated.
    pub fn update_sm(&mut self, motor: &[f64], sensory: &[f64]) -> Result<bool, LearningError> {
        let s_dims = self.settings.s_dims();
        if sensory.len() != s_dims {
            return Err(LearningError::DimensionMismatch {
                expected: s_dims,
                actual: sensory.len(),
            });
        }
        if !s_moved(&sensory[self.settings.c_dims()..]) {
            return Ok(false);
        }
        self.sensorimotor.update(motor, sensory)?;
        self.t += 1;
        Ok(true)
    }

    /// Feeds the interest model with the requested and achieved outcome of
    /// the last production. No-op while babbling or before any production.
    pub fn update_im(&mut self, motor: &[f64], sensory: &[f64]) {
        if self.t < self.settings.motor_babbling_n_iter {
            return;
        }
        let Some(last) = &self.last else {
            return;
        };
        let expected: Vec<f64> = motor.iter().chain(&last.expected).copied().collect();
        let achieved: Vec<f64> = motor.iter().chain(sensory).copied().collect();
        self.interest.update(&expected, &achieved, &last.prediction);
    }

    /// Updates both models with one trial.
    pub fn perceive(&mut self, motor: &[f64], sensory: &[f64]) -> Result<bool, LearningError> {
        let updated = self.update_sm(motor, sensory)?;
        self.update_im(motor, sensory);
        Ok(updated)
    }

    /// Settings.
    #[must_use]
    pub const fn settings(&self) -> &ModuleSettings {
        &self.settings
    }

    /// Name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Trials the sensorimotor model learned from.
    #[must_use]
    pub const fn t(&self) -> u64 {
        self.t
    }

    /// Imitation goals pooled so far.
    #[must_use]
    pub fn goal_pool_len(&self) -> usize {
        self.goal_pool.len()
    }

    /// Sensorimotor model, e.g. as an imitation source for other modules.
    #[must_use]
    pub fn sensorimotor(&self) -> &dyn SensorimotorModel {
        self.sensorimotor.as_ref()
    }

    /// Delegates to the interest model.
    #[must_use]
    pub fn competence(&self) -> f64 {
        self.interest.competence()
    }

    /// Delegates to the interest model.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.interest.progress()
    }

    /// Delegates to the interest model.
    #[must_use]
    pub fn interest(&self) -> f64 {
        self.interest.interest()
    }

    fn babble(&mut self, phase: Phase, expected: Vec<f64>) -> Production {
        let motor = (0..self.settings.m_dims())
            .map(|_| self.rng.gen_range(-1.0..1.0))
            .collect();
        Production {
            phase,
            motor,
            prediction: vec![0.0; expected.len()],
            expected,
        }
    }

    /// Goal block drawn from the source's recent observations; a contextual
    /// source's leading context dims are dropped.
    fn imitate_goal(&mut self, source: &dyn ImitationSource) -> Vec<f64> {
        let goal_dims = self.settings.goal_dims();
        for observation in source.recent_observations(self.settings.imitation_window) {
            if let Some(start) = observation.len().checked_sub(goal_dims) {
                let goal = observation[start..].to_vec();
                let key = goal.iter().map(|v| v.to_bits()).collect();
                self.goal_pool.entry(key).or_insert(goal);
            }
        }
        if source.observation_count() == 0 || self.goal_pool.is_empty() {
            return vec![0.0; goal_dims];
        }
        let index = self.rng.gen_range(0..self.goal_pool.len());
        self.goal_pool
            .get_index(index)
            .map_or_else(|| vec![0.0; goal_dims], |(_, goal)| goal.clone())
    }

    fn in_context(&self, context: &[f64], goal: Vec<f64>) -> Vec<f64> {
        let c_dims = self.settings.c_dims();
        if c_dims == 0 {
            return goal;
        }
        let mut x: Vec<f64> = context
            .iter()
            .copied()
            .chain(std::iter::repeat(0.0))
            .take(c_dims)
            .collect();
        x.extend(goal);
        x
    }
}

impl ImitationSource for LearningModule {
    fn observation_count(&self) -> usize {
        self.sensorimotor.observation_count()
    }

    fn recent_observations(&self, window: usize) -> Vec<Vec<f64>> {
        self.sensorimotor.recent_observations(window)
    }
}

/// True when either half of a goal block spreads around its own mean by more
/// than a negligible amount.
#[must_use]
pub fn s_moved(s: &[f64]) -> bool {
    let split = s.len().min(5);
    let spread = |values: &[f64]| -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>().sqrt()
    };
    spread(&s[..split]) + spread(&s[split..]) > MOVED_EPSILON
}
