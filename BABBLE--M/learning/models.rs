use serde::{Deserialize, Serialize};

use crate::error::LearningError;

/// Whether inference adds exploration noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceMode {
    /// Perturb inferred values.
    #[default]
    Explore,
    /// Return the best known values as is.
    Exploit,
}

/// Sensory observations another module can imitate.
pub trait ImitationSource {
    /// Number of stored observations.
    fn observation_count(&self) -> usize;

    /// Sensory parts of the most recent `window` observations, oldest first.
    fn recent_observations(&self, window: usize) -> Vec<Vec<f64>>;
}

/// Forward/inverse model over the concatenated `motor ⊕ sensory` space.
///
/// Dims passed to [`SensorimotorModel::infer`] index into that concatenation.
pub trait SensorimotorModel: ImitationSource + Send {
    /// Infers the values of `inf_dims` given `x` on `expl_dims`.
    ///
    /// Returns the inferred values and the model's prediction on
    /// `expl_dims`. Fails with [`LearningError::Bootstrap`] before the first
    /// update.
    fn infer(
        &mut self,
        expl_dims: &[usize],
        inf_dims: &[usize],
        x: &[f64],
    ) -> Result<(Vec<f64>, Vec<f64>), LearningError>;

    /// Stores one (motor, sensory) pair.
    fn update(&mut self, motor: &[f64], sensory: &[f64]) -> Result<(), LearningError>;

    /// Switches between exploration and exploitation.
    fn set_mode(&mut self, mode: InferenceMode);

    /// Stored pairs.
    fn len(&self) -> usize {
        self.observation_count()
    }

    /// True before the first update.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Goal selector tracking competence and learning progress.
pub trait InterestModel: Send {
    /// Picks a goal in sensory space.
    fn choose(&mut self, context: &[f64]) -> Vec<f64>;

    /// Folds in one trial: `expected` and `achieved` are `motor ⊕ sensory`
    /// with the requested and the observed sensory part respectively.
    fn update(&mut self, expected: &[f64], achieved: &[f64], prediction: &[f64]);

    /// Recent competence.
    fn competence(&self) -> f64;

    /// Recent competence progress.
    fn progress(&self) -> f64;

    /// Interest used to schedule modules; never negative.
    fn interest(&self) -> f64;
}
