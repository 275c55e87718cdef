use std::{collections::HashSet, fs, path::Path};

use anyhow::{bail, Context, Result};
use babble_environment::{Effector, EnvironmentConfig, SensoryBlock};
use serde::{Deserialize, Serialize};

/// Settings shared by every learning module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Trials of pure motor babbling before goal babbling starts.
    pub motor_babbling_n_iter: u64,
    /// Probability of imitating when an imitation source is configured.
    pub proba_imitate: f64,
    /// Most recent observations of the source pooled as imitation goals.
    pub imitation_window: usize,
    /// Exploration noise as a fraction of each motor dim's range.
    pub explo_noise: f64,
    /// Probability of picking a module uniformly instead of by interest.
    pub random_choice_ratio: f64,
    /// Trials kept by interest models to measure progress.
    pub interest_window: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            motor_babbling_n_iter: 0,
            proba_imitate: 0.5,
            imitation_window: 100,
            explo_noise: 0.1,
            random_choice_ratio: 0.1,
            interest_window: 1000,
        }
    }
}

/// One learning module: the effector it drives and the sensory block it
/// sets goals in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Unique name.
    pub name: String,
    /// Driven effector.
    pub effector: Effector,
    /// Goal space.
    pub block: SensoryBlock,
    /// Module whose observations are imitated.
    #[serde(default)]
    pub imitate: Option<String>,
    /// Prepends the trial context to the module's sensory space and draws
    /// goals for the current context.
    #[serde(default)]
    pub context: bool,
}

impl ModuleConfig {
    /// Module without imitation.
    #[must_use]
    pub fn new(name: impl Into<String>, effector: Effector, block: SensoryBlock) -> Self {
        Self {
            name: name.into(),
            effector,
            block,
            imitate: None,
            context: false,
        }
    }

    /// Imitates the module named `source`.
    #[must_use]
    pub fn imitating(mut self, source: impl Into<String>) -> Self {
        self.imitate = Some(source.into());
        self
    }

    /// Conditions goals on the trial context.
    #[must_use]
    pub const fn contextual(mut self) -> Self {
        self.context = true;
        self
    }

    /// Hand, tool and toy modules on the arm, the caregiver's label heard
    /// after arm trials, and the produced sound and caregiver's response on
    /// the voice. Both toy modules depend on where the toy and the caregiver
    /// start, so they are contextual.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("hand", Effector::Arm, SensoryBlock::Hand),
            Self::new("tool", Effector::Arm, SensoryBlock::Tool),
            Self::new("toy_arm", Effector::Arm, SensoryBlock::Toy).contextual(),
            Self::new("label", Effector::Arm, SensoryBlock::Sound),
            Self::new("sound", Effector::Vocal, SensoryBlock::Sound).imitating("label"),
            Self::new("toy_vocal", Effector::Vocal, SensoryBlock::Toy).contextual(),
        ]
    }
}

/// Whole experiment, as read from a TOML file with `[environment]`,
/// `[learning]` and `[[modules]]` sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// World settings.
    pub environment: EnvironmentConfig,
    /// Learning settings.
    pub learning: LearningConfig,
    /// Learning modules in scheduling order.
    pub modules: Vec<ModuleConfig>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            environment: EnvironmentConfig::default(),
            learning: LearningConfig::default(),
            modules: ModuleConfig::defaults(),
        }
    }
}

impl ExperimentConfig {
    /// Reads and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Parses and validates TOML text.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("failed to parse experiment config")?;
        config.validate()?;
        Ok(config)
    }

    /// Checks probabilities, windows and module wiring.
    pub fn validate(&self) -> Result<()> {
        self.environment.validate()?;
        let learning = &self.learning;
        if !(0.0..=1.0).contains(&learning.proba_imitate) {
            bail!("proba_imitate must lie in [0, 1]");
        }
        if !(0.0..=1.0).contains(&learning.random_choice_ratio) {
            bail!("random_choice_ratio must lie in [0, 1]");
        }
        if !(learning.explo_noise.is_finite() && learning.explo_noise >= 0.0) {
            bail!("explo_noise must be non-negative");
        }
        if learning.imitation_window == 0 || learning.interest_window == 0 {
            bail!("windows must hold at least one trial");
        }
        if self.modules.is_empty() {
            bail!("at least one learning module is required");
        }
        let mut names = HashSet::new();
        for module in &self.modules {
            if !names.insert(module.name.as_str()) {
                bail!("duplicate learning module `{}`", module.name);
            }
            if module.block == SensoryBlock::Context {
                bail!("module `{}` cannot set goals in the context block", module.name);
            }
        }
        for module in &self.modules {
            if let Some(source) = &module.imitate {
                if source == &module.name {
                    bail!("module `{}` cannot imitate itself", module.name);
                }
                let Some(target) = self.modules.iter().find(|m| &m.name == source) else {
                    bail!("module `{}` imitates unknown module `{source}`", module.name);
                };
                if target.block.range().len() != module.block.range().len() {
                    bail!("module `{}` and `{source}` have different goal spaces", module.name);
                }
            }
        }
        Ok(())
    }
}
