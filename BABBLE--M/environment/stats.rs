use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{motor::Effector, objects::ToyState};

/// What happened in one trial, as far as the counters are concerned.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSummary {
    /// Effector driven by the trial.
    pub effector: Effector,
    /// Tool held at the end of the trial.
    pub tool_held: bool,
    /// Toy attachment at the end of the trial.
    pub toy_state: ToyState,
    /// Word recognised in the produced sound.
    pub produced_sound: Option<String>,
    /// Caregiver brought the toy closer.
    pub object_given: bool,
}

/// Running counters reported at the end of an experiment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentStats {
    /// Arm trials.
    pub count_arm: u64,
    /// Vocal trials.
    pub count_vocal: u64,
    /// Trials ending with the tool in hand.
    pub count_tool: u64,
    /// Trials ending with the toy in hand.
    pub count_toy_by_hand: u64,
    /// Trials ending with the toy caught by the held tool.
    pub count_toy_by_tool: u64,
    /// Times the caregiver said the toy's name.
    pub count_parent_give_label: u64,
    /// Times the caregiver brought the toy closer.
    pub count_parent_give_object: u64,
    /// Recognitions per word.
    pub count_produced_sounds: IndexMap<String, u64>,
}

impl ExperimentStats {
    /// Zeroed counters for the given words.
    #[must_use]
    pub fn new(words: &[String]) -> Self {
        Self {
            count_produced_sounds: words.iter().map(|w| (w.clone(), 0)).collect(),
            ..Self::default()
        }
    }

    /// Folds one trial into the counters.
    pub fn record(&mut self, trial: &TrialSummary) {
        match trial.effector {
            Effector::Arm => self.count_arm += 1,
            Effector::Vocal => self.count_vocal += 1,
        }
        if trial.tool_held {
            self.count_tool += 1;
        }
        match trial.toy_state {
            ToyState::HeldByHand => self.count_toy_by_hand += 1,
            ToyState::HeldByTool if trial.tool_held => self.count_toy_by_tool += 1,
            _ => {}
        }
        if let Some(sound) = &trial.produced_sound {
            *self.count_produced_sounds.entry(sound.clone()).or_insert(0) += 1;
        }
        if trial.object_given {
            self.count_parent_give_object += 1;
        }
        self.count_parent_give_label = self.count_toy_by_hand;
    }

    /// Total trials.
    #[must_use]
    pub const fn trials(&self) -> u64 {
        self.count_arm + self.count_vocal
    }
}

impl fmt::Display for ExperimentStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Arm trials: {}", self.count_arm)?;
        writeln!(f, "# Vocal trials: {}", self.count_vocal)?;
        writeln!(f, "# Tool actions: {}", self.count_tool)?;
        let produced: Vec<String> = self
            .count_produced_sounds
            .iter()
            .map(|(word, n)| format!("{word}={n}"))
            .collect();
        writeln!(f, "# Produced sounds: {}", produced.join(", "))?;
        writeln!(f, "# Toy was reached by tool: {}", self.count_toy_by_tool)?;
        writeln!(f, "# Toy was reached by hand: {}", self.count_toy_by_hand)?;
        writeln!(f, "# Parent gave vocal labels: {}", self.count_parent_give_label)?;
        write!(f, "# Parent gave object: {}", self.count_parent_give_object)
    }
}

/// Full environment state handed to an external persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    /// Trials run so far.
    pub t: u64,
    /// Caregiver words, toy name first.
    pub human_sounds: Vec<String>,
    /// Current best error per word.
    pub best_vocal_errors: IndexMap<String, f64>,
    /// Best errors sampled every snapshot period.
    pub best_vocal_errors_evolution: Vec<IndexMap<String, f64>>,
    /// Counters.
    pub stats: ExperimentStats,
    /// Time the snapshot was taken.
    pub saved_at: DateTime<Utc>,
}

impl fmt::Display for EnvironmentSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "----------------------")?;
        writeln!(f, "Environment Statistics")?;
        writeln!(f, "----------------------")?;
        writeln!(f, "# Iterations: {}", self.t)?;
        writeln!(f, "{}", self.stats)?;
        let best: Vec<String> = self
            .best_vocal_errors
            .iter()
            .map(|(word, e)| format!("{word}={e:.3}"))
            .collect();
        write!(f, "# Best vocal errors: {}", best.join(", "))
    }
}
