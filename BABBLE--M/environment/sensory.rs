use std::{ops::Range, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::EnvironmentError,
    objects::Point,
    sound::SOUND_DIMS,
    KEYFRAMES,
};

/// Dims of the sensory vector.
pub const SENSORY_DIMS: usize = 56;
/// Lower bound of every sensory dim.
pub const SENSORY_MIN: f64 = -1.0;
/// Upper bound of every sensory dim.
pub const SENSORY_MAX: f64 = 1.0;

const F1_OFFSET: f64 = 8.5;
const F2_OFFSET: f64 = 10.25;

/// Named slice of the sensory vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensoryBlock {
    /// Tool, toy and caregiver positions at trial start.
    Context,
    /// Hand keyframes.
    Hand,
    /// Tool handle keyframes.
    Tool,
    /// Toy keyframes.
    Toy,
    /// Sound keyframes (caregiver label or produced vowel).
    Sound,
    /// Caregiver keyframes.
    Caregiver,
}

impl SensoryBlock {
    /// Blocks in vector order.
    pub const ALL: [Self; 6] = [
        Self::Context,
        Self::Hand,
        Self::Tool,
        Self::Toy,
        Self::Sound,
        Self::Caregiver,
    ];

    /// Indices of the block in the sensory vector.
    #[must_use]
    pub const fn range(self) -> Range<usize> {
        match self {
            Self::Context => 0..6,
            Self::Hand => 6..16,
            Self::Tool => 16..26,
            Self::Toy => 26..36,
            Self::Sound => 36..46,
            Self::Caregiver => 46..56,
        }
    }

    /// Label for config files and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Hand => "hand",
            Self::Tool => "tool",
            Self::Toy => "toy",
            Self::Sound => "sound",
            Self::Caregiver => "caregiver",
        }
    }
}

impl FromStr for SensoryBlock {
    type Err = EnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|block| block.label() == s)
            .ok_or_else(|| EnvironmentError::InvalidConfig(format!("unknown sensory block `{s}`")))
    }
}

/// Keyframe samples collected during one trial. A fresh value is built for
/// every trial.
#[derive(Debug, Clone, Default)]
pub struct TrialBuffers {
    hand: Vec<Point>,
    tool: Vec<Point>,
    toy: Vec<Point>,
    caregiver: Vec<Point>,
}

impl TrialBuffers {
    /// Empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the entity positions if `step` is a keyframe.
    pub fn record(&mut self, step: usize, hand: Point, tool: Point, toy: Point, caregiver: Point) {
        if KEYFRAMES.contains(&step) {
            self.hand.push(hand);
            self.tool.push(tool);
            self.toy.push(toy);
            self.caregiver.push(caregiver);
        }
    }

    /// Number of keyframes recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hand.len()
    }

    /// True before the first keyframe.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hand.is_empty()
    }

    fn halved_xy(points: &[Point]) -> impl Iterator<Item = f64> + '_ {
        points
            .iter()
            .map(|p| p.x / 2.0)
            .chain(points.iter().map(|p| p.y / 2.0))
    }
}

/// Sensory vector produced by one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensoryOutcome(Vec<f64>);

impl SensoryOutcome {
    /// Concatenates context, positional keyframes (halved, all x then all y)
    /// and the recentred sound, clipped to the sensory bounds.
    #[must_use]
    pub fn assemble(context: [f64; 6], buffers: &TrialBuffers, sound: &[f64; SOUND_DIMS]) -> Self {
        let half = SOUND_DIMS / 2;
        let sound = sound
            .iter()
            .enumerate()
            .map(|(i, v)| if i < half { v - F1_OFFSET } else { v - F2_OFFSET });
        let values: Vec<f64> = context
            .into_iter()
            .chain(TrialBuffers::halved_xy(&buffers.hand))
            .chain(TrialBuffers::halved_xy(&buffers.tool))
            .chain(TrialBuffers::halved_xy(&buffers.toy))
            .chain(sound)
            .chain(TrialBuffers::halved_xy(&buffers.caregiver))
            .map(|v| v.clamp(SENSORY_MIN, SENSORY_MAX))
            .collect();
        Self(values)
    }

    /// Wraps raw values after checking the length.
    pub fn from_values(values: Vec<f64>) -> Result<Self, EnvironmentError> {
        if values.len() != SENSORY_DIMS {
            return Err(EnvironmentError::DimensionMismatch {
                expected: SENSORY_DIMS,
                actual: values.len(),
            });
        }
        Ok(Self(values))
    }

    /// Values of one block.
    #[must_use]
    pub fn block(&self, block: SensoryBlock) -> &[f64] {
        &self.0[block.range()]
    }

    /// Raw values.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Consumes the outcome.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl AsRef<[f64]> for SensoryOutcome {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_tile_the_vector() {
        let mut next = 0;
        for block in SensoryBlock::ALL {
            assert_eq!(block.range().start, next);
            next = block.range().end;
        }
        assert_eq!(next, SENSORY_DIMS);
    }

    #[test]
    fn buffers_only_keep_keyframes() {
        let mut buffers = TrialBuffers::new();
        for step in 0..50 {
            let p = Point::new(step as f64, 0.0);
            buffers.record(step, p, p, p, p);
        }
        assert_eq!(buffers.len(), KEYFRAMES.len());
    }

    #[test]
    fn assembly_orders_and_rescales() {
        let mut buffers = TrialBuffers::new();
        for (k, step) in KEYFRAMES.iter().enumerate() {
            let hand = Point::new(0.1 * k as f64, -0.2);
            buffers.record(*step, hand, Point::new(4.0, 0.0), Point::default(), Point::new(0.0, 1.0));
        }
        let mut sound = [8.5; SOUND_DIMS];
        sound[5..].fill(10.75);
        let outcome = SensoryOutcome::assemble([0.25; 6], &buffers, &sound);
        assert_eq!(outcome.as_slice().len(), SENSORY_DIMS);
        assert_eq!(outcome.block(SensoryBlock::Context), &[0.25; 6]);
        let hand = outcome.block(SensoryBlock::Hand);
        assert!((hand[1] - 0.05).abs() < 1e-12);
        assert!((hand[5] + 0.1).abs() < 1e-12);
        assert!(outcome.block(SensoryBlock::Tool)[..5].iter().all(|v| *v == 1.0));
        let recentred = outcome.block(SensoryBlock::Sound);
        assert!(recentred[..5].iter().all(|v| v.abs() < 1e-12));
        assert!(recentred[5..].iter().all(|v| (v - 0.5).abs() < 1e-12));
        assert!(outcome.block(SensoryBlock::Caregiver)[5..].iter().all(|v| (v - 0.5).abs() < 1e-12));
    }

    #[test]
    fn parses_block_labels() {
        assert_eq!("toy".parse::<SensoryBlock>().unwrap(), SensoryBlock::Toy);
        assert!("elbow".parse::<SensoryBlock>().is_err());
    }
}
