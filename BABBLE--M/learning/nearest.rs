use ndarray::{Array1, Axis};
use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{
    error::LearningError,
    models::{ImitationSource, InferenceMode, SensorimotorModel},
};

/// Nearest-neighbour forward/inverse model.
///
/// Stores every `motor ⊕ sensory` row and answers a query with the row closest
/// on the known dims. In explore mode the inferred values are perturbed by
/// uniform noise of `sigma_explo_ratio` times each dim's range.
#[derive(Debug, Clone)]
pub struct NearestNeighborModel {
    m_dims: usize,
    s_dims: usize,
    mins: Array1<f64>,
    maxs: Array1<f64>,
    rows: Vec<Array1<f64>>,
    sigma_explo_ratio: f64,
    mode: InferenceMode,
    rng: SmallRng,
}

impl NearestNeighborModel {
    /// Creates an empty model over `[mins, maxs]` with `m_dims` motor dims
    /// followed by sensory dims.
    pub fn new(
        m_dims: usize,
        mins: Vec<f64>,
        maxs: Vec<f64>,
        sigma_explo_ratio: f64,
        seed: u64,
    ) -> Result<Self, LearningError> {
        if mins.len() != maxs.len() || mins.len() < m_dims {
            return Err(LearningError::DimensionMismatch {
                expected: mins.len(),
                actual: maxs.len(),
            });
        }
        Ok(Self {
            m_dims,
            s_dims: mins.len() - m_dims,
            mins: Array1::from(mins),
            maxs: Array1::from(maxs),
            rows: Vec::new(),
            sigma_explo_ratio,
            mode: InferenceMode::Explore,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    /// Model over `[-1, 1]` for every dim.
    pub fn unit(m_dims: usize, s_dims: usize, sigma_explo_ratio: f64, seed: u64) -> Result<Self, LearningError> {
        let dims = m_dims + s_dims;
        Self::new(m_dims, vec![-1.0; dims], vec![1.0; dims], sigma_explo_ratio, seed)
    }

    /// Motor dims, followed by sensory dims.
    #[must_use]
    pub const fn m_dims(&self) -> usize {
        self.m_dims
    }

    /// Sensory dims.
    #[must_use]
    pub const fn s_dims(&self) -> usize {
        self.s_dims
    }

    fn nearest(&self, expl_dims: &[usize], x: &Array1<f64>) -> Option<&Array1<f64>> {
        self.rows
            .iter()
            .map(|row| {
                let known = row.select(Axis(0), expl_dims);
                let distance = (&known - x).mapv(|v| v * v).sum();
                (row, distance)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(row, _)| row)
    }
}

impl ImitationSource for NearestNeighborModel {
    fn observation_count(&self) -> usize {
        self.rows.len()
    }

    fn recent_observations(&self, window: usize) -> Vec<Vec<f64>> {
        let start = self.rows.len().saturating_sub(window);
        self.rows[start..]
            .iter()
            .map(|row| row.iter().skip(self.m_dims).copied().collect())
            .collect()
    }
}

impl SensorimotorModel for NearestNeighborModel {
    fn infer(
        &mut self,
        expl_dims: &[usize],
        inf_dims: &[usize],
        x: &[f64],
    ) -> Result<(Vec<f64>, Vec<f64>), LearningError> {
        if x.len() != expl_dims.len() {
            return Err(LearningError::DimensionMismatch {
                expected: expl_dims.len(),
                actual: x.len(),
            });
        }
        let width = self.mins.len();
        if let Some(bad) = expl_dims.iter().chain(inf_dims).find(|d| **d >= width) {
            return Err(LearningError::DimensionMismatch {
                expected: width,
                actual: bad + 1,
            });
        }
        let query = Array1::from(x.to_vec());
        let row = self
            .nearest(expl_dims, &query)
            .ok_or(LearningError::Bootstrap)?
            .clone();
        let prediction = row.select(Axis(0), expl_dims).to_vec();
        let mut inferred = Vec::with_capacity(inf_dims.len());
        for &d in inf_dims {
            let (lo, hi) = (self.mins[d], self.maxs[d]);
            let noise = match self.mode {
                InferenceMode::Explore if self.sigma_explo_ratio > 0.0 => {
                    let amplitude = self.sigma_explo_ratio * (hi - lo);
                    self.rng.gen_range(-amplitude..amplitude)
                }
                _ => 0.0,
            };
            inferred.push((row[d] + noise).clamp(lo, hi));
        }
        Ok((inferred, prediction))
    }

    fn update(&mut self, motor: &[f64], sensory: &[f64]) -> Result<(), LearningError> {
        if motor.len() != self.m_dims || sensory.len() != self.s_dims {
            return Err(LearningError::DimensionMismatch {
                expected: self.m_dims + self.s_dims,
                actual: motor.len() + sensory.len(),
            });
        }
        let row: Array1<f64> = motor.iter().chain(sensory).copied().collect();
        self.rows.push(row);
        Ok(())
    }

    fn set_mode(&mut self, mode: InferenceMode) {
        self.mode = mode;
    }
}
