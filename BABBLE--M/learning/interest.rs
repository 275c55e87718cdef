use std::collections::VecDeque;

use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::models::InterestModel;

/// Uniform random goals with competence progress measured over a sliding window.
///
/// Competence of a trial is minus the distance between goal and achieved
/// sensory point, divided by the diagonal of the sensory space. Progress is
/// the mean competence of the newer half of the window minus the older half.
///
/// With context dims, the leading sensory dims are copied from the context
/// handed to `choose` and left out of competence.
#[derive(Debug, Clone)]
pub struct RandomInterest {
    m_dims: usize,
    c_dims: usize,
    s_mins: Vec<f64>,
    s_maxs: Vec<f64>,
    diagonal: f64,
    window: usize,
    competences: VecDeque<f64>,
    rng: SmallRng,
}

impl RandomInterest {
    /// Creates a model for goals in `[s_mins, s_maxs]`; updates carry
    /// `m_dims` motor values before the sensory part.
    #[must_use]
    pub fn new(m_dims: usize, s_mins: Vec<f64>, s_maxs: Vec<f64>, window: usize, seed: u64) -> Self {
        let diagonal = diagonal(&s_mins, &s_maxs);
        Self {
            m_dims,
            c_dims: 0,
            s_mins,
            s_maxs,
            diagonal,
            window: window.max(2),
            competences: VecDeque::new(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Model over `[-1, 1]^s_dims`.
    #[must_use]
    pub fn unit(m_dims: usize, s_dims: usize, window: usize, seed: u64) -> Self {
        Self::new(m_dims, vec![-1.0; s_dims], vec![1.0; s_dims], window, seed)
    }

    /// Treats the first `c_dims` sensory dims as context.
    #[must_use]
    pub fn with_context_dims(mut self, c_dims: usize) -> Self {
        self.c_dims = c_dims.min(self.s_mins.len());
        self.diagonal = diagonal(&self.s_mins[self.c_dims..], &self.s_maxs[self.c_dims..]);
        self
    }

    /// Competences currently in the window, oldest first.
    #[must_use]
    pub fn history(&self) -> &VecDeque<f64> {
        &self.competences
    }
}

fn diagonal(s_mins: &[f64], s_maxs: &[f64]) -> f64 {
    let d = s_mins
        .iter()
        .zip(s_maxs)
        .map(|(lo, hi)| (hi - lo).powi(2))
        .sum::<f64>()
        .sqrt();
    if d > 0.0 {
        d
    } else {
        1.0
    }
}

fn mean<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0_usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

impl InterestModel for RandomInterest {
    fn choose(&mut self, context: &[f64]) -> Vec<f64> {
        let mut goal: Vec<f64> = context
            .iter()
            .copied()
            .chain(std::iter::repeat(0.0))
            .take(self.c_dims)
            .collect();
        for (lo, hi) in self.s_mins.iter().zip(&self.s_maxs).skip(self.c_dims) {
            goal.push(if hi > lo { self.rng.gen_range(*lo..*hi) } else { *lo });
        }
        goal
    }

    fn update(&mut self, expected: &[f64], achieved: &[f64], _prediction: &[f64]) {
        let skip = self.m_dims + self.c_dims;
        let goal = expected.iter().skip(skip);
        let reached = achieved.iter().skip(skip);
        let distance = goal
            .zip(reached)
            .map(|(g, a)| (g - a).powi(2))
            .sum::<f64>()
            .sqrt();
        self.competences.push_back(-distance / self.diagonal);
        while self.competences.len() > self.window {
            self.competences.pop_front();
        }
    }

    fn competence(&self) -> f64 {
        mean(self.competences.iter())
    }

    fn progress(&self) -> f64 {
        let n = self.competences.len();
        if n < 2 {
            return 0.0;
        }
        let half = n / 2;
        let older = mean(self.competences.iter().take(half));
        let newer = mean(self.competences.iter().skip(n - half));
        newer - older
    }

    fn interest(&self) -> f64 {
        self.progress().abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goals_stay_in_bounds() {
        let mut model = RandomInterest::new(1, vec![-0.5, 0.0], vec![0.5, 0.2], 10, 3);
        for _ in 0..100 {
            let goal = model.choose(&[]);
            assert_eq!(goal.len(), 2);
            assert!((-0.5..0.5).contains(&goal[0]));
            assert!((0.0..0.2).contains(&goal[1]));
        }
    }

    #[test]
    fn improving_competence_yields_interest() {
        let mut model = RandomInterest::unit(1, 2, 100, 3);
        assert!(model.interest().abs() < f64::EPSILON);
        for miss in [1.0, 1.0, 0.2, 0.2] {
            model.update(&[0.0, 0.0, 0.0], &[0.0, miss, 0.0], &[]);
        }
        assert!(model.progress() > 0.0);
        assert!((model.interest() - model.progress()).abs() < f64::EPSILON);
        let diagonal = 8f64.sqrt();
        assert!((model.competence() + 1.2 / diagonal / 2.0).abs() < 1e-12);
    }

    #[test]
    fn window_drops_oldest() {
        let mut model = RandomInterest::unit(0, 1, 3, 3);
        for achieved in [1.0, 0.5, 0.25, 0.0] {
            model.update(&[0.0], &[achieved], &[]);
        }
        assert_eq!(model.history().len(), 3);
        assert!((model.history()[0] + 0.25).abs() < 1e-12);
    }

    #[test]
    fn contextual_goals_keep_the_context() {
        let mut model = RandomInterest::unit(1, 3, 10, 5).with_context_dims(2);
        for _ in 0..20 {
            let goal = model.choose(&[0.4, -0.3]);
            assert_eq!(goal.len(), 3);
            assert_eq!(&goal[..2], &[0.4, -0.3]);
            assert!((-1.0..1.0).contains(&goal[2]));
        }
        let short = model.choose(&[0.4]);
        assert_eq!(&short[..2], &[0.4, 0.0]);
    }

    #[test]
    fn contextual_competence_ignores_context() {
        let mut model = RandomInterest::unit(1, 3, 10, 5).with_context_dims(2);
        model.update(&[0.0, 0.9, -0.9, 0.5], &[0.0, -0.9, 0.9, 0.0], &[]);
        // Only the last dim counts, over a diagonal of 2.
        assert!((model.competence() + 0.25).abs() < 1e-12);
    }

    #[test]
    fn steady_competence_has_no_interest() {
        let mut model = RandomInterest::unit(0, 1, 50, 3);
        for _ in 0..10 {
            model.update(&[0.3], &[0.1], &[]);
        }
        assert!(model.interest().abs() < 1e-12);
    }
}
