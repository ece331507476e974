//! Update-strategy parameters.

use serde::{Deserialize, Serialize};

/// How raw accuracy turns into fitness.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, derive_more::FromStr,
)]
pub enum FitnessMode {
    /// Fitness is recomputed as `accuracy^n` every step.
    Simple,
    /// Fitness moves toward `accuracy^n` by the learning rate.
    Complex,
    /// Per-label shared credit: classifiers in a niche split one unit of
    /// accuracy-derived credit, weighted by numerosity.
    #[default]
    Sharing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpdateParams {
    pub mode: FitnessMode,
    /// Accuracy above which a rule counts as fully accurate.
    pub acc0: f64,
    /// Credit multiplier for rules below `acc0` in sharing mode.
    pub alpha: f64,
    /// Exponent sharpening the accuracy-to-credit curve.
    pub n_power: f64,
    /// Learning rate for every exponential moving average.
    pub learning_rate: f64,
    /// `tp` credit an abstaining rule receives.
    pub omega: f64,
    /// `msa` credit an abstaining rule receives.
    pub phi: f64,
    /// Wildcard numerosity allowed into a correct set, as a multiple of
    /// the deciding members' numerosity. Zero keeps wildcards out.
    pub wildcard_participation: f64,
    /// Experience a rule needs before it may subsume.
    pub subsumption_experience: u64,
    /// Accuracy a rule needs before it may subsume.
    pub subsumption_fitness: f64,
}

impl Default for UpdateParams {
    fn default() -> Self {
        Self {
            mode: FitnessMode::default(),
            acc0: 0.99,
            alpha: 0.1,
            n_power: 10.0,
            learning_rate: 0.2,
            omega: 0.9,
            phi: 1.0,
            wildcard_participation: 1.0,
            subsumption_experience: 100,
            subsumption_fitness: 0.99,
        }
    }
}

impl UpdateParams {
    /// Credit coefficient for one accuracy value: saturates to 1 strictly
    /// above `acc0`, otherwise `alpha * (accuracy / acc0)^n`.
    #[must_use]
    pub fn credit(&self, accuracy: f64) -> f64 {
        if accuracy > self.acc0 {
            1.0
        } else {
            self.alpha * (accuracy / self.acc0).powf(self.n_power)
        }
    }
}
