//! Population-size control: the fixed-size roulette deletion policy.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{ClassifierSet, PressureSource, selection};

/// Strategy invoked after insertions to keep the population bounded.
///
/// Implementations may mutate per-classifier deletion state while running.
/// Returns the number of micro-deletions performed.
pub trait PopulationControl: std::fmt::Debug + Send {
    fn control(&self, set: &mut ClassifierSet, rng: &mut dyn RngCore) -> usize;
}

/// Denominator floor for the penalty quotient. Keeps `d` finite even at
/// zero fitness; the roulette drops non-finite weights, which would make
/// exactly the rules the penalty targets immune to deletion.
const FITNESS_FLOOR: f64 = 1e-10;

/// Parameters of the deletion-pressure formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureParams {
    /// Experience above which a weak rule is penalized.
    pub theta_del: u64,
    /// Fraction of the mean fitness below which a rule counts as weak.
    pub delta: f64,
}

impl Default for PressureParams {
    fn default() -> Self {
        Self {
            theta_del: 20,
            delta: 0.1,
        }
    }
}

/// Deletes by roulette over deletion pressure until the total numerosity
/// fits `max_numerosity`.
///
/// Pressures are recomputed from scratch on every loop iteration, since
/// each deletion shifts the population mean fitness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedSizeRouletteDeletion {
    pub max_numerosity: u64,
    pub pressure: PressureParams,
}

impl FixedSizeRouletteDeletion {
    #[must_use]
    pub fn new(max_numerosity: u64) -> Self {
        Self {
            max_numerosity,
            pressure: PressureParams::default(),
        }
    }

    /// Writes every classifier's deletion pressure `d` and its provenance.
    ///
    /// Experienced rules far below the numerosity-weighted mean fitness get
    /// `d = ns * mean / fitness`; everything else keeps the baseline
    /// `d = ns`.
    pub fn compute_pressures(&self, set: &mut ClassifierSet) {
        let total = set.total_numerosity();
        if total == 0 {
            return;
        }
        #[expect(clippy::cast_precision_loss)]
        let mean = set
            .iter()
            .map(|m| m.classifier.exploration_fitness() * m.numerosity as f64)
            .sum::<f64>()
            / total as f64;
        for mac in set.macros_mut() {
            let cl = &mut mac.classifier;
            // Raw fitness, not the exploration view: the experience gate
            // here is theta_del alone.
            let fitness = cl.data.fitness;
            if cl.experience > self.pressure.theta_del && fitness < self.pressure.delta * mean {
                cl.data.d = cl.data.ns * mean / fitness.max(FITNESS_FLOOR);
                cl.data.d_source = PressureSource::FitnessPenalty;
            } else {
                cl.data.d = cl.data.ns;
                cl.data.d_source = PressureSource::Baseline;
            }
        }
    }
}

impl PopulationControl for FixedSizeRouletteDeletion {
    fn control(&self, set: &mut ClassifierSet, rng: &mut dyn RngCore) -> usize {
        let mut deletions = 0;
        while set.total_numerosity() > self.max_numerosity {
            self.compute_pressures(set);
            #[expect(clippy::cast_precision_loss)]
            let weights: Vec<f64> = set
                .iter()
                .map(|m| m.classifier.data.d * m.numerosity as f64)
                .collect();
            let victim = selection::roulette(&weights, rng)
                .unwrap_or_else(|| rng.random_range(0..set.len()));
            match set.get(victim).classifier.data.d_source {
                PressureSource::Baseline => set.deletions_baseline += 1,
                PressureSource::FitnessPenalty => set.deletions_penalized += 1,
            }
            set.delete_micro(victim);
            deletions += 1;
        }
        deletions
    }
}
