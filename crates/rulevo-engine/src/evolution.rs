//! Seam between the population machinery and a genetic algorithm.

use rand::RngCore;

use crate::{ClassifierId, ClassifierSet, Macroclassifier, Representation, RuleSetView};

/// Output of one GA generation, held by the caller and applied in a single
/// batch: absorb the subsumed parents, merge the offspring, then run one
/// population control pass.
#[derive(Debug, Default)]
pub struct Evolution {
    /// Parents (or existing population members) that subsume one child
    /// each; applied as numerosity increments.
    pub subsumed: Vec<ClassifierId>,
    /// Children that survived subsumption and materialize as new macros.
    pub offspring: Vec<Macroclassifier>,
}

impl Evolution {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subsumed.is_empty() && self.offspring.is_empty()
    }
}

/// A steady-state genetic algorithm driven once per (instance, label).
pub trait GaStrategy {
    /// Current value of the GA clock.
    fn timestamp(&self) -> u64;

    /// Advances the GA clock; called once per nonempty correct set.
    fn bump_timestamp(&mut self) -> u64;

    /// Runs one generation toward `label` over `correct_set`.
    ///
    /// Implementations may refresh member timestamps (an activation-age
    /// gate) but must not structurally mutate `population`: everything to
    /// insert or absorb is described by the returned [`Evolution`], so the
    /// caller can batch all labels' output before one control pass.
    fn evolve(
        &mut self,
        correct_set: &RuleSetView,
        population: &mut ClassifierSet,
        label: usize,
        epoch: u64,
        repr: &dyn Representation,
        rng: &mut dyn RngCore,
    ) -> Evolution;
}
