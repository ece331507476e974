//! Rules, their update bookkeeping, and the macroclassifier wrapper.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::{Chromosome, InstanceTable, Representation};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(0);

/// Experience below which a rule's exploration fitness reads as zero, so
/// that young rules neither win subsumption contests nor dominate parent
/// selection.
pub const EXPLORATION_EXPERIENCE_GATE: u64 = 10;

/// Process-unique serial identifying one classifier across structural
/// mutations of the population.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
pub struct ClassifierId(u64);

impl ClassifierId {
    fn next() -> Self {
        Self(NEXT_SERIAL.fetch_add(1, Ordering::Relaxed))
    }

    /// Ensures freshly issued serials stay above `self`. Called when a
    /// persisted population is rebound so new rules cannot collide with
    /// loaded ones.
    pub(crate) fn reserve(self) {
        NEXT_SERIAL.fetch_max(self.0 + 1, Ordering::Relaxed);
    }
}

/// How a rule entered the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum RuleOrigin {
    /// Created by covering an unmatched instance.
    Cover,
    /// Produced by the genetic algorithm.
    Ga,
    /// Seeded before training started.
    Init,
}

/// Cached outcome of matching one classifier against one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant)]
pub enum MatchState {
    Unknown,
    No,
    Yes,
}

/// Which deletion-pressure formula produced a classifier's current `d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PressureSource {
    /// `d = ns`: pressure proportional to niche size only.
    #[default]
    Baseline,
    /// `d = ns * mean_fitness / fitness`: the rule is experienced and
    /// markedly below the population mean.
    FitnessPenalty,
}

/// Per-label fitness accumulators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelData {
    pub fitness: f64,
    pub tp: f64,
    pub msa: f64,
    pub ns: f64,
    /// Shared-credit coefficient from the last update step.
    pub k: f64,
    /// Smallest correct-set numerosity seen for this label during the
    /// current update step; cleared between steps.
    pub min_current_ns: Option<f64>,
}

impl LabelData {
    fn new() -> Self {
        Self {
            fitness: 1.0,
            tp: 0.0,
            msa: 0.0,
            ns: 1.0,
            k: 0.0,
            min_current_ns: None,
        }
    }
}

/// Aggregate update state of one classifier: cross-label accumulators,
/// deletion pressure with provenance, and the per-label breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateData {
    pub fitness: f64,
    pub tp: f64,
    pub msa: f64,
    /// Niche-size estimate, smoothed across update steps.
    pub ns: f64,
    /// Deletion pressure; higher is more deletable.
    pub d: f64,
    pub d_source: PressureSource,
    pub labels: Vec<LabelData>,
}

impl UpdateData {
    #[must_use]
    pub fn new(label_count: usize) -> Self {
        Self {
            fitness: 1.0,
            tp: 0.0,
            msa: 0.0,
            ns: 1.0,
            d: 0.0,
            d_source: PressureSource::Baseline,
            labels: (0..label_count).map(|_| LabelData::new()).collect(),
        }
    }
}

/// One rule: chromosome plus all mutable training state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classifier {
    id: ClassifierId,
    pub chromosome: Chromosome,
    pub origin: RuleOrigin,
    pub experience: u64,
    /// Epoch the rule was created in.
    pub created: u64,
    /// Last GA invocation that saw this rule in a correct set.
    pub timestamp: u64,
    subsumption_able: bool,
    pub data: UpdateData,
    match_cache: Vec<MatchState>,
    checked_instances: u32,
    covered_instances: u32,
}

impl Classifier {
    /// Creates a rule with a fresh serial and pristine update state.
    #[must_use]
    pub fn new(chromosome: Chromosome, label_count: usize, origin: RuleOrigin, created: u64) -> Self {
        Self {
            id: ClassifierId::next(),
            chromosome,
            origin,
            experience: 0,
            created,
            timestamp: 0,
            subsumption_able: false,
            data: UpdateData::new(label_count),
            match_cache: Vec::new(),
            checked_instances: 0,
            covered_instances: 0,
        }
    }

    #[must_use]
    pub fn id(&self) -> ClassifierId {
        self.id
    }

    /// Matches the rule against `instance`, computing and caching the
    /// outcome on first evaluation.
    ///
    /// # Panics
    ///
    /// Panics if a non-empty cache disagrees with the table's length; the
    /// cache is bound to one table for the classifier's lifetime.
    pub fn match_at(
        &mut self,
        repr: &dyn Representation,
        table: &InstanceTable,
        instance: usize,
    ) -> bool {
        if self.match_cache.is_empty() {
            self.match_cache = vec![MatchState::Unknown; table.len()];
        }
        assert_eq!(self.match_cache.len(), table.len());
        match self.match_cache[instance] {
            MatchState::Yes => true,
            MatchState::No => false,
            MatchState::Unknown => {
                let matched = repr.is_match(&self.chromosome, table.attributes_of(instance));
                self.match_cache[instance] = if matched {
                    MatchState::Yes
                } else {
                    MatchState::No
                };
                self.checked_instances += 1;
                if matched {
                    self.covered_instances += 1;
                }
                matched
            }
        }
    }

    /// Cached state for `instance` without computing it.
    #[must_use]
    pub fn cached_match(&self, instance: usize) -> MatchState {
        self.match_cache
            .get(instance)
            .copied()
            .unwrap_or(MatchState::Unknown)
    }

    /// True once every instance has been checked and none matched.
    #[must_use]
    pub fn is_zero_coverage(&self, table_len: usize) -> bool {
        self.checked_instances as usize == table_len && self.covered_instances == 0
    }

    /// Drops all cached match outcomes, e.g. when rebinding a persisted
    /// population to a table of different dimensions.
    pub fn clear_match_cache(&mut self) {
        self.match_cache.clear();
        self.checked_instances = 0;
        self.covered_instances = 0;
    }

    /// Fitness as seen by parent selection, thorough-add contests and
    /// deletion: zero until the rule has accumulated minimal experience.
    #[must_use]
    pub fn exploration_fitness(&self) -> f64 {
        if self.experience < EXPLORATION_EXPERIENCE_GATE {
            0.0
        } else {
            self.data.fitness
        }
    }

    /// Raw accuracy `tp / msa`, reading as zero before any appearance.
    #[must_use]
    pub fn exploitation_accuracy(&self) -> f64 {
        let acc = self.data.tp / self.data.msa;
        if acc.is_nan() { 0.0 } else { acc }
    }

    #[must_use]
    pub fn can_subsume(&self) -> bool {
        self.subsumption_able
    }

    pub fn set_subsumption_ability(&mut self, able: bool) {
        self.subsumption_able = able;
    }
}

/// A classifier together with its copy count in the population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macroclassifier {
    pub classifier: Classifier,
    pub numerosity: u64,
    /// How many rules this one has absorbed.
    pub subsumptions: u64,
}

impl Macroclassifier {
    #[must_use]
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            numerosity: 1,
            subsumptions: 0,
        }
    }

    #[must_use]
    pub fn with_numerosity(classifier: Classifier, numerosity: u64) -> Self {
        Self {
            classifier,
            numerosity,
            subsumptions: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> InstanceTable {
        InstanceTable::new(vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0], 2, 1)
    }

    struct FirstBitRepr;

    impl Representation for FirstBitRepr {
        fn chromosome_len(&self) -> usize {
            1
        }
        fn attribute_count(&self) -> usize {
            2
        }
        fn label_count(&self) -> usize {
            1
        }
        fn is_match(&self, chromosome: &Chromosome, attributes: &[f64]) -> bool {
            (attributes[0] > 0.5) == chromosome.get(0)
        }
        fn is_more_general(&self, _: &Chromosome, _: &Chromosome) -> bool {
            false
        }
        fn label_decision(&self, _: &Chromosome, _: usize) -> Option<bool> {
            None
        }
        fn cover(&self, _: &[f64], _: &mut dyn rand::RngCore) -> Chromosome {
            Chromosome::zeroed(1)
        }
        fn fix(&self, _: &mut Chromosome) {}
        fn cut_span(&self, _: usize) -> usize {
            1
        }
        fn specificity(&self, _: &Chromosome) -> f64 {
            1.0
        }
    }

    #[test]
    fn serials_are_unique() {
        let a = Classifier::new(Chromosome::zeroed(4), 1, RuleOrigin::Cover, 0);
        let b = Classifier::new(Chromosome::zeroed(4), 1, RuleOrigin::Cover, 0);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn match_cache_fills_once_and_is_idempotent() {
        let table = table();
        let mut c = Classifier::new(Chromosome::from_bits_str("1"), 1, RuleOrigin::Cover, 0);
        assert!(c.cached_match(0).is_unknown());
        assert!(c.match_at(&FirstBitRepr, &table, 0));
        assert!(c.cached_match(0).is_yes());
        assert!(!c.match_at(&FirstBitRepr, &table, 1));
        assert!(c.cached_match(1).is_no());
        // Re-querying must not move the counters.
        assert!(c.match_at(&FirstBitRepr, &table, 0));
        assert_eq!(c.checked_instances, 2);
        assert_eq!(c.covered_instances, 1);
    }

    #[test]
    fn zero_coverage_requires_full_scan() {
        // Attribute 0 is set in every row, so the "0" rule matches nothing.
        let table = InstanceTable::new(vec![1.0, 0.0, 1.0, 1.0, 1.0, 0.0], 2, 1);
        let mut c = Classifier::new(Chromosome::from_bits_str("1"), 1, RuleOrigin::Cover, 0);
        for i in 0..table.len() {
            c.match_at(&FirstBitRepr, &table, i);
        }
        assert!(!c.is_zero_coverage(table.len()));

        let mut dead = Classifier::new(Chromosome::from_bits_str("0"), 1, RuleOrigin::Cover, 0);
        dead.match_at(&FirstBitRepr, &table, 1);
        assert!(!dead.is_zero_coverage(table.len()));
        dead.match_at(&FirstBitRepr, &table, 0);
        assert!(dead.is_zero_coverage(table.len()));
    }

    #[test]
    fn exploration_fitness_gates_on_experience() {
        let mut c = Classifier::new(Chromosome::zeroed(2), 1, RuleOrigin::Ga, 0);
        c.data.fitness = 0.7;
        assert_eq!(c.exploration_fitness(), 0.0);
        c.experience = EXPLORATION_EXPERIENCE_GATE;
        assert_eq!(c.exploration_fitness(), 0.7);
    }

    #[test]
    fn exploitation_accuracy_guards_zero_appearances() {
        let c = Classifier::new(Chromosome::zeroed(2), 1, RuleOrigin::Cover, 0);
        assert_eq!(c.exploitation_accuracy(), 0.0);
    }
}
