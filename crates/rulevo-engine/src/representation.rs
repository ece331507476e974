//! Capability seam between the engine and a concrete rule encoding.

use rand::RngCore;

use crate::Chromosome;

/// Per-label stance of a rule toward an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum LabelVote {
    /// The rule decides this label and disagrees with the instance.
    Against,
    /// The rule does not decide this label (wildcard consequent).
    Abstain,
    /// The rule decides this label and agrees with the instance.
    For,
}

/// Interprets chromosome bits as a condition plus per-label consequents.
///
/// The engine never looks inside a [`Chromosome`] except through this trait
/// and the bit-level genetic operators. Implementations must be pure with
/// respect to the chromosome and instance: matching is cached per
/// (classifier, instance) and never recomputed.
pub trait Representation: Sync {
    /// Number of bits every chromosome under this representation carries.
    fn chromosome_len(&self) -> usize;

    fn attribute_count(&self) -> usize;

    fn label_count(&self) -> usize;

    /// Whether the condition covers an instance's attribute values.
    fn is_match(&self, chromosome: &Chromosome, attributes: &[f64]) -> bool;

    /// Whether `general` covers every instance `specific` covers while
    /// deciding the same consequents.
    fn is_more_general(&self, general: &Chromosome, specific: &Chromosome) -> bool;

    /// The consequent's decision for `label`: `Some(positive)` when the
    /// rule decides it, `None` when it abstains.
    fn label_decision(&self, chromosome: &Chromosome, label: usize) -> Option<bool>;

    /// Stance of the consequent for `label` given the instance's label
    /// values (truthy above 0.5).
    fn classify_label(&self, chromosome: &Chromosome, labels: &[f64], label: usize) -> LabelVote {
        match self.label_decision(chromosome, label) {
            None => LabelVote::Abstain,
            Some(positive) if positive == (labels[label] > 0.5) => LabelVote::For,
            Some(_) => LabelVote::Against,
        }
    }

    /// Creates a chromosome matching `row` (attributes first, then labels),
    /// with stochastic generalization.
    fn cover(&self, row: &[f64], rng: &mut dyn RngCore) -> Chromosome;

    /// Repairs a chromosome after mutation/crossover so it denotes a valid
    /// rule and structurally equal rules have equal bits.
    fn fix(&self, chromosome: &mut Chromosome);

    /// Exclusive upper bound for crossover cut points when evolving toward
    /// `label`: the attribute span plus that label's consequent bits.
    fn cut_span(&self, label: usize) -> usize;

    /// Fraction of attributes the condition constrains, in `[0, 1]`.
    fn specificity(&self, chromosome: &Chromosome) -> f64;
}
