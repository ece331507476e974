//! Shared fixtures for unit tests: a minimal two-bit representation and
//! rule constructors.

use rand::RngCore;

use crate::{Chromosome, Classifier, Representation, RuleOrigin};

/// Two-bit rules over a single attribute: bit 0 set means wildcard,
/// otherwise bit 1 must equal the attribute's truthiness. The single
/// consequent abstains for wildcards and otherwise votes by comparing
/// bit 1 to the label value.
pub(crate) struct PairRepr;

impl Representation for PairRepr {
    fn chromosome_len(&self) -> usize {
        2
    }
    fn attribute_count(&self) -> usize {
        1
    }
    fn label_count(&self) -> usize {
        1
    }
    fn is_match(&self, chromosome: &Chromosome, attributes: &[f64]) -> bool {
        chromosome.get(0) || chromosome.get(1) == (attributes[0] > 0.5)
    }
    fn is_more_general(&self, general: &Chromosome, specific: &Chromosome) -> bool {
        general.get(0) && !specific.get(0)
    }
    fn label_decision(&self, chromosome: &Chromosome, _label: usize) -> Option<bool> {
        if chromosome.get(0) {
            None
        } else {
            Some(chromosome.get(1))
        }
    }
    fn cover(&self, row: &[f64], _rng: &mut dyn RngCore) -> Chromosome {
        let mut c = Chromosome::zeroed(2);
        c.set(1, row[0] > 0.5);
        c
    }
    fn fix(&self, chromosome: &mut Chromosome) {
        if chromosome.get(0) {
            chromosome.set(1, false);
        }
    }
    fn cut_span(&self, _label: usize) -> usize {
        2
    }
    fn specificity(&self, chromosome: &Chromosome) -> f64 {
        if chromosome.get(0) { 0.0 } else { 1.0 }
    }
}

pub(crate) fn rule(bits: &str) -> Classifier {
    Classifier::new(Chromosome::from_bits_str(bits), 1, RuleOrigin::Cover, 0)
}

pub(crate) fn seasoned(bits: &str, fitness: f64, experience: u64) -> Classifier {
    let mut c = rule(bits);
    c.data.fitness = fitness;
    c.experience = experience;
    c
}
