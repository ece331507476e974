//! Ternary bit-pair encoding: two bits per attribute (care, value) and two
//! bits per label (decide, value).
//!
//! An attribute pair with the care bit clear is a wildcard. A label pair
//! with the decide bit clear abstains from that label's vote. The value
//! bit of any uncared pair is kept at zero so that structurally equal
//! rules have equal chromosomes.

use rand::{Rng, RngCore};
use rulevo_engine::{Chromosome, Representation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TernaryRepresentation {
    attributes: usize,
    labels: usize,
    /// Probability that covering leaves an attribute unconstrained.
    pub attribute_generalization: f64,
    /// Probability that covering abstains on a label.
    pub label_generalization: f64,
}

impl TernaryRepresentation {
    /// # Panics
    ///
    /// Panics when `labels` is zero.
    #[must_use]
    pub fn new(attributes: usize, labels: usize) -> Self {
        assert!(labels > 0, "at least one label is required");
        Self {
            attributes,
            labels,
            attribute_generalization: 0.33,
            label_generalization: 0.33,
        }
    }

    fn attr_care(i: usize) -> usize {
        2 * i
    }

    fn attr_value(i: usize) -> usize {
        2 * i + 1
    }

    fn label_care(&self, j: usize) -> usize {
        2 * self.attributes + 2 * j
    }

    fn label_value(&self, j: usize) -> usize {
        2 * self.attributes + 2 * j + 1
    }

    fn truthy(value: f64) -> bool {
        value > 0.5
    }
}

impl Representation for TernaryRepresentation {
    fn chromosome_len(&self) -> usize {
        2 * (self.attributes + self.labels)
    }

    fn attribute_count(&self) -> usize {
        self.attributes
    }

    fn label_count(&self) -> usize {
        self.labels
    }

    fn is_match(&self, chromosome: &Chromosome, attributes: &[f64]) -> bool {
        (0..self.attributes).all(|i| {
            !chromosome.get(Self::attr_care(i))
                || chromosome.get(Self::attr_value(i)) == Self::truthy(attributes[i])
        })
    }

    fn is_more_general(&self, general: &Chromosome, specific: &Chromosome) -> bool {
        let conditions_subsume = (0..self.attributes).all(|i| {
            !general.get(Self::attr_care(i))
                || (specific.get(Self::attr_care(i))
                    && general.get(Self::attr_value(i)) == specific.get(Self::attr_value(i)))
        });
        let consequents_equal = (0..self.labels).all(|j| {
            general.get(self.label_care(j)) == specific.get(self.label_care(j))
                && general.get(self.label_value(j)) == specific.get(self.label_value(j))
        });
        conditions_subsume && consequents_equal
    }

    fn label_decision(&self, chromosome: &Chromosome, label: usize) -> Option<bool> {
        chromosome
            .get(self.label_care(label))
            .then(|| chromosome.get(self.label_value(label)))
    }

    fn cover(&self, row: &[f64], rng: &mut dyn RngCore) -> Chromosome {
        let mut chromosome = Chromosome::zeroed(self.chromosome_len());
        for i in 0..self.attributes {
            if !rng.random_bool(self.attribute_generalization) {
                chromosome.set(Self::attr_care(i), true);
                chromosome.set(Self::attr_value(i), Self::truthy(row[i]));
            }
        }
        let mut decided = false;
        for j in 0..self.labels {
            if !rng.random_bool(self.label_generalization) {
                chromosome.set(self.label_care(j), true);
                chromosome.set(self.label_value(j), Self::truthy(row[self.attributes + j]));
                decided = true;
            }
        }
        if !decided {
            let j = rng.random_range(0..self.labels);
            chromosome.set(self.label_care(j), true);
            chromosome.set(self.label_value(j), Self::truthy(row[self.attributes + j]));
        }
        chromosome
    }

    fn fix(&self, chromosome: &mut Chromosome) {
        for i in 0..self.attributes {
            if !chromosome.get(Self::attr_care(i)) {
                chromosome.set(Self::attr_value(i), false);
            }
        }
        let mut decided = false;
        for j in 0..self.labels {
            if chromosome.get(self.label_care(j)) {
                decided = true;
            } else {
                chromosome.set(self.label_value(j), false);
            }
        }
        // A rule must decide something; resurrect all labels as negative
        // decisions when mutation cleared every decide bit.
        if !decided {
            for j in 0..self.labels {
                chromosome.set(self.label_care(j), true);
            }
        }
    }

    fn cut_span(&self, label: usize) -> usize {
        2 * self.attributes + 2 * (label + 1)
    }

    fn specificity(&self, chromosome: &Chromosome) -> f64 {
        if self.attributes == 0 {
            return 0.0;
        }
        #[expect(clippy::cast_precision_loss)]
        let cared = (0..self.attributes)
            .filter(|&i| chromosome.get(Self::attr_care(i)))
            .count() as f64;
        #[expect(clippy::cast_precision_loss)]
        let total = self.attributes as f64;
        cared / total
    }
}
