//! Vote-based labeling and dataset-level evaluation metrics.

use rulevo_engine::{ClassifierSet, InstanceTable, Representation};

/// Predicts a row's label vector by weighted voting.
///
/// Every matching rule votes on each label it decides, weighted by its
/// exploitation accuracy times numerosity; a label is predicted positive
/// when the signed vote mass is positive. Matching goes through the
/// representation directly, so held-out rows that are not in the training
/// table are fine.
#[must_use]
pub fn classify(
    population: &ClassifierSet,
    repr: &dyn Representation,
    row: &[f64],
) -> Vec<bool> {
    let attributes = &row[..repr.attribute_count()];
    let mut votes = vec![0.0_f64; repr.label_count()];
    for mac in population {
        let cl = &mac.classifier;
        if !repr.is_match(&cl.chromosome, attributes) {
            continue;
        }
        #[expect(clippy::cast_precision_loss)]
        let weight = cl.exploitation_accuracy() * mac.numerosity as f64;
        for (label, vote) in votes.iter_mut().enumerate() {
            if let Some(positive) = repr.label_decision(&cl.chromosome, label) {
                *vote += if positive { weight } else { -weight };
            }
        }
    }
    votes.into_iter().map(|v| v > 0.0).collect()
}

/// Dataset-level classification quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationMetrics {
    /// Mean per-label accuracy over all (instance, label) pairs.
    pub accuracy: f64,
    /// Fraction of instances with every label predicted correctly.
    pub exact_match: f64,
    /// Fraction of (instance, label) pairs predicted wrongly.
    pub hamming_loss: f64,
}

/// Evaluates the population's predictions over a whole table.
#[must_use]
pub fn evaluate(
    population: &ClassifierSet,
    repr: &dyn Representation,
    table: &InstanceTable,
) -> EvaluationMetrics {
    let instances = table.len();
    let labels = table.labels();
    if instances == 0 || labels == 0 {
        return EvaluationMetrics {
            accuracy: 0.0,
            exact_match: 0.0,
            hamming_loss: 0.0,
        };
    }
    let mut wrong_pairs = 0usize;
    let mut exact = 0usize;
    for i in 0..instances {
        let predicted = classify(population, repr, table.row(i));
        let mismatches = table
            .labels_of(i)
            .iter()
            .zip(&predicted)
            .filter(|&(&truth, &guess)| (truth > 0.5) != guess)
            .count();
        if mismatches == 0 {
            exact += 1;
        }
        wrong_pairs += mismatches;
    }
    #[expect(clippy::cast_precision_loss)]
    let pairs = (instances * labels) as f64;
    #[expect(clippy::cast_precision_loss)]
    let instances_f = instances as f64;
    #[expect(clippy::cast_precision_loss)]
    let wrong = wrong_pairs as f64;
    #[expect(clippy::cast_precision_loss)]
    let exact_f = exact as f64;
    EvaluationMetrics {
        accuracy: 1.0 - wrong / pairs,
        exact_match: exact_f / instances_f,
        hamming_loss: wrong / pairs,
    }
}
