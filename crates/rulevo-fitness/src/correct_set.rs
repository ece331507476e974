//! Per-label correct-set formation from a match set.

use rulevo_engine::{ClassifierSet, InstanceTable, LabelVote, Representation, RuleSetView};

use crate::UpdateParams;

/// One label's correct set: the deciding members that agree with the
/// instance, optionally joined by the match set's wildcards.
#[derive(Debug, Clone, Default)]
pub struct LabelCorrectSet {
    pub view: RuleSetView,
    /// Whether wildcards were admitted under the participation ratio.
    pub includes_wildcards: bool,
}

/// Builds every label's correct set for `instance`.
///
/// A wildcard (abstaining) rule joins a label's correct set only when at
/// least one rule decides the label correctly and the wildcards' combined
/// numerosity does not exceed `wildcard_participation` times the deciding
/// members' numerosity. A set with no correct decider stays empty, which
/// is what triggers covering.
pub fn generate_correct_sets(
    population: &ClassifierSet,
    match_set: &RuleSetView,
    repr: &dyn Representation,
    table: &InstanceTable,
    instance: usize,
    params: &UpdateParams,
) -> Vec<LabelCorrectSet> {
    let labels = table.labels_of(instance);
    (0..repr.label_count())
        .map(|label| {
            let mut deciding_numerosity = 0;
            let mut wildcard_numerosity = 0;
            for entry in match_set {
                let Some(index) = population.find(entry.id) else {
                    continue;
                };
                let chromosome = &population.get(index).classifier.chromosome;
                match repr.classify_label(chromosome, labels, label) {
                    LabelVote::For => deciding_numerosity += entry.numerosity,
                    LabelVote::Abstain => wildcard_numerosity += entry.numerosity,
                    LabelVote::Against => {}
                }
            }
            #[expect(clippy::cast_precision_loss)]
            let includes_wildcards = deciding_numerosity > 0
                && wildcard_numerosity > 0
                && wildcard_numerosity as f64
                    <= params.wildcard_participation * deciding_numerosity as f64;

            let mut view = RuleSetView::default();
            if deciding_numerosity > 0 {
                for entry in match_set {
                    let Some(index) = population.find(entry.id) else {
                        continue;
                    };
                    let chromosome = &population.get(index).classifier.chromosome;
                    let include = match repr.classify_label(chromosome, labels, label) {
                        LabelVote::For => true,
                        LabelVote::Abstain => includes_wildcards,
                        LabelVote::Against => false,
                    };
                    if include {
                        view.push(*entry);
                    }
                }
            }
            LabelCorrectSet {
                view,
                includes_wildcards,
            }
        })
        .collect()
}
