//! Fitness, accuracy and niche-size updates applied to a match set.
//!
//! Every classifier in the match set is touched exactly once per instance:
//! per-label stance decides `tp`/`msa` credit (abstaining rules earn the
//! discounted `omega`/`phi` amounts), niche-size estimates move toward the
//! smallest correct-set numerosity seen this step, and experience grows by
//! one regardless of the label count. What fitness means depends on the
//! configured [`FitnessMode`].

use rulevo_engine::{ClassifierSet, InstanceTable, LabelVote, Representation, RuleSetView};

use crate::{FitnessMode, LabelCorrectSet, UpdateParams};

fn nan_guard(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value }
}

/// Runs one update step for `instance` over the match set.
pub fn apply(
    params: &UpdateParams,
    population: &mut ClassifierSet,
    match_set: &RuleSetView,
    correct_sets: &[LabelCorrectSet],
    repr: &dyn Representation,
    table: &InstanceTable,
    instance: usize,
) {
    match params.mode {
        FitnessMode::Sharing => {
            share_fitness(params, population, match_set, correct_sets, repr, table, instance);
        }
        FitnessMode::Simple | FitnessMode::Complex => {
            accuracy_fitness(params, population, match_set, correct_sets, repr, table, instance);
        }
    }
}

/// Simple/complex modes: cross-label accuracy drives fitness directly.
fn accuracy_fitness(
    params: &UpdateParams,
    population: &mut ClassifierSet,
    match_set: &RuleSetView,
    correct_sets: &[LabelCorrectSet],
    repr: &dyn Representation,
    table: &InstanceTable,
    instance: usize,
) {
    let label_values = table.labels_of(instance);
    for entry in match_set {
        let Some(index) = population.find(entry.id) else {
            continue;
        };
        let cl = &mut population.get_mut(index).classifier;
        let mut min_ns: Option<f64> = None;
        for (label, cs) in correct_sets.iter().enumerate() {
            #[expect(clippy::cast_precision_loss)]
            let label_ns = cs.view.total_numerosity() as f64;
            match repr.classify_label(&cl.chromosome, label_values, label) {
                LabelVote::Abstain => {
                    cl.data.tp += params.omega;
                    cl.data.msa += params.phi;
                    if cs.includes_wildcards {
                        min_ns = Some(min_ns.map_or(label_ns, |m| m.min(label_ns)));
                    }
                }
                LabelVote::For => {
                    cl.data.tp += 1.0;
                    cl.data.msa += 1.0;
                    min_ns = Some(min_ns.map_or(label_ns, |m| m.min(label_ns)));
                }
                LabelVote::Against => cl.data.msa += 1.0,
            }
        }
        cl.experience += 1;
        if let Some(ns) = min_ns {
            cl.data.ns += params.learning_rate * (ns - cl.data.ns);
        }
        let accuracy = cl.exploitation_accuracy();
        let target = accuracy.powf(params.n_power);
        cl.data.fitness = match params.mode {
            FitnessMode::Simple => target,
            _ => cl.data.fitness + params.learning_rate * (target - cl.data.fitness),
        };
        cl.set_subsumption_ability(
            accuracy > params.subsumption_fitness
                && cl.experience > params.subsumption_experience,
        );
    }
}

/// Sharing mode: each label's correct set splits one unit of credit among
/// its members, weighted by numerosity and the accuracy-derived `k`.
fn share_fitness(
    params: &UpdateParams,
    population: &mut ClassifierSet,
    match_set: &RuleSetView,
    correct_sets: &[LabelCorrectSet],
    repr: &dyn Representation,
    table: &InstanceTable,
    instance: usize,
) {
    let label_values = table.labels_of(instance);

    for (label, cs) in correct_sets.iter().enumerate() {
        #[expect(clippy::cast_precision_loss)]
        let label_ns = cs.view.total_numerosity() as f64;
        let mut relative_accuracy = 0.0;
        for entry in match_set {
            let Some(index) = population.find(entry.id) else {
                continue;
            };
            let mac = population.get_mut(index);
            #[expect(clippy::cast_precision_loss)]
            let numerosity = mac.numerosity as f64;
            let cl = &mut mac.classifier;
            match repr.classify_label(&cl.chromosome, label_values, label) {
                LabelVote::Abstain => {
                    cl.data.tp += params.omega;
                    cl.data.msa += params.phi;
                    let ld = &mut cl.data.labels[label];
                    ld.tp += params.omega;
                    ld.msa += params.phi;
                    if cs.includes_wildcards {
                        ld.min_current_ns =
                            Some(ld.min_current_ns.map_or(label_ns, |m| m.min(label_ns)));
                        ld.k = params.credit(nan_guard(ld.tp / ld.msa));
                    } else {
                        ld.k = 0.0;
                    }
                }
                LabelVote::For => {
                    cl.data.tp += 1.0;
                    cl.data.msa += 1.0;
                    let ld = &mut cl.data.labels[label];
                    ld.tp += 1.0;
                    ld.msa += 1.0;
                    ld.min_current_ns =
                        Some(ld.min_current_ns.map_or(label_ns, |m| m.min(label_ns)));
                    ld.k = params.credit(nan_guard(ld.tp / ld.msa));
                }
                LabelVote::Against => {
                    cl.data.msa += 1.0;
                    let ld = &mut cl.data.labels[label];
                    ld.msa += 1.0;
                    ld.k = 0.0;
                }
            }
            relative_accuracy += numerosity * cl.data.labels[label].k;
        }

        if relative_accuracy <= 0.0 {
            relative_accuracy = 1.0;
        }
        for entry in match_set {
            let Some(index) = population.find(entry.id) else {
                continue;
            };
            let mac = population.get_mut(index);
            #[expect(clippy::cast_precision_loss)]
            let numerosity = mac.numerosity as f64;
            let ld = &mut mac.classifier.data.labels[label];
            ld.fitness +=
                params.learning_rate * (numerosity * ld.k / relative_accuracy - ld.fitness);
        }
    }

    // Aggregate pass: one experience tick, the cross-label fitness mean
    // per micro-copy, and the niche-size EMA.
    for entry in match_set {
        let Some(index) = population.find(entry.id) else {
            continue;
        };
        let mac = population.get_mut(index);
        #[expect(clippy::cast_precision_loss)]
        let numerosity = mac.numerosity as f64;
        let cl = &mut mac.classifier;
        cl.experience += 1;

        #[expect(clippy::cast_precision_loss)]
        let label_count = cl.data.labels.len() as f64;
        let fitness_sum: f64 = cl.data.labels.iter().map(|ld| ld.fitness).sum();
        cl.data.fitness = fitness_sum / (numerosity * label_count);

        let mut ns_sum = 0.0;
        let mut ns_seen = 0u32;
        for ld in &mut cl.data.labels {
            if let Some(ns) = ld.min_current_ns.take() {
                ns_sum += ns;
                ns_seen += 1;
            }
        }
        if ns_seen > 0 {
            let target = ns_sum / f64::from(ns_seen);
            cl.data.ns += params.learning_rate * (target - cl.data.ns);
        }

        let accuracy = cl.exploitation_accuracy();
        cl.set_subsumption_ability(
            accuracy.powf(params.n_power) > params.acc0
                && cl.experience >= params.subsumption_experience,
        );
    }
}

#[cfg(test)]
mod tests {
    use rulevo_engine::{Chromosome, Classifier, Macroclassifier, RuleOrigin, ViewEntry, matching};
    use rulevo_repr::TernaryRepresentation;

    use super::*;
    use crate::correct_set::generate_correct_sets;

    // One attribute, one label: [attr care, attr value, decide, value].
    fn repr() -> TernaryRepresentation {
        TernaryRepresentation::new(1, 1)
    }

    fn table() -> InstanceTable {
        InstanceTable::new(vec![1.0, 1.0], 1, 1)
    }

    fn population_of(rules: &[(&str, u64)]) -> ClassifierSet {
        let mut pop = ClassifierSet::new(None);
        for &(bits, numerosity) in rules {
            let c = Classifier::new(Chromosome::from_bits_str(bits), 1, RuleOrigin::Cover, 0);
            pop.append(Macroclassifier::with_numerosity(c, numerosity));
        }
        pop
    }

    fn step(params: &UpdateParams, pop: &mut ClassifierSet) {
        let repr = repr();
        let table = table();
        let match_set = matching::generate_match_set(pop, &repr, &table, 0);
        let correct = generate_correct_sets(pop, &match_set, &repr, &table, 0, params);
        apply(params, pop, &match_set, &correct, &repr, &table, 0);
    }

    #[test]
    fn simple_mode_recomputes_accuracy_power() {
        let params = UpdateParams {
            mode: FitnessMode::Simple,
            ..UpdateParams::default()
        };
        let mut pop = population_of(&[("1111", 1), ("1110", 1)]);
        step(&params, &mut pop);

        let correct = &pop.get(0).classifier;
        assert_eq!(correct.experience, 1);
        assert_eq!(correct.data.tp, 1.0);
        assert_eq!(correct.data.msa, 1.0);
        assert_eq!(correct.data.fitness, 1.0);

        let wrong = &pop.get(1).classifier;
        assert_eq!(wrong.data.tp, 0.0);
        assert_eq!(wrong.data.msa, 1.0);
        assert_eq!(wrong.data.fitness, 0.0);
    }

    #[test]
    fn complex_mode_moves_toward_accuracy_power() {
        let params = UpdateParams {
            mode: FitnessMode::Complex,
            ..UpdateParams::default()
        };
        let mut pop = population_of(&[("1110", 1)]);
        // Initial fitness 1.0, target 0: one step of the EMA.
        step(&params, &mut pop);
        let cl = &pop.get(0).classifier;
        assert!((cl.data.fitness - 0.8).abs() < 1e-12);
    }

    #[test]
    fn sharing_splits_credit_by_numerosity() {
        let params = UpdateParams::default();
        let mut pop = population_of(&[("1111", 1), ("1111", 3)]);
        step(&params, &mut pop);

        // Both rules are fully accurate: k = 1, relative accuracy = 4.
        let light = &pop.get(0).classifier;
        let heavy = &pop.get(1).classifier;
        assert!((light.data.labels[0].fitness - 0.85).abs() < 1e-12);
        assert!((heavy.data.labels[0].fitness - 0.95).abs() < 1e-12);
        // Aggregate fitness is per micro-copy.
        assert!((light.data.fitness - 0.85).abs() < 1e-12);
        assert!((heavy.data.fitness - 0.95 / 3.0).abs() < 1e-12);
        // Niche size moves toward the correct set's numerosity.
        assert!((light.data.ns - 1.6).abs() < 1e-12);
        // The step consumed the per-step minimum.
        assert_eq!(light.data.labels[0].min_current_ns, None);
    }

    #[test]
    fn sharing_gives_wrong_rules_no_credit() {
        let params = UpdateParams::default();
        let mut pop = population_of(&[("1111", 1), ("1110", 1)]);
        step(&params, &mut pop);
        let wrong = &pop.get(1).classifier;
        assert_eq!(wrong.data.labels[0].k, 0.0);
        assert!(wrong.data.labels[0].fitness < 1.0);
        assert_eq!(wrong.data.tp, 0.0);
        assert_eq!(wrong.data.msa, 1.0);
    }

    #[test]
    fn sharing_wildcards_earn_discounted_credit() {
        let params = UpdateParams::default();
        let mut pop = population_of(&[("1111", 1), ("1100", 1)]);
        step(&params, &mut pop);
        let wildcard = &pop.get(1).classifier;
        assert_eq!(wildcard.data.tp, params.omega);
        assert_eq!(wildcard.data.msa, params.phi);
        let k = wildcard.data.labels[0].k;
        assert!(k > 0.0 && k < 1.0);
        // Wildcard niche-size estimate also moved.
        assert!(wildcard.data.ns > 1.0);
    }

    #[test]
    fn experience_ticks_once_per_instance_across_labels() {
        let repr = TernaryRepresentation::new(1, 2);
        let table = InstanceTable::new(vec![1.0, 1.0, 0.0], 1, 2);
        let mut pop = ClassifierSet::new(None);
        // Decides both labels correctly: [attr 1=1][l0: decide 1][l1: decide 0].
        let c = Classifier::new(Chromosome::from_bits_str("111110"), 2, RuleOrigin::Cover, 0);
        pop.append(Macroclassifier::new(c));

        let params = UpdateParams::default();
        let match_set = matching::generate_match_set(&mut pop, &repr, &table, 0);
        let correct = generate_correct_sets(&pop, &match_set, &repr, &table, 0, &params);
        assert_eq!(correct.len(), 2);
        apply(&params, &mut pop, &match_set, &correct, &repr, &table, 0);

        let cl = &pop.get(0).classifier;
        assert_eq!(cl.experience, 1);
        assert_eq!(cl.data.tp, 2.0);
        assert_eq!(cl.data.msa, 2.0);
    }

    #[test]
    fn subsumption_gates_on_accuracy_and_experience() {
        let params = UpdateParams {
            mode: FitnessMode::Simple,
            subsumption_experience: 2,
            ..UpdateParams::default()
        };
        let mut pop = population_of(&[("1111", 1)]);
        step(&params, &mut pop);
        assert!(!pop.get(0).classifier.can_subsume());
        step(&params, &mut pop);
        step(&params, &mut pop);
        // Accuracy 1.0 > 0.99 and experience 3 > 2.
        assert!(pop.get(0).classifier.can_subsume());
    }
}
