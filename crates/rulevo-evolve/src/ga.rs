//! Steady-state genetic algorithm over label correct sets.
//!
//! One invocation produces exactly [`CHILDREN_PER_GENERATION`] children
//! from two roulette-selected parents. The run is gated by the
//! numerosity-weighted mean age of the correct set: evolution only fires
//! when the set's members have not
//! been evolved for at least `activation_age` GA ticks, which keeps young
//! niches stable while they accumulate fitness.
//!
//! The algorithm never inserts into the population itself. Each child is
//! routed to one of three destinations, in order:
//!
//! 1. a parent that can subsume it (higher exploration fitness wins the
//!    contest, ties broken by experience),
//! 2. any population member that can subsume it,
//! 3. a fresh macroclassifier.
//!
//! Destinations are reported through [`Evolution`] so the caller can hold
//! the output of several labels and apply it in one batch followed by a
//! single population-control pass.

use rand::{Rng, RngCore};
use rulevo_engine::{
    Classifier, ClassifierId, ClassifierSet, Evolution, GaStrategy, Macroclassifier,
    Representation, RuleOrigin, RuleSetView, selection,
};
use serde::{Deserialize, Serialize};

use crate::CrossoverOp;

/// Children produced per GA invocation.
pub const CHILDREN_PER_GENERATION: usize = 2;

/// Tunables of the steady-state GA.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaParams {
    /// Probability of recombining (vs. cloning) when the parents differ.
    pub crossover_rate: f64,
    /// Per-bit flip probability, applied to every child.
    pub mutation_rate: f64,
    /// Minimum GA ticks since a correct set's mean timestamp before it is
    /// evolved again.
    pub activation_age: u64,
    pub crossover: CrossoverOp,
}

impl Default for GaParams {
    fn default() -> Self {
        Self {
            crossover_rate: 0.8,
            mutation_rate: 0.04,
            activation_age: 100,
            crossover: CrossoverOp::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteadyStateGa {
    pub params: GaParams,
    timestamp: u64,
}

impl SteadyStateGa {
    #[must_use]
    pub fn new(params: GaParams) -> Self {
        Self::with_timestamp(params, 0)
    }

    /// Resumes the GA clock of a persisted run.
    #[must_use]
    pub fn with_timestamp(params: GaParams, timestamp: u64) -> Self {
        Self { params, timestamp }
    }

    /// Draws one parent index (into `members`) by roulette over
    /// exploration fitness weighted by current numerosity, falling back to
    /// a uniform draw when the whole set reads as zero fitness.
    fn select_parent(
        members: &[usize],
        population: &ClassifierSet,
        rng: &mut dyn RngCore,
    ) -> usize {
        #[expect(clippy::cast_precision_loss)]
        let weights: Vec<f64> = members
            .iter()
            .map(|&i| {
                let mac = population.get(i);
                mac.classifier.exploration_fitness() * mac.numerosity as f64
            })
            .collect();
        let slot = selection::roulette(&weights, rng)
            .unwrap_or_else(|| rng.random_range(0..members.len()));
        members[slot]
    }

    /// Picks the parent that subsumes `child`, if either can.
    fn parent_subsumer(
        child: &Classifier,
        parents: [&Macroclassifier; 2],
        repr: &dyn Representation,
    ) -> Option<ClassifierId> {
        let mut best: Option<(ClassifierId, f64, u64)> = None;
        for mac in parents {
            let cl = &mac.classifier;
            let candidate = (cl.can_subsume()
                && repr.is_more_general(&cl.chromosome, &child.chromosome))
                || cl.chromosome == child.chromosome;
            if !candidate {
                continue;
            }
            let fitness = cl.exploration_fitness();
            let wins = match best {
                None => true,
                Some((_, best_fitness, best_exp)) => {
                    fitness > best_fitness
                        || (fitness == best_fitness && cl.experience > best_exp)
                }
            };
            if wins {
                best = Some((cl.id(), fitness, cl.experience));
            }
        }
        best.map(|(id, _, _)| id)
    }
}

impl GaStrategy for SteadyStateGa {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn bump_timestamp(&mut self) -> u64 {
        self.timestamp += 1;
        self.timestamp
    }

    fn evolve(
        &mut self,
        correct_set: &RuleSetView,
        population: &mut ClassifierSet,
        label: usize,
        epoch: u64,
        repr: &dyn Representation,
        rng: &mut dyn RngCore,
    ) -> Evolution {
        // Members are re-resolved by id: the view's indices may predate
        // structural mutations.
        let members: Vec<usize> = correct_set
            .iter()
            .filter_map(|entry| population.find(entry.id))
            .collect();
        if members.is_empty() {
            return Evolution::default();
        }

        // Mean timestamp is weighted by numerosity: a heavy macro counts
        // once per copy it represents.
        let (age_sum, weight) = members.iter().fold((0_u64, 0_u64), |(age, weight), &i| {
            let mac = population.get(i);
            (
                age + mac.numerosity * mac.classifier.timestamp,
                weight + mac.numerosity,
            )
        });
        let mean_age = age_sum / weight.max(1);
        if self.timestamp.saturating_sub(mean_age) < self.params.activation_age {
            return Evolution::default();
        }
        for &i in &members {
            population.get_mut(i).classifier.timestamp = self.timestamp;
        }

        let index_a = Self::select_parent(&members, population, rng);
        let index_b = Self::select_parent(&members, population, rng);
        let span = repr
            .cut_span(label)
            .clamp(1, repr.chromosome_len());

        let mut evolution = Evolution::default();
        for child_no in 0..CHILDREN_PER_GENERATION {
            let (first, second) = if child_no == 0 {
                (index_a, index_b)
            } else {
                (index_b, index_a)
            };
            let lead = &population.get(first).classifier;
            let mate = &population.get(second).classifier;

            let crossed = lead.chromosome != mate.chromosome
                && rng.random_bool(self.params.crossover_rate);
            let (mut chromosome, inherited_fitness) = if crossed {
                let child = self
                    .params
                    .crossover
                    .recombine(&lead.chromosome, &mate.chromosome, span, rng);
                (child, None)
            } else {
                (lead.chromosome.clone(), Some(lead.data.fitness))
            };
            crate::operators::mutate(&mut chromosome, self.params.mutation_rate, rng);
            repr.fix(&mut chromosome);

            let mut child = Classifier::new(chromosome, repr.label_count(), RuleOrigin::Ga, epoch);
            child.data.ns = (lead.data.ns + mate.data.ns) / 2.0;
            if let Some(fitness) = inherited_fitness {
                child.data.fitness = fitness;
            }

            let parents = [population.get(first), population.get(second)];
            if let Some(id) = Self::parent_subsumer(&child, parents, repr) {
                evolution.subsumed.push(id);
            } else if let Some(id) = population.try_subsume(&child, repr) {
                evolution.subsumed.push(id);
            } else {
                evolution.offspring.push(Macroclassifier::new(child));
            }
        }
        evolution
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;
    use rulevo_engine::{Chromosome, InstanceTable, ViewEntry, matching};
    use rulevo_repr::TernaryRepresentation;

    use super::*;

    fn quiet_params() -> GaParams {
        GaParams {
            crossover_rate: 0.0,
            mutation_rate: 0.0,
            activation_age: 0,
            crossover: CrossoverOp::SinglePoint,
        }
    }

    fn seasoned(repr: &TernaryRepresentation, bits: &str, fitness: f64) -> Classifier {
        assert_eq!(bits.len(), repr.chromosome_len());
        let mut c = Classifier::new(Chromosome::from_bits_str(bits), repr.label_count(), RuleOrigin::Cover, 0);
        c.data.fitness = fitness;
        c.experience = 50;
        c
    }

    fn correct_set_of(population: &ClassifierSet) -> RuleSetView {
        let mut view = RuleSetView::default();
        for (i, mac) in population.iter().enumerate() {
            view.push(ViewEntry {
                id: mac.classifier.id(),
                index: i,
                numerosity: mac.numerosity,
            });
        }
        view
    }

    #[test]
    fn activation_age_gates_evolution() {
        let repr = TernaryRepresentation::new(2, 1);
        let mut pop = ClassifierSet::new(None);
        pop.append(Macroclassifier::new(seasoned(&repr, "111010", 0.9)));
        let view = correct_set_of(&pop);

        let mut ga = SteadyStateGa::new(GaParams {
            activation_age: 100,
            ..quiet_params()
        });
        let mut rng = Pcg64Mcg::seed_from_u64(9);
        ga.bump_timestamp();
        let out = ga.evolve(&view, &mut pop, 0, 0, &repr, &mut rng);
        assert!(out.is_empty());
        // Gate held: member timestamps untouched.
        assert_eq!(pop.get(0).classifier.timestamp, 0);
    }

    #[test]
    fn activation_gate_weighs_member_age_by_numerosity() {
        let repr = TernaryRepresentation::new(2, 1);
        let mut pop = ClassifierSet::new(None);
        // Nine stale copies (timestamp 0) against one fresh copy
        // (timestamp 100): the weighted mean timestamp is 10.
        let stale = seasoned(&repr, "111010", 0.9);
        let mut fresh = seasoned(&repr, "100011", 0.9);
        fresh.timestamp = 100;
        pop.append(Macroclassifier::with_numerosity(stale, 9));
        pop.append(Macroclassifier::new(fresh));
        let view = correct_set_of(&pop);

        let mut ga = SteadyStateGa::with_timestamp(
            GaParams {
                activation_age: 60,
                ..quiet_params()
            },
            100,
        );
        let mut rng = Pcg64Mcg::seed_from_u64(9);
        let out = ga.evolve(&view, &mut pop, 0, 0, &repr, &mut rng);
        // The niche is 90 ticks stale, so the gate must open.
        assert!(!out.is_empty());
        assert_eq!(pop.get(0).classifier.timestamp, 100);

        // Swapped numerosities put the weighted mean at 90: too fresh.
        let mut pop = ClassifierSet::new(None);
        let stale = seasoned(&repr, "111010", 0.9);
        let mut fresh = seasoned(&repr, "100011", 0.9);
        fresh.timestamp = 100;
        pop.append(Macroclassifier::new(stale));
        pop.append(Macroclassifier::with_numerosity(fresh, 9));
        let view = correct_set_of(&pop);
        let out = ga.evolve(&view, &mut pop, 0, 0, &repr, &mut rng);
        assert!(out.is_empty());
        assert_eq!(pop.get(0).classifier.timestamp, 0);
    }

    #[test]
    fn clone_children_are_subsumed_by_their_parent() {
        let repr = TernaryRepresentation::new(2, 1);
        let mut pop = ClassifierSet::new(None);
        // Canonical under `fix`: uncared positions carry zero value bits.
        let parent = seasoned(&repr, "111010", 0.9);
        let parent_id = parent.id();
        pop.append(Macroclassifier::new(parent));
        let view = correct_set_of(&pop);

        let mut ga = SteadyStateGa::new(quiet_params());
        let mut rng = Pcg64Mcg::seed_from_u64(9);
        ga.bump_timestamp();
        let out = ga.evolve(&view, &mut pop, 0, 3, &repr, &mut rng);
        // Mutation and crossover are off: both children equal the parent.
        assert_eq!(out.subsumed, vec![parent_id, parent_id]);
        assert!(out.offspring.is_empty());
        assert_eq!(pop.get(0).classifier.timestamp, ga.timestamp());
    }

    #[test]
    fn distinct_parents_materialize_offspring() {
        let repr = TernaryRepresentation::new(2, 1);
        let mut pop = ClassifierSet::new(None);
        pop.append(Macroclassifier::new(seasoned(&repr, "111010", 0.9)));
        pop.append(Macroclassifier::new(seasoned(&repr, "100011", 0.8)));
        let view = correct_set_of(&pop);

        let mut ga = SteadyStateGa::new(GaParams {
            crossover_rate: 1.0,
            ..quiet_params()
        });
        let mut rng = Pcg64Mcg::seed_from_u64(17);
        ga.bump_timestamp();
        let out = ga.evolve(&view, &mut pop, 0, 5, &repr, &mut rng);
        assert_eq!(out.subsumed.len() + out.offspring.len(), CHILDREN_PER_GENERATION);
        for mac in &out.offspring {
            let cl = &mac.classifier;
            assert_eq!(cl.origin, RuleOrigin::Ga);
            assert_eq!(cl.created, 5);
            assert_eq!(cl.chromosome.len(), repr.chromosome_len());
            assert_eq!(mac.numerosity, 1);
            // ns is the parents' mean.
            assert!((cl.data.ns - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn evolution_is_deterministic_for_a_seed() {
        let repr = TernaryRepresentation::new(3, 2);
        let table = InstanceTable::new(vec![1.0, 0.0, 1.0, 1.0, 0.0], 3, 2);

        let run = || {
            let mut pop = ClassifierSet::new(None);
            let mut rng = Pcg64Mcg::seed_from_u64(33);
            let mut seed_rng = Pcg64Mcg::seed_from_u64(1);
            for _ in 0..4 {
                let mut c = Classifier::new(
                    repr.cover(table.row(0), &mut seed_rng),
                    repr.label_count(),
                    RuleOrigin::Cover,
                    0,
                );
                c.experience = 50;
                c.data.fitness = 0.7;
                pop.append(Macroclassifier::new(c));
            }
            let view = matching::generate_match_set(&mut pop, &repr, &table, 0);
            let mut ga = SteadyStateGa::new(GaParams {
                crossover_rate: 1.0,
                mutation_rate: 0.05,
                activation_age: 0,
                crossover: CrossoverOp::TwoPoint,
            });
            ga.bump_timestamp();
            let out = ga.evolve(&view, &mut pop, 1, 2, &repr, &mut rng);
            (
                out.subsumed.len(),
                out.offspring
                    .iter()
                    .map(|m| m.classifier.chromosome.to_string())
                    .collect::<Vec<_>>(),
            )
        };
        assert_eq!(run(), run());
    }
}
