//! The rule population and the transient views cut from it.

use std::collections::{HashMap, hash_map::Entry};

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{
    Chromosome, Classifier, ClassifierId, Macroclassifier, PopulationControl, Representation,
};

/// Ordered population of macroclassifiers.
///
/// Structural mutations (append, absorb, micro-deletion, macro removal) keep
/// three things consistent: the macro vector, the id-to-index map, and the
/// total numerosity. Views over the set ([`RuleSetView`]) are only valid
/// between structural mutations and re-resolve members through the id map.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ClassifierSet {
    macros: Vec<Macroclassifier>,
    total_numerosity: u64,
    pub ga_invocations: u64,
    pub covers: u64,
    pub deletions_baseline: u64,
    pub deletions_penalized: u64,
    #[serde(skip)]
    index: HashMap<ClassifierId, usize>,
    #[serde(skip)]
    control: Option<Box<dyn PopulationControl>>,
}

impl ClassifierSet {
    #[must_use]
    pub fn new(control: Option<Box<dyn PopulationControl>>) -> Self {
        Self {
            control,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.macros.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Sum of all numerosities (the micro-classifier count).
    #[must_use]
    pub fn total_numerosity(&self) -> u64 {
        self.total_numerosity
    }

    #[must_use]
    pub fn get(&self, index: usize) -> &Macroclassifier {
        &self.macros[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Macroclassifier {
        &mut self.macros[index]
    }

    /// Current index of the classifier with serial `id`.
    #[must_use]
    pub fn find(&self, id: ClassifierId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Macroclassifier> {
        self.macros.iter()
    }

    pub(crate) fn macros_mut(&mut self) -> &mut [Macroclassifier] {
        &mut self.macros
    }

    /// Appends without any subsumption check or control pass.
    pub fn append(&mut self, mac: Macroclassifier) {
        self.index.insert(mac.classifier.id(), self.macros.len());
        self.total_numerosity += mac.numerosity;
        self.macros.push(mac);
    }

    /// Folds `numerosity` copies into the existing classifier `id`.
    ///
    /// Returns `false` (without mutating) when `id` is not in the set.
    pub fn absorb(&mut self, id: ClassifierId, numerosity: u64) -> bool {
        let Some(index) = self.find(id) else {
            return false;
        };
        let mac = &mut self.macros[index];
        mac.numerosity += numerosity;
        mac.subsumptions += 1;
        self.total_numerosity += numerosity;
        true
    }

    /// Removes one copy of the classifier at `index`, dropping the macro
    /// when its numerosity reaches zero.
    pub fn delete_micro(&mut self, index: usize) {
        let mac = &mut self.macros[index];
        mac.numerosity -= 1;
        self.total_numerosity -= 1;
        if mac.numerosity == 0 {
            self.remove_macro(index);
        }
    }

    /// Removes the whole macro at `index`, reindexing everything behind it.
    pub fn remove_macro(&mut self, index: usize) -> Macroclassifier {
        let mac = self.macros.remove(index);
        self.index.remove(&mac.classifier.id());
        for (i, moved) in self.macros.iter().enumerate().skip(index) {
            self.index.insert(moved.classifier.id(), i);
        }
        self.total_numerosity -= mac.numerosity;
        mac
    }

    /// Finds the rule that would subsume `incoming`, without mutating.
    ///
    /// Candidates are rules that are subsumption-able and strictly more
    /// general than `incoming`, or structurally equal to it. Among
    /// candidates the winner has the highest exploration fitness weighted
    /// by numerosity, ties broken by higher experience.
    #[must_use]
    pub fn try_subsume(
        &self,
        incoming: &Classifier,
        repr: &dyn Representation,
    ) -> Option<ClassifierId> {
        let mut best: Option<(ClassifierId, f64, u64)> = None;
        for mac in &self.macros {
            let cl = &mac.classifier;
            let candidate = (cl.can_subsume()
                && repr.is_more_general(&cl.chromosome, &incoming.chromosome))
                || cl.chromosome == incoming.chromosome;
            if !candidate {
                continue;
            }
            #[expect(clippy::cast_precision_loss)]
            let weight = cl.exploration_fitness() * mac.numerosity as f64;
            let wins = match best {
                None => true,
                Some((_, best_weight, best_exp)) => {
                    weight > best_weight || (weight == best_weight && cl.experience > best_exp)
                }
            };
            if wins {
                best = Some((cl.id(), weight, cl.experience));
            }
        }
        best.map(|(id, _, _)| id)
    }

    /// Adds a macroclassifier and runs the attached control strategy.
    ///
    /// With `thorough` set the whole set is scanned for a subsumer first;
    /// otherwise the macro is appended blindly (duplicates are later folded
    /// by [`assimilate_duplicates`](Self::assimilate_duplicates)).
    pub fn add_classifier(
        &mut self,
        mac: Macroclassifier,
        thorough: bool,
        repr: &dyn Representation,
        rng: &mut dyn RngCore,
    ) {
        if thorough {
            match self.try_subsume(&mac.classifier, repr) {
                Some(id) => {
                    self.absorb(id, mac.numerosity);
                }
                None => self.append(mac),
            }
        } else {
            self.append(mac);
        }
        self.run_control(rng);
    }

    /// Appends a batch without subsumption checks or a control pass, so a
    /// whole GA generation can land before one deletion sweep.
    pub fn merge_without_control(&mut self, batch: Vec<Macroclassifier>) {
        for mac in batch {
            self.append(mac);
        }
    }

    /// Runs the attached population control strategy once, if any.
    pub fn run_control(&mut self, rng: &mut dyn RngCore) {
        if let Some(control) = self.control.take() {
            control.control(self, rng);
            self.control = Some(control);
        }
    }

    /// Folds structurally equal rules into one macro each, keeping the one
    /// with the highest exploration fitness (ties by experience).
    ///
    /// Returns the number of macros removed. Total numerosity is preserved.
    pub fn assimilate_duplicates(&mut self) -> usize {
        let mut seen: HashMap<Chromosome, usize> = HashMap::new();
        let mut doomed: Vec<usize> = Vec::new();
        for i in 0..self.macros.len() {
            match seen.entry(self.macros[i].classifier.chromosome.clone()) {
                Entry::Vacant(e) => {
                    e.insert(i);
                }
                Entry::Occupied(mut e) => {
                    let j = *e.get();
                    let (a, b) = (&self.macros[i].classifier, &self.macros[j].classifier);
                    let i_wins = a.exploration_fitness() > b.exploration_fitness()
                        || (a.exploration_fitness() == b.exploration_fitness()
                            && a.experience > b.experience);
                    let (winner, loser) = if i_wins { (i, j) } else { (j, i) };
                    let folded = self.macros[loser].numerosity;
                    let carried = self.macros[loser].subsumptions;
                    self.macros[winner].numerosity += folded;
                    self.macros[winner].subsumptions += carried + 1;
                    self.total_numerosity += folded;
                    e.insert(winner);
                    doomed.push(loser);
                }
            }
        }
        doomed.sort_unstable_by(|a, b| b.cmp(a));
        for &i in &doomed {
            self.remove_macro(i);
        }
        doomed.len()
    }

    /// Drops every cached match outcome in the population.
    pub fn clear_match_caches(&mut self) {
        for mac in &mut self.macros {
            mac.classifier.clear_match_cache();
        }
    }

    /// Rebuilds the transient state a deserialized set lacks: the id map,
    /// the serial high-water mark, and the control strategy.
    pub fn rebind(&mut self, control: Option<Box<dyn PopulationControl>>) {
        self.index = self
            .macros
            .iter()
            .enumerate()
            .map(|(i, m)| (m.classifier.id(), i))
            .collect();
        self.total_numerosity = self.macros.iter().map(|m| m.numerosity).sum();
        for mac in &self.macros {
            mac.classifier.id().reserve();
        }
        self.control = control;
    }
}

/// Transient match/correct set: snapshot handles into the population.
///
/// Entries record the member's id, its index at formation time, and its
/// numerosity at formation time. Consumers that mutate the population must
/// re-resolve through [`ClassifierSet::find`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSetView {
    entries: Vec<ViewEntry>,
    total_numerosity: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewEntry {
    pub id: ClassifierId,
    pub index: usize,
    pub numerosity: u64,
}

impl RuleSetView {
    pub fn push(&mut self, entry: ViewEntry) {
        self.total_numerosity += entry.numerosity;
        self.entries.push(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn total_numerosity(&self) -> u64 {
        self.total_numerosity
    }

    #[must_use]
    pub fn entries(&self) -> &[ViewEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ViewEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a ClassifierSet {
    type Item = &'a Macroclassifier;
    type IntoIter = std::slice::Iter<'a, Macroclassifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a RuleSetView {
    type Item = &'a ViewEntry;
    type IntoIter = std::slice::Iter<'a, ViewEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
