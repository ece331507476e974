//! Match-set formation over the cached instance/classifier grid.
//!
//! Both scans fill each classifier's match cache at most once per
//! (classifier, instance) pair and collect zero-coverage rules for pruning.
//! Pruning is strictly deferred: indices are gathered during the scan and
//! applied in descending order afterwards, then the view is resolved
//! against the pruned population.

use std::{num::NonZeroUsize, thread};

use crate::{ClassifierId, ClassifierSet, InstanceTable, Representation, RuleSetView, ViewEntry};

/// Scans the whole population against `instance` on the calling thread.
pub fn generate_match_set(
    population: &mut ClassifierSet,
    repr: &dyn Representation,
    table: &InstanceTable,
    instance: usize,
) -> RuleSetView {
    let mut matched: Vec<ClassifierId> = Vec::new();
    let mut doomed: Vec<usize> = Vec::new();
    for i in 0..population.len() {
        let mac = population.get_mut(i);
        if mac.classifier.match_at(repr, table, instance) {
            matched.push(mac.classifier.id());
        } else if mac.classifier.is_zero_coverage(table.len()) {
            doomed.push(i);
        }
    }
    prune(population, doomed);
    resolve(population, &matched)
}

/// Scans the population against `instance` across `workers` scoped threads.
///
/// The macro vector is partitioned into disjoint mutable chunks, one per
/// worker; each worker returns its task-local matched-id and prune-index
/// lists, merged in chunk order after the join so membership and order are
/// identical to the sequential scan.
pub fn generate_match_set_parallel(
    population: &mut ClassifierSet,
    repr: &dyn Representation,
    table: &InstanceTable,
    instance: usize,
    workers: NonZeroUsize,
) -> RuleSetView {
    let workers = workers.get().min(population.len());
    if workers <= 1 {
        return generate_match_set(population, repr, table, instance);
    }
    let chunk_size = population.len().div_ceil(workers);
    let table_len = table.len();

    let mut matched: Vec<ClassifierId> = Vec::new();
    let mut doomed: Vec<usize> = Vec::new();
    let macros = population.macros_mut();
    let chunk_results = thread::scope(|scope| {
        let handles: Vec<_> = macros
            .chunks_mut(chunk_size)
            .enumerate()
            .map(|(chunk_index, chunk)| {
                let base = chunk_index * chunk_size;
                scope.spawn(move || {
                    let mut local_matched: Vec<ClassifierId> = Vec::new();
                    let mut local_doomed: Vec<usize> = Vec::new();
                    for (offset, mac) in chunk.iter_mut().enumerate() {
                        if mac.classifier.match_at(repr, table, instance) {
                            local_matched.push(mac.classifier.id());
                        } else if mac.classifier.is_zero_coverage(table_len) {
                            local_doomed.push(base + offset);
                        }
                    }
                    (local_matched, local_doomed)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("match worker panicked"))
            .collect::<Vec<_>>()
    });
    for (local_matched, local_doomed) in chunk_results {
        matched.extend(local_matched);
        doomed.extend(local_doomed);
    }

    prune(population, doomed);
    resolve(population, &matched)
}

/// Dispatches to the parallel scan when a worker count is configured.
pub fn generate_match_set_with(
    population: &mut ClassifierSet,
    repr: &dyn Representation,
    table: &InstanceTable,
    instance: usize,
    workers: Option<NonZeroUsize>,
) -> RuleSetView {
    match workers {
        Some(workers) => generate_match_set_parallel(population, repr, table, instance, workers),
        None => generate_match_set(population, repr, table, instance),
    }
}

fn prune(population: &mut ClassifierSet, mut doomed: Vec<usize>) {
    doomed.sort_unstable_by(|a, b| b.cmp(a));
    for index in doomed {
        population.remove_macro(index);
    }
}

fn resolve(population: &ClassifierSet, matched: &[ClassifierId]) -> RuleSetView {
    let mut view = RuleSetView::default();
    for &id in matched {
        if let Some(index) = population.find(id) {
            view.push(ViewEntry {
                id,
                index,
                numerosity: population.get(index).numerosity,
            });
        }
    }
    view
}
