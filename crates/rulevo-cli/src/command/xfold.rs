use std::{num::NonZeroUsize, path::PathBuf, thread};

use anyhow::{Context, ensure};
use clap::Args;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use rulevo_engine::{ClassifierSet, FixedSizeRouletteDeletion, InstanceTable};
use rulevo_evolve::{GaParams, SteadyStateGa};
use rulevo_fitness::{
    EvaluationMetrics, FitnessMode, Trainer, TrainerConfig, UpdateParams, evaluate,
};
use rulevo_repr::{TernaryRepresentation, load_table};

#[derive(Debug, Clone, Args)]
pub struct XfoldArg {
    /// Dataset file: one instance per line, attributes followed by labels
    #[arg(long)]
    dataset: PathBuf,
    /// Number of trailing label columns in the dataset
    #[arg(long)]
    labels: usize,
    /// Number of folds
    #[arg(long, default_value_t = 10)]
    folds: usize,
    /// Evolving epochs per fold
    #[arg(long, default_value_t = 500)]
    iterations: usize,
    /// Micro-classifier population ceiling per fold
    #[arg(long, default_value_t = 1500)]
    population_size: u64,
    /// Fitness mode: simple, complex, or sharing
    #[arg(long, default_value = "sharing")]
    fitness: FitnessMode,
    /// RNG seed; each fold derives its own from it
    #[arg(long)]
    seed: Option<u64>,
    /// Worker threads for the match-set scan within each fold
    #[arg(long)]
    workers: Option<NonZeroUsize>,
}

pub fn run(arg: &XfoldArg) -> anyhow::Result<()> {
    let table = load_table(&arg.dataset, arg.labels)
        .with_context(|| format!("Failed to load dataset: {}", arg.dataset.display()))?;
    ensure!(arg.folds >= 2, "need at least 2 folds");
    ensure!(
        arg.folds <= table.len(),
        "cannot cut {} instances into {} folds",
        table.len(),
        arg.folds,
    );

    let seed = arg.seed.unwrap_or_else(rand::random);
    let repr = TernaryRepresentation::new(table.attributes(), arg.labels);
    eprintln!(
        "Cross-validating {} instances over {} folds with seed {seed}",
        table.len(),
        arg.folds,
    );

    // One engine per fold, trained concurrently; folds share nothing but
    // the immutable table and representation.
    let fold_metrics = thread::scope(|scope| {
        let handles = (0..arg.folds)
            .map(|fold| {
                let table = &table;
                let repr = &repr;
                scope.spawn(move || {
                    let (train_table, test_table) = split_fold(table, arg.folds, fold);
                    let mut rng = Pcg64Mcg::seed_from_u64(seed.wrapping_add(fold as u64));
                    let mut population = ClassifierSet::new(Some(Box::new(
                        FixedSizeRouletteDeletion::new(arg.population_size),
                    )));
                    let params = UpdateParams {
                        mode: arg.fitness,
                        ..UpdateParams::default()
                    };
                    let mut config = TrainerConfig::new(arg.iterations);
                    config.hook_rate = 0;
                    config.workers = arg.workers;
                    let mut ga = SteadyStateGa::new(GaParams::default());
                    let mut trainer = Trainer::new(params, config, repr, &train_table);
                    trainer.train(&mut population, &mut ga, &mut rng, &mut []);
                    evaluate(&population, repr, &test_table)
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("fold worker panicked"))
            .collect::<Vec<_>>()
    });

    for (fold, metrics) in fold_metrics.iter().enumerate() {
        println!(
            "fold {fold}: accuracy {:.4}, exact match {:.4}, hamming loss {:.4}",
            metrics.accuracy, metrics.exact_match, metrics.hamming_loss,
        );
    }
    let mean = mean_metrics(&fold_metrics);
    println!(
        "mean: accuracy {:.4}, exact match {:.4}, hamming loss {:.4}",
        mean.accuracy, mean.exact_match, mean.hamming_loss,
    );
    Ok(())
}

/// Round-robin split: instance `i` lands in the test set of fold
/// `i % folds` and in the training set of every other fold.
fn split_fold(table: &InstanceTable, folds: usize, fold: usize) -> (InstanceTable, InstanceTable) {
    let mut train = Vec::new();
    let mut test = Vec::new();
    for i in 0..table.len() {
        if i % folds == fold {
            test.extend_from_slice(table.row(i));
        } else {
            train.extend_from_slice(table.row(i));
        }
    }
    (
        InstanceTable::new(train, table.attributes(), table.labels()),
        InstanceTable::new(test, table.attributes(), table.labels()),
    )
}

#[expect(clippy::cast_precision_loss)]
fn mean_metrics(folds: &[EvaluationMetrics]) -> EvaluationMetrics {
    let n = folds.len().max(1) as f64;
    EvaluationMetrics {
        accuracy: folds.iter().map(|m| m.accuracy).sum::<f64>() / n,
        exact_match: folds.iter().map(|m| m.exact_match).sum::<f64>() / n,
        hamming_loss: folds.iter().map(|m| m.hamming_loss).sum::<f64>() / n,
    }
}
