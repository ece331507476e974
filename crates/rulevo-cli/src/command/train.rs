use std::{collections::HashSet, num::NonZeroUsize, path::PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::Args;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use rulevo_engine::{
    Classifier, ClassifierSet, FixedSizeRouletteDeletion, InstanceTable, Macroclassifier,
    Representation, RuleOrigin,
};
use rulevo_evolve::{CrossoverOp, GaParams, SteadyStateGa};
use rulevo_fitness::{
    FitnessMode, TrainHook, Trainer, TrainerConfig, UpdateParams, evaluate,
};
use rulevo_repr::{TernaryRepresentation, load_table};

use crate::{model::Model, report::PopulationReportHook};

#[derive(Debug, Clone, Args)]
pub struct TrainArg {
    /// Dataset file: one instance per line, attributes followed by labels
    #[arg(long)]
    dataset: PathBuf,
    /// Number of trailing label columns in the dataset
    #[arg(long)]
    labels: usize,
    /// Evolving epochs over the dataset
    #[arg(long, default_value_t = 500)]
    iterations: usize,
    /// Micro-classifier population ceiling
    #[arg(long, default_value_t = 1500)]
    population_size: u64,
    /// Fitness mode: simple, complex, or sharing
    #[arg(long, default_value = "sharing")]
    fitness: FitnessMode,
    /// RNG seed; drawn at random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Worker threads for the match-set scan
    #[arg(long)]
    workers: Option<NonZeroUsize>,
    /// Epochs between progress reports; 0 disables them
    #[arg(long, default_value_t = 100)]
    hook_rate: usize,
    /// Check the whole population for a subsumer on every insertion
    #[arg(long)]
    thorough_add: bool,
    /// Seed the population with one covered rule per label combination
    #[arg(long)]
    seed_rules: bool,
    /// Probability of recombining when the parents differ
    #[arg(long, default_value_t = 0.8)]
    crossover_rate: f64,
    /// Per-bit flip probability applied to every child
    #[arg(long, default_value_t = 0.04)]
    mutation_rate: f64,
    /// Minimum GA ticks before a correct set is evolved again
    #[arg(long, default_value_t = 100)]
    activation_age: u64,
    /// Use two-point crossover instead of single-point
    #[arg(long)]
    two_point: bool,
    /// Model output file; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
    /// Directory for per-epoch population reports
    #[arg(long)]
    report_dir: Option<PathBuf>,
}

pub fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let table = load_table(&arg.dataset, arg.labels)
        .with_context(|| format!("Failed to load dataset: {}", arg.dataset.display()))?;
    let attributes = table.attributes();
    eprintln!(
        "Loaded {} instances ({} attributes, {} labels)",
        table.len(),
        attributes,
        arg.labels,
    );

    let repr = TernaryRepresentation::new(attributes, arg.labels);
    let seed = arg.seed.unwrap_or_else(rand::random);
    let mut rng = Pcg64Mcg::seed_from_u64(seed);

    let mut population = ClassifierSet::new(Some(Box::new(FixedSizeRouletteDeletion::new(
        arg.population_size,
    ))));
    if arg.seed_rules {
        let seeded = seed_population(&mut population, &repr, &table, &mut rng);
        eprintln!("Seeded {seeded} rules, one per label combination");
    }

    let params = UpdateParams {
        mode: arg.fitness,
        ..UpdateParams::default()
    };
    let mut config = TrainerConfig::new(arg.iterations);
    config.hook_rate = arg.hook_rate;
    config.workers = arg.workers;
    config.thorough_add = arg.thorough_add;

    let mut ga = SteadyStateGa::new(GaParams {
        crossover_rate: arg.crossover_rate,
        mutation_rate: arg.mutation_rate,
        activation_age: arg.activation_age,
        crossover: if arg.two_point {
            CrossoverOp::TwoPoint
        } else {
            CrossoverOp::SinglePoint
        },
    });

    eprintln!(
        "Training for {} epochs (+{} calibration) with seed {seed}",
        config.iterations, config.calibration,
    );
    let mut trainer = Trainer::new(params, config, &repr, &table);
    let mut progress = Progress {
        repr: &repr,
        table: &table,
    };
    let mut report = match &arg.report_dir {
        Some(dir) => {
            let hook = PopulationReportHook::new(dir)?;
            eprintln!("Writing reports to {}", hook.dir().display());
            Some(hook)
        }
        None => None,
    };
    let mut hooks: Vec<&mut dyn TrainHook> = vec![&mut progress];
    if let Some(report) = &mut report {
        hooks.push(report);
    }
    trainer.train(&mut population, &mut ga, &mut rng, &mut hooks);

    let metrics = evaluate(&population, &repr, &table);
    eprintln!(
        "Final: {} macros / {} micros, accuracy {:.4}, exact match {:.4}, hamming loss {:.4}",
        population.len(),
        population.total_numerosity(),
        metrics.accuracy,
        metrics.exact_match,
        metrics.hamming_loss,
    );

    let model = Model {
        trained_at: Utc::now(),
        seed,
        attributes,
        labels: arg.labels,
        instances: table.len(),
        max_numerosity: arg.population_size,
        epoch: trainer.epoch(),
        update: params,
        ga,
        population,
    };
    model.save(arg.output.as_deref())?;
    if let Some(path) = &arg.output {
        eprintln!("Model saved to {}", path.display());
    }
    Ok(())
}

/// Covers one rule per distinct label combination in the table, so every
/// labeling the dataset exhibits starts with at least one advocate.
fn seed_population(
    population: &mut ClassifierSet,
    repr: &TernaryRepresentation,
    table: &InstanceTable,
    rng: &mut dyn RngCore,
) -> usize {
    let mut seen: HashSet<Vec<bool>> = HashSet::new();
    let mut seeded = 0;
    for instance in 0..table.len() {
        let combination = table
            .labels_of(instance)
            .iter()
            .map(|&v| v > 0.5)
            .collect::<Vec<_>>();
        if !seen.insert(combination) {
            continue;
        }
        let chromosome = repr.cover(table.row(instance), rng);
        let rule = Classifier::new(chromosome, table.labels(), RuleOrigin::Init, 0);
        population.append(Macroclassifier::new(rule));
        seeded += 1;
    }
    seeded
}

struct Progress<'a> {
    repr: &'a TernaryRepresentation,
    table: &'a InstanceTable,
}

impl TrainHook for Progress<'_> {
    fn on_epoch(&mut self, population: &ClassifierSet, epoch: u64) {
        let metrics = evaluate(population, self.repr, self.table);
        eprintln!(
            "epoch {epoch}: {} macros / {} micros, accuracy {:.4}",
            population.len(),
            population.total_numerosity(),
            metrics.accuracy,
        );
    }
}
