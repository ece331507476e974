use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use rulevo_fitness::evaluate;
use rulevo_repr::{TernaryRepresentation, load_table};

use crate::model::Model;

#[derive(Debug, Clone, Args)]
pub struct EvaluateArg {
    /// Trained model file (JSON)
    #[arg(long)]
    model: PathBuf,
    /// Dataset to evaluate against; label column count comes from the model
    #[arg(long)]
    dataset: PathBuf,
}

pub fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let mut model = Model::open(&arg.model)?;
    let table = load_table(&arg.dataset, model.labels)
        .with_context(|| format!("Failed to load dataset: {}", arg.dataset.display()))?;
    model.rebind(&table, None)?;

    let repr = TernaryRepresentation::new(model.attributes, model.labels);
    let metrics = evaluate(&model.population, &repr, &table);
    println!(
        "model: {} macros / {} micros, trained {} epochs at {}",
        model.population.len(),
        model.population.total_numerosity(),
        model.epoch,
        model.trained_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );
    println!("instances: {}", table.len());
    println!("accuracy: {:.4}", metrics.accuracy);
    println!("exact match: {:.4}", metrics.exact_match);
    println!("hamming loss: {:.4}", metrics.hamming_loss);
    Ok(())
}
