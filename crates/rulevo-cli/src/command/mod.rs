use clap::{Parser, Subcommand};

use self::{evaluate::EvaluateArg, train::TrainArg, xfold::XfoldArg};

mod evaluate;
mod train;
mod xfold;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Train a rule population on a dataset
    Train(#[clap(flatten)] TrainArg),
    /// Evaluate a saved model against a dataset
    Evaluate(#[clap(flatten)] EvaluateArg),
    /// Cross-validate by training one model per fold
    Xfold(#[clap(flatten)] XfoldArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Evaluate(arg) => evaluate::run(&arg)?,
        Mode::Xfold(arg) => xfold::run(&arg)?,
    }
    Ok(())
}
