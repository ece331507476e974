use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::Utc;
use rulevo_engine::{ClassifierSet, RuleOrigin};
use rulevo_fitness::TrainHook;
use rulevo_stats::{descriptive::DescriptiveStats, percentiles::Percentiles};

/// Training hook that writes a text summary of the population into a
/// timestamped run directory, one file per reporting epoch.
#[derive(Debug)]
pub struct PopulationReportHook {
    dir: PathBuf,
}

impl PopulationReportHook {
    pub fn new(base: &Path) -> anyhow::Result<Self> {
        let dir = base.join(Utc::now().format("%Y%m%d-%H%M%S").to_string());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create report directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[expect(clippy::cast_precision_loss)]
    fn render(population: &ClassifierSet, epoch: u64) -> String {
        let mut covers = 0_usize;
        let mut ga = 0_usize;
        let mut init = 0_usize;
        let mut subsumptions = 0_u64;
        for mac in population {
            match mac.classifier.origin {
                RuleOrigin::Cover => covers += 1,
                RuleOrigin::Ga => ga += 1,
                RuleOrigin::Init => init += 1,
            }
            subsumptions += mac.subsumptions;
        }

        let mut out = String::new();
        let _ = writeln!(out, "epoch {epoch}");
        let _ = writeln!(
            out,
            "population: {} macros, {} micros",
            population.len(),
            population.total_numerosity(),
        );
        let _ = writeln!(out, "origins: cover {covers}, ga {ga}, init {init}");
        let _ = writeln!(
            out,
            "events: {} covers, {} ga invocations, {} subsumptions",
            population.covers,
            population.ga_invocations,
            subsumptions,
        );
        let _ = writeln!(
            out,
            "deletions: {} baseline, {} fitness-penalized",
            population.deletions_baseline, population.deletions_penalized,
        );

        Self::stat_line(
            &mut out,
            "niche size",
            population.iter().map(|m| m.classifier.data.ns),
        );
        Self::stat_line(
            &mut out,
            "accuracy",
            population
                .iter()
                .map(|m| m.classifier.exploitation_accuracy()),
        );
        Self::stat_line(
            &mut out,
            "experience",
            population.iter().map(|m| m.classifier.experience as f64),
        );
        Self::stat_line(
            &mut out,
            "numerosity",
            population.iter().map(|m| m.numerosity as f64),
        );

        let accuracies = population
            .iter()
            .map(|m| m.classifier.exploitation_accuracy())
            .collect::<Vec<_>>();
        let percentiles = Percentiles::new(accuracies, &[25.0, 50.0, 75.0, 90.0]);
        for (p, v) in percentiles.entries() {
            let _ = writeln!(out, "accuracy p{p:.0}: {v:.4}");
        }
        out
    }

    fn stat_line<I>(out: &mut String, name: &str, values: I)
    where
        I: IntoIterator<Item = f64>,
    {
        if let Some(stats) = DescriptiveStats::new(values) {
            let _ = writeln!(
                out,
                "{name}: mean {:.4}, median {:.4}, std {:.4}, min {:.4}, max {:.4}",
                stats.mean, stats.median, stats.std_dev, stats.min, stats.max,
            );
        }
    }
}

impl TrainHook for PopulationReportHook {
    fn on_epoch(&mut self, population: &ClassifierSet, epoch: u64) {
        let path = self.dir.join(format!("epoch-{epoch:06}.txt"));
        if let Err(err) = fs::write(&path, Self::render(population, epoch)) {
            eprintln!("Failed to write report {}: {err}", path.display());
        }
    }
}
