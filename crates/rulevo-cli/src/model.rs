use std::path::Path;

use anyhow::ensure;
use chrono::{DateTime, Utc};
use rulevo_engine::{ClassifierSet, InstanceTable, PopulationControl};
use rulevo_evolve::SteadyStateGa;
use rulevo_fitness::UpdateParams;
use serde::{Deserialize, Serialize};

use crate::util;

/// A trained run persisted as JSON: the population with all of its update
/// state, plus everything needed to resume or evaluate it.
#[derive(Debug, Serialize, Deserialize)]
pub struct Model {
    pub trained_at: DateTime<Utc>,
    pub seed: u64,
    pub attributes: usize,
    pub labels: usize,
    /// Length of the training table; match caches are only valid against a
    /// table of the same length.
    pub instances: usize,
    pub max_numerosity: u64,
    pub epoch: u64,
    pub update: UpdateParams,
    pub ga: SteadyStateGa,
    pub population: ClassifierSet,
}

impl Model {
    pub fn open<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        util::read_json_file("model", path)
    }

    pub fn save(&self, path: Option<&Path>) -> anyhow::Result<()> {
        util::save_json(self, path)
    }

    /// Makes the deserialized population usable against `table`.
    ///
    /// Rebuilds the id index, reserves the loaded serials, and reattaches
    /// the control strategy. Match caches are kept only when `table` has
    /// the same length as the training table, since cached entries are
    /// indexed by instance.
    pub fn rebind(
        &mut self,
        table: &InstanceTable,
        control: Option<Box<dyn PopulationControl>>,
    ) -> anyhow::Result<()> {
        ensure!(
            table.labels() == self.labels,
            "model was trained with {} labels but the dataset has {}",
            self.labels,
            table.labels(),
        );
        ensure!(
            table.attributes() == self.attributes,
            "model was trained with {} attributes but the dataset has {}",
            self.attributes,
            table.attributes(),
        );
        self.population.rebind(control);
        if table.len() != self.instances {
            self.population.clear_match_caches();
        }
        Ok(())
    }
}
