//! The update strategy of the rule-learning engine: correct-set formation,
//! the three fitness modes, covering, the per-instance training step and
//! epoch loop, and vote-based classification metrics.

mod classification;
mod correct_set;
mod params;
mod training;
mod update;

pub use self::{
    classification::{EvaluationMetrics, classify, evaluate},
    correct_set::{LabelCorrectSet, generate_correct_sets},
    params::{FitnessMode, UpdateParams},
    training::{TrainHook, Trainer, TrainerConfig},
    update::apply as apply_update,
};
