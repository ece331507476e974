//! Core population machinery for an evolutionary rule-learning engine:
//! classifiers and their update state, the macroclassifier population with
//! numerosity bookkeeping, cached match-set formation (sequential and
//! parallel), roulette selection, and the fixed-size deletion policy.
//!
//! Rule semantics live behind the [`Representation`] trait; the update
//! strategy and genetic algorithm plug in through [`GaStrategy`] and
//! [`PopulationControl`].

mod chromosome;
mod classifier;
mod control;
mod evolution;
mod instances;
pub mod matching;
mod representation;
pub mod selection;
mod set;
#[cfg(test)]
mod test_support;

pub use self::{
    chromosome::Chromosome,
    classifier::{
        Classifier, ClassifierId, EXPLORATION_EXPERIENCE_GATE, LabelData, Macroclassifier,
        MatchState, PressureSource, RuleOrigin, UpdateData,
    },
    control::{FixedSizeRouletteDeletion, PopulationControl, PressureParams},
    evolution::{Evolution, GaStrategy},
    instances::InstanceTable,
    representation::{LabelVote, Representation},
    set::{ClassifierSet, RuleSetView, ViewEntry},
};
