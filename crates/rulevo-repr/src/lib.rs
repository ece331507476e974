//! Concrete rule encoding and dataset ingestion for the rule-learning
//! engine.

mod dataset;
mod ternary;

pub use self::{
    dataset::{DatasetError, load_table, parse_table},
    ternary::TernaryRepresentation,
};
