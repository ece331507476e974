//! Steady-state genetic evolution of classifier populations: parent
//! selection, recombination and mutation operators, and subsumption-aware
//! child routing.

mod ga;
mod operators;

pub use self::{
    ga::{CHILDREN_PER_GENERATION, GaParams, SteadyStateGa},
    operators::{CrossoverOp, mutate},
};
