//! Bit-level recombination and mutation operators.

use rand::Rng;
use rulevo_engine::Chromosome;
use serde::{Deserialize, Serialize};

/// Which recombination operator a GA run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CrossoverOp {
    #[default]
    SinglePoint,
    TwoPoint,
}

impl CrossoverOp {
    /// Recombines two parents, drawing cut points from `[0, span)`.
    ///
    /// `span` bounds the cuts to the bits eligible for recombination (the
    /// condition plus the consequent under evolution); bits past the last
    /// cut come from `suffix`.
    pub fn recombine<R: Rng + ?Sized>(
        self,
        prefix: &Chromosome,
        suffix: &Chromosome,
        span: usize,
        rng: &mut R,
    ) -> Chromosome {
        match self {
            Self::SinglePoint => {
                let cut = rng.random_range(0..span);
                Chromosome::spliced(prefix, suffix, cut)
            }
            Self::TwoPoint => {
                let a = rng.random_range(0..span);
                let b = rng.random_range(0..span);
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                // prefix[0, lo) + suffix[lo, hi) + prefix[hi, ..).
                let outer = Chromosome::spliced(prefix, suffix, lo);
                Chromosome::spliced(&outer, prefix, hi)
            }
        }
    }
}

/// Flips every bit independently with probability `rate`.
pub fn mutate<R: Rng + ?Sized>(chromosome: &mut Chromosome, rate: f64, rng: &mut R) {
    for i in 0..chromosome.len() {
        if rng.random_bool(rate) {
            chromosome.flip(i);
        }
    }
}
