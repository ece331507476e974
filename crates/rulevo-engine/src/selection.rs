//! Roulette-wheel selection over weight slices.

use rand::Rng;

fn sanitized(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

/// Draws an index with probability proportional to its weight.
///
/// Non-finite and non-positive weights count as zero. Returns `None` when
/// no weight is positive; callers fall back to a uniform draw.
pub fn roulette<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let total: f64 = weights.iter().copied().map(sanitized).sum();
    if total <= 0.0 {
        return None;
    }
    let mut remaining = rng.random_range(0.0..total);
    for (i, &w) in weights.iter().enumerate() {
        let w = sanitized(w);
        if remaining < w {
            return Some(i);
        }
        remaining -= w;
    }
    // Floating-point shortfall: land on the last positive slot.
    weights.iter().rposition(|&w| sanitized(w) > 0.0)
}
