/// Percentile values computed over a dataset.
#[derive(Debug, Clone)]
pub struct Percentiles {
    entries: Vec<(f64, f64)>,
}

impl Percentiles {
    /// Computes the requested percentiles (nearest-rank) over `values`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rulevo_stats::percentiles::Percentiles;
    /// let values = [1.0, 2.0, 3.0, 4.0, 5.0];
    /// let percentiles = Percentiles::new(values, &[25.0, 50.0, 75.0]);
    /// assert_eq!(percentiles.get(50.0), Some(3.0));
    /// ```
    #[must_use]
    pub fn new<I>(values: I, percentiles: &[f64]) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted = values.into_iter().collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        let entries = percentiles
            .iter()
            .filter_map(|&p| Self::nearest_rank(&sorted, p).map(|v| (p, v)))
            .collect();
        Self { entries }
    }

    #[expect(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn nearest_rank(sorted: &[f64], percentile: f64) -> Option<f64> {
        if sorted.is_empty() || !(0.0..=100.0).contains(&percentile) {
            return None;
        }
        let rank = (percentile / 100.0 * sorted.len() as f64).ceil() as usize;
        Some(sorted[rank.saturating_sub(1)])
    }

    /// The value stored for `percentile`, if it was requested.
    #[must_use]
    pub fn get(&self, percentile: f64) -> Option<f64> {
        self.entries
            .iter()
            .find(|(p, _)| *p == percentile)
            .map(|(_, v)| *v)
    }

    /// All (percentile, value) pairs in request order.
    #[must_use]
    pub fn entries(&self) -> &[(f64, f64)] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_rank_percentiles() {
        let p = Percentiles::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0], &[
            25.0, 50.0, 100.0,
        ]);
        assert_eq!(p.get(25.0), Some(3.0));
        assert_eq!(p.get(50.0), Some(5.0));
        assert_eq!(p.get(100.0), Some(10.0));
        assert_eq!(p.get(75.0), None);
    }

    #[test]
    fn empty_dataset_yields_no_entries() {
        let p = Percentiles::new([], &[50.0]);
        assert!(p.entries().is_empty());
        assert_eq!(p.get(50.0), None);
    }
}
