//! Row-indexed training data shared by matching and fitness updates.

use serde::{Deserialize, Serialize};

/// Owned 2-D `f64` table with `attributes + labels` columns per row.
///
/// Rows are addressed by index everywhere in the engine; match caches are
/// keyed by these indices, so a table must not be reordered while a
/// population trained against it is alive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceTable {
    values: Vec<f64>,
    attributes: usize,
    labels: usize,
}

impl InstanceTable {
    /// Builds a table from row-major `values`.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` is not a multiple of `attributes + labels`.
    #[must_use]
    pub fn new(values: Vec<f64>, attributes: usize, labels: usize) -> Self {
        let columns = attributes + labels;
        assert!(columns > 0);
        assert_eq!(values.len() % columns, 0, "ragged instance data");
        Self {
            values,
            attributes,
            labels,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len() / self.columns()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn columns(&self) -> usize {
        self.attributes + self.labels
    }

    #[must_use]
    pub fn attributes(&self) -> usize {
        self.attributes
    }

    #[must_use]
    pub fn labels(&self) -> usize {
        self.labels
    }

    /// Full row `index`, attributes first, then labels.
    #[must_use]
    pub fn row(&self, index: usize) -> &[f64] {
        let cols = self.columns();
        &self.values[index * cols..(index + 1) * cols]
    }

    /// Attribute slice of row `index`.
    #[must_use]
    pub fn attributes_of(&self, index: usize) -> &[f64] {
        &self.row(index)[..self.attributes]
    }

    /// Label slice of row `index`.
    #[must_use]
    pub fn labels_of(&self, index: usize) -> &[f64] {
        &self.row(index)[self.attributes..]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.columns())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_slicing() {
        let t = InstanceTable::new(vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0], 2, 1);
        assert_eq!(t.len(), 2);
        assert_eq!(t.row(1), &[0.0, 1.0, 0.0]);
        assert_eq!(t.attributes_of(0), &[1.0, 0.0]);
        assert_eq!(t.labels_of(0), &[1.0]);
        assert_eq!(t.rows().count(), 2);
    }

    #[test]
    #[should_panic(expected = "ragged")]
    fn ragged_data_is_rejected() {
        let _ = InstanceTable::new(vec![1.0, 0.0, 1.0, 0.0, 1.0], 2, 1);
    }
}
