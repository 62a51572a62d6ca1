/// The ranks produced by a calibration run, stored as a row-major matrix.
///
/// Each row holds the ranks of one trial, one entry per ranked dimension.
/// Every rank is in `0..=num_posterior_samples`. Rows remember the index of the
/// simulation trial they came from, since failed trials may be skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankCollection {
    dim: usize,
    num_posterior_samples: usize,
    trials: Vec<usize>,
    values: Vec<usize>,
}

impl RankCollection {
    /// Creates an empty collection for `dim` ranked dimensions.
    #[must_use]
    pub fn new(dim: usize, num_posterior_samples: usize) -> Self {
        Self {
            dim,
            num_posterior_samples,
            trials: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Builds a collection from rows of ranks, numbering trials `0..rows.len()`.
    ///
    /// Returns `None` if rows differ in length, are zero-dimensional, or any
    /// rank exceeds `num_posterior_samples`.
    #[must_use]
    pub fn from_rows(rows: &[Vec<usize>], num_posterior_samples: usize) -> Option<Self> {
        let dim = rows.first().map_or(0, Vec::len);
        if dim == 0 {
            return None;
        }
        let mut collection = Self::new(dim, num_posterior_samples);
        for (trial, row) in rows.iter().enumerate() {
            if row.len() != dim || row.iter().any(|&r| r > num_posterior_samples) {
                return None;
            }
            collection.push(trial, row);
        }
        Some(collection)
    }

    /// Appends the ranks of one trial.
    ///
    /// # Panics
    ///
    /// Panics if `ranks` does not have `dim` entries or a rank exceeds the
    /// number of posterior samples.
    pub fn push(&mut self, trial: usize, ranks: &[usize]) {
        assert_eq!(ranks.len(), self.dim, "rank row has wrong dimension");
        assert!(
            ranks.iter().all(|&r| r <= self.num_posterior_samples),
            "rank exceeds number of posterior samples"
        );
        self.trials.push(trial);
        self.values.extend_from_slice(ranks);
    }

    /// Returns the number of ranked dimensions.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns the number of posterior samples each rank was computed from.
    #[must_use]
    pub fn num_posterior_samples(&self) -> usize {
        self.num_posterior_samples
    }

    /// Returns the number of ranked trials (rows).
    #[must_use]
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    /// Returns `true` if no trial has been ranked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Returns the simulation trial index of each row.
    #[must_use]
    pub fn trials(&self) -> &[usize] {
        &self.trials
    }

    /// Returns the ranks of row `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    #[must_use]
    pub fn row(&self, row: usize) -> &[usize] {
        &self.values[row * self.dim..(row + 1) * self.dim]
    }

    /// Iterates over rows.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[usize]> + '_ {
        self.values.chunks_exact(self.dim.max(1)).take(self.len())
    }

    /// Iterates over the ranks of dimension `dim`, one per row.
    ///
    /// # Panics
    ///
    /// Panics if `dim` is out of bounds.
    pub fn column(&self, dim: usize) -> impl ExactSizeIterator<Item = usize> + '_ {
        assert!(dim < self.dim, "dimension {dim} out of bounds");
        self.rows().map(move |row| row[dim])
    }

    /// Returns the ranks of dimension `dim` normalized to `[0, 1]` by the
    /// number of posterior samples.
    ///
    /// # Panics
    ///
    /// Panics if `dim` is out of bounds.
    #[must_use]
    pub fn normalized_column(&self, dim: usize) -> Vec<f64> {
        let m = self.num_posterior_samples.max(1) as f64;
        self.column(dim).map(|r| r as f64 / m).collect()
    }

    /// Returns how many distinct rank values fall into each of `num_bins`
    /// contiguous bins covering `0..=num_posterior_samples`.
    ///
    /// Rank `k` belongs to bin `k * num_bins / (M + 1)`, so bin widths differ
    /// by at most one when `num_bins` does not divide `M + 1`.
    ///
    /// # Panics
    ///
    /// Panics if `num_bins` is zero or exceeds `M + 1`.
    #[must_use]
    pub fn bin_widths(&self, num_bins: usize) -> Vec<usize> {
        let values = self.num_posterior_samples + 1;
        assert!(
            num_bins > 0 && num_bins <= values,
            "num_bins must be in 1..={values}"
        );
        let mut widths = vec![0; num_bins];
        for k in 0..values {
            widths[k * num_bins / values] += 1;
        }
        widths
    }

    /// Counts the ranks of dimension `dim` in `num_bins` contiguous bins.
    ///
    /// See [`bin_widths`][Self::bin_widths] for how ranks map to bins.
    ///
    /// # Panics
    ///
    /// Panics if `dim` is out of bounds, or `num_bins` is zero or exceeds
    /// `M + 1`.
    #[must_use]
    pub fn histogram(&self, dim: usize, num_bins: usize) -> Vec<usize> {
        let values = self.num_posterior_samples + 1;
        assert!(
            num_bins > 0 && num_bins <= values,
            "num_bins must be in 1..={values}"
        );
        let mut counts = vec![0; num_bins];
        for rank in self.column(dim) {
            counts[rank * num_bins / values] += 1;
        }
        counts
    }

    /// Returns the mean rank of each dimension, or NaN when empty.
    #[must_use]
    pub fn mean_ranks(&self) -> Vec<f64> {
        let n = self.len() as f64;
        (0..self.dim)
            .map(|d| self.column(d).sum::<usize>() as f64 / n)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn sample() -> RankCollection {
        RankCollection::from_rows(&[vec![0, 10], vec![5, 2], vec![10, 7]], 10).expect("valid rows")
    }

    #[test]
    fn stores_rows_and_columns() {
        let ranks = sample();

        assert_eq!(ranks.len(), 3);
        assert_eq!(ranks.dim(), 2);
        assert_eq!(ranks.row(1), &[5, 2]);
        assert_eq!(ranks.column(1).collect::<Vec<_>>(), vec![10, 2, 7]);
        assert_eq!(ranks.trials(), &[0, 1, 2]);
    }

    #[test]
    fn normalizes_and_averages() {
        let ranks = sample();

        assert_eq!(ranks.normalized_column(0), vec![0.0, 0.5, 1.0]);
        let means = ranks.mean_ranks();
        assert_relative_eq!(means[0], 5.0);
        assert_relative_eq!(means[1], 19.0 / 3.0);
    }

    #[test]
    fn histogram_bins_cover_every_rank() {
        let ranks = sample();

        // 11 rank values in 3 bins: {0..=3}, {4..=7}, {8..=10}.
        assert_eq!(ranks.bin_widths(3), vec![4, 4, 3]);
        assert_eq!(ranks.histogram(0, 3), vec![1, 1, 1]);
        assert_eq!(ranks.histogram(1, 3), vec![1, 1, 1]);
        assert_eq!(ranks.histogram(1, 11).iter().sum::<usize>(), 3);
    }

    #[test]
    #[should_panic(expected = "num_bins")]
    fn histogram_rejects_more_bins_than_rank_values() {
        let _ = sample().histogram(0, 12);
    }

    #[test]
    fn from_rows_rejects_out_of_range_ranks() {
        assert!(RankCollection::from_rows(&[vec![11]], 10).is_none());
        assert!(RankCollection::from_rows(&[vec![1, 2], vec![3]], 10).is_none());
        assert!(RankCollection::from_rows(&[], 10).is_none());
    }

    #[test]
    fn push_keeps_trial_indices() {
        let mut ranks = RankCollection::new(1, 4);
        ranks.push(0, &[1]);
        ranks.push(3, &[4]);

        assert_eq!(ranks.trials(), &[0, 3]);
        assert_eq!(ranks.rows().count(), 2);
    }

    #[test]
    #[should_panic(expected = "rank exceeds")]
    fn push_rejects_rank_above_sample_count() {
        let mut ranks = RankCollection::new(1, 4);
        ranks.push(0, &[5]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_to_json() {
        let ranks = sample();
        let json = serde_json::to_string(&ranks).expect("serializable");
        let back: RankCollection = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(back, ranks);
    }
}
