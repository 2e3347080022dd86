//! Count-by-distance histogram.
//!
//! An `OccurrenceHistogram` is an ordered list of counts where index 0 is the
//! nearest position. It is used for word lengths, distances from the start
//! and end of a word, and for the per-distance tallies inside a character's
//! correlation table.
//!
//! # Growth
//!
//! Incrementing a distance beyond the current length grows the histogram,
//! zero-filling every slot in between:
//! ```rust
//! use garbler::OccurrenceHistogram;
//!
//! let mut histogram = OccurrenceHistogram::new();
//! histogram.increment_by(3, 2);
//! assert_eq!(histogram.len(), 4);
//! assert_eq!(histogram.get(3), 2);
//! assert_eq!(histogram.get(1), 0);
//! ```

/// Ordered sequence of non-negative counts indexed by distance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccurrenceHistogram {
    counts: Vec<u64>,
}

impl OccurrenceHistogram {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self { counts: Vec::new() }
    }

    /// Add one occurrence at `distance`.
    pub fn increment(&mut self, distance: usize) {
        self.increment_by(distance, 1);
    }

    /// Add `amount` occurrences at `distance`, growing the histogram to
    /// `distance + 1` slots if needed.
    pub fn increment_by(&mut self, distance: usize, amount: u64) {
        if distance >= self.counts.len() {
            self.counts.resize(distance + 1, 0);
        }
        self.counts[distance] += amount;
    }

    /// Count at `distance`. Distances past the end read as 0 and do not grow
    /// the histogram.
    pub fn get(&self, distance: usize) -> u64 {
        self.counts.get(distance).copied().unwrap_or(0)
    }

    /// Elementwise sum of `other` into `self`.
    ///
    /// The result is at least as long as the longer of the two.
    pub fn add_all(&mut self, other: &OccurrenceHistogram) {
        if other.counts.len() > self.counts.len() {
            self.counts.resize(other.counts.len(), 0);
        }
        for (slot, &count) in self.counts.iter_mut().zip(other.counts.iter()) {
            *slot += count;
        }
    }

    /// Number of slots currently held.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Drop trailing zero slots so the last slot (if any) is non-zero.
    pub fn trim_trailing_zeros(&mut self) {
        while self.counts.last() == Some(&0) {
            self.counts.pop();
        }
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    /// Sum of every slot.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.counts.iter().copied()
    }
}

impl From<Vec<u64>> for OccurrenceHistogram {
    fn from(counts: Vec<u64>) -> Self {
        Self { counts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_grows_and_zero_fills() {
        let mut histogram = OccurrenceHistogram::new();
        histogram.increment_by(4, 3);

        assert_eq!(histogram.len(), 5);
        assert_eq!(histogram.get(4), 3);
        for distance in 0..4 {
            assert_eq!(histogram.get(distance), 0);
        }
    }

    #[test]
    fn test_get_beyond_range_does_not_grow() {
        let mut histogram = OccurrenceHistogram::new();
        histogram.increment(1);

        assert_eq!(histogram.get(10), 0);
        assert_eq!(histogram.len(), 2);
    }

    #[test]
    fn test_increment_within_range_keeps_length() {
        let mut histogram = OccurrenceHistogram::new();
        histogram.increment(3);
        histogram.increment(0);
        histogram.increment(0);

        assert_eq!(histogram.len(), 4);
        assert_eq!(histogram.counts(), &[2, 0, 0, 1]);
        assert_eq!(histogram.total(), 3);
    }

    #[test]
    fn test_add_all_extends_shorter() {
        let mut short = OccurrenceHistogram::from(vec![1, 2]);
        let long = OccurrenceHistogram::from(vec![1, 1, 1, 5]);

        short.add_all(&long);
        assert_eq!(short.counts(), &[2, 3, 1, 5]);

        let mut long = OccurrenceHistogram::from(vec![1, 1, 1, 5]);
        long.add_all(&OccurrenceHistogram::from(vec![4]));
        assert_eq!(long.counts(), &[5, 1, 1, 5]);
    }

    #[test]
    fn test_trim_trailing_zeros() {
        let mut histogram = OccurrenceHistogram::from(vec![0, 2, 0, 0]);
        histogram.trim_trailing_zeros();
        assert_eq!(histogram.counts(), &[0, 2]);

        let mut zeros = OccurrenceHistogram::from(vec![0, 0]);
        zeros.trim_trailing_zeros();
        assert!(zeros.is_empty());
    }
}
