//! Per-character occurrence, position and correlation statistics.
//!
//! One `CharacterStats` exists for every distinct character the model has
//! seen. It records:
//! - how many times the character appeared
//! - its distance from the start and from the end of each word
//! - for every character that followed it later in the same word, how far
//!   away that character was (the correlation table)
//!
//! Correlations are directional. Ingesting `"ab"` records `'a'` → `'b'` at
//! distance 1, and nothing for `'b'` since no character follows it.
//! A distance `d` is stored at index `d - 1` of the correlation histogram.

use crate::char_map::CharacterMap;
use crate::error::{Error, Result};
use crate::histogram::OccurrenceHistogram;

/// Statistics for a single character.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterStats {
    character: char,
    occurrences: u64,
    start_distances: OccurrenceHistogram,
    end_distances: OccurrenceHistogram,
    /// Other character → distances at which it followed this one.
    correlations: CharacterMap<OccurrenceHistogram>,
}

impl CharacterStats {
    /// Create empty, case-sensitive statistics for `character`.
    pub fn new(character: char) -> Self {
        Self {
            character,
            occurrences: 0,
            start_distances: OccurrenceHistogram::new(),
            end_distances: OccurrenceHistogram::new(),
            correlations: CharacterMap::histograms(true),
        }
    }

    pub fn character(&self) -> char {
        self.character
    }

    /// Set the case sensitivity of the correlation table, compacting it when
    /// case is ignored.
    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        self.correlations.set_case_sensitive(case_sensitive);
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.correlations.is_case_sensitive()
    }

    /// Every character this one has been correlated with.
    pub fn alphabet(&self) -> impl Iterator<Item = char> + '_ {
        self.correlations.keys()
    }

    pub fn add_instance(&mut self) {
        self.occurrences += 1;
    }

    pub fn add_position_from_start(&mut self, distance: usize) {
        self.start_distances.increment(distance);
    }

    pub fn add_position_from_end(&mut self, distance: usize) {
        self.end_distances.increment(distance);
    }

    /// Record that `other` followed this character `distance_to` positions
    /// later in a word.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if `distance_to` is 0.
    pub fn add_character_correlation(&mut self, other: char, distance_to: usize) -> Result<()> {
        if distance_to < 1 {
            return Err(Error::invalid(format!(
                "correlation distance from '{}' to '{}' must be at least 1",
                self.character, other
            )));
        }
        self.correlations
            .get_or_insert_with(other, OccurrenceHistogram::new)
            .increment(distance_to - 1);
        Ok(())
    }

    /// Record the occurrence of this character at `index` in `word`.
    ///
    /// Updates the occurrence count, both position histograms, and adds a
    /// correlation for every character after `index`.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if `index` is outside `word`.
    pub fn add_word(&mut self, word: &[char], index: usize) -> Result<()> {
        if index >= word.len() {
            return Err(Error::invalid(format!(
                "index {} is outside a word of length {}",
                index,
                word.len()
            )));
        }

        self.add_instance();
        self.add_position_from_start(index);
        self.add_position_from_end(word.len() - 1 - index);

        for (other_index, &other) in word.iter().enumerate().skip(index + 1) {
            self.add_character_correlation(other, other_index - index)?;
        }
        Ok(())
    }

    /// Total number of times this character has been seen.
    pub fn count(&self) -> u64 {
        self.occurrences
    }

    pub fn distances_from_start(&self) -> &OccurrenceHistogram {
        &self.start_distances
    }

    pub fn distances_from_end(&self) -> &OccurrenceHistogram {
        &self.end_distances
    }

    /// Distances at which `other` has followed this character, if ever.
    pub fn correlations(&self, other: char) -> Option<&OccurrenceHistogram> {
        self.correlations.get(other)
    }

    pub fn all_correlations(&self) -> &CharacterMap<OccurrenceHistogram> {
        &self.correlations
    }

    /// Counts at `position` for every correlated character with a non-zero
    /// count there.
    ///
    /// `position` is a histogram index, so these are the characters that
    /// followed this one exactly `position + 1` steps later.
    pub fn correlations_at_index(&self, position: usize) -> CharacterMap<u64> {
        let mut evidence = CharacterMap::summing(self.correlations.is_case_sensitive());
        for (other, histogram) in self.correlations.iter() {
            let count = histogram.get(position);
            if count > 0 {
                evidence.put(other, count);
            }
        }
        evidence
    }

    /// Clear the correlation histogram for `other`, keeping its entry.
    pub fn reset_character(&mut self, other: char) {
        if let Some(histogram) = self.correlations.get_mut(other) {
            histogram.clear();
        }
    }

    /// Remove `other` from the correlation table entirely.
    pub fn forget(&mut self, other: char) -> Option<OccurrenceHistogram> {
        self.correlations.remove(other)
    }

    /// Drop every statistic.
    pub fn reset(&mut self) {
        self.occurrences = 0;
        self.start_distances.clear();
        self.end_distances.clear();
        self.correlations.clear();
    }

    /// Make an empty correlation entry for `other` if none exists.
    pub fn prepare(&mut self, other: char) {
        self.correlations
            .get_or_insert_with(other, OccurrenceHistogram::new);
    }

    /// Re-fold correlation keys and drop trailing empty slots.
    pub fn collapse(&mut self) {
        self.correlations.compact();
        for histogram in self.correlations.values_mut() {
            histogram.trim_trailing_zeros();
        }
        self.start_distances.trim_trailing_zeros();
        self.end_distances.trim_trailing_zeros();
    }

    /// Union `other` into this one.
    ///
    /// Occurrence counts and position histograms are summed, correlation
    /// tables are merged entry by entry. If `other` is case-sensitive the
    /// merged table becomes case-sensitive too.
    pub fn add_all(&mut self, other: &CharacterStats) {
        self.correlations.add_all(&other.correlations);
        if other.is_case_sensitive() {
            self.correlations.set_case_sensitive(true);
        }

        self.start_distances.add_all(&other.start_distances);
        self.end_distances.add_all(&other.end_distances);
        self.occurrences += other.occurrences;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(word: &str) -> Vec<char> {
        word.chars().collect()
    }

    #[test]
    fn test_correlation_directionality() {
        let word = chars("ab");
        let mut a = CharacterStats::new('a');
        let mut b = CharacterStats::new('b');
        a.add_word(&word, 0).unwrap();
        b.add_word(&word, 1).unwrap();

        assert_eq!(a.correlations('b').map(|h| h.counts().to_vec()), Some(vec![1]));
        assert!(b.all_correlations().is_empty());
        assert_eq!(b.alphabet().count(), 0);
    }

    #[test]
    fn test_add_word_positions() {
        let word = chars("hello");
        let mut l = CharacterStats::new('l');
        l.add_word(&word, 2).unwrap();
        l.add_word(&word, 3).unwrap();

        assert_eq!(l.count(), 2);
        assert_eq!(l.distances_from_start().counts(), &[0, 0, 1, 1]);
        assert_eq!(l.distances_from_end().counts(), &[0, 1, 1]);
        // 'l'@2 sees 'l' at 1 and 'o' at 2; 'l'@3 sees 'o' at 1
        assert_eq!(l.correlations('l').unwrap().counts(), &[1]);
        assert_eq!(l.correlations('o').unwrap().counts(), &[1, 1]);
        assert!(l.correlations('h').is_none());
    }

    #[test]
    fn test_add_word_rejects_out_of_range_index() {
        let mut stats = CharacterStats::new('x');
        assert!(matches!(
            stats.add_word(&chars("xy"), 2),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(stats.count(), 0);
    }

    #[test]
    fn test_correlation_distance_must_be_positive() {
        let mut stats = CharacterStats::new('a');
        assert!(stats.add_character_correlation('b', 0).is_err());
        stats.add_character_correlation('b', 3).unwrap();
        assert_eq!(stats.correlations('b').unwrap().counts(), &[0, 0, 1]);
    }

    #[test]
    fn test_correlations_at_index() {
        let mut stats = CharacterStats::new('a');
        stats.add_character_correlation('b', 1).unwrap();
        stats.add_character_correlation('b', 1).unwrap();
        stats.add_character_correlation('c', 2).unwrap();

        let first = stats.correlations_at_index(0);
        assert_eq!(first.get('b'), Some(&2));
        assert!(!first.contains_key('c'));

        let second = stats.correlations_at_index(1);
        assert_eq!(second.keys().collect::<Vec<_>>(), vec!['c']);
        assert!(stats.correlations_at_index(7).is_empty());
    }

    #[test]
    fn test_add_all_unions() {
        let word = chars("abc");
        let mut left = CharacterStats::new('a');
        left.add_word(&word, 0).unwrap();
        let mut right = CharacterStats::new('a');
        right.add_word(&chars("ab"), 0).unwrap();

        left.add_all(&right);
        assert_eq!(left.count(), 2);
        assert_eq!(left.distances_from_start().counts(), &[2]);
        assert_eq!(left.distances_from_end().counts(), &[0, 1, 1]);
        assert_eq!(left.correlations('b').unwrap().counts(), &[2]);
        assert_eq!(left.correlations('c').unwrap().counts(), &[0, 1]);
    }

    #[test]
    fn test_case_insensitive_correlations_merge() {
        let mut stats = CharacterStats::new('a');
        stats.add_character_correlation('B', 1).unwrap();
        stats.add_character_correlation('b', 2).unwrap();
        assert_eq!(stats.all_correlations().len(), 2);

        stats.set_case_sensitive(false);
        assert_eq!(stats.all_correlations().len(), 1);
        assert_eq!(stats.correlations('b').unwrap().counts(), &[1, 1]);
    }

    #[test]
    fn test_reset_prepare_collapse() {
        let mut stats = CharacterStats::new('a');
        stats.add_word(&chars("abc"), 0).unwrap();

        stats.prepare('z');
        assert!(stats.correlations('z').unwrap().is_empty());

        stats.reset_character('c');
        assert_eq!(stats.correlations('c').map(|h| h.len()), Some(0));

        stats.add_character_correlation('z', 1).unwrap();
        stats.reset_character('z');
        stats.collapse();
        assert!(stats.correlations('z').unwrap().is_empty());

        stats.reset();
        assert_eq!(stats.count(), 0);
        assert!(stats.all_correlations().is_empty());
        assert!(stats.distances_from_start().is_empty());
    }
}
