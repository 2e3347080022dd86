//! Corpus model: character statistics and next-character inference.
//!
//! This module ties the statistics together. Words are ingested one at a
//! time; each character's [`CharacterStats`] records where it appeared and
//! which characters followed it. Queries then turn the last few characters of
//! a partially built word into a probability distribution over the next one.
//!
//! # Inference
//!
//! Given a trailing sequence, every character in it contributes the
//! characters it is known to precede by exactly the distance between it and
//! the next slot:
//! - the last character contributes its distance-1 correlations
//! - the one before it contributes its distance-2 correlations
//! - and so on back to the start of the sequence
//!
//! The evidence is superposed into one histogram per candidate, indexed by
//! the contributing character's distance from the end (the influence map).
//!
//! # Compaction
//!
//! Each candidate histogram is folded from its tail inward with an
//! exponential decay. A decay above 0.5 favours evidence from characters near
//! the end of the sequence, below 0.5 favours characters further back. The
//! folded influences are normalized into probabilities.
//!
//! # Usage
//!
//! ```rust
//! use garbler::CorpusModel;
//!
//! let mut model = CorpusModel::new(false);
//! model.parse_line("ab ac ab").unwrap();
//!
//! let distribution = model.next_character_distribution("a", 0.75, 0.0).unwrap();
//! assert!((distribution.get('b').unwrap() - 2.0 / 3.0).abs() < 1e-9);
//! assert!((distribution.get('c').unwrap() - 1.0 / 3.0).abs() < 1e-9);
//! ```

use crate::cache::InfluenceCache;
use crate::char_map::{fold_case, trim_low_value_entries, CharacterMap};
use crate::char_stats::CharacterStats;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::histogram::OccurrenceHistogram;
use tracing::{debug, trace};

/// Candidate character → evidence histogram indexed by distance from the end
/// of the queried sequence.
pub type InfluenceMap = CharacterMap<OccurrenceHistogram>;

/// Candidate character → probability.
pub type Distribution = CharacterMap<f64>;

fn merge_stats(existing: &mut CharacterStats, incoming: CharacterStats) {
    existing.add_all(&incoming);
}

/// Superpose the correlation evidence of every character in `sequence`.
fn build_influence_map(stats: &CharacterMap<CharacterStats>, sequence: &str) -> InfluenceMap {
    let chars: Vec<char> = sequence.chars().collect();
    let mut results = CharacterMap::histograms(stats.is_case_sensitive());

    for (index, &c) in chars.iter().enumerate().rev() {
        let position = chars.len() - 1 - index;

        let Some(char_stats) = stats.get(c) else {
            continue;
        };

        for (candidate, &count) in char_stats.correlations_at_index(position).iter() {
            results
                .get_or_insert_with(candidate, OccurrenceHistogram::new)
                .increment_by(position, count);
        }
    }

    results
}

/// Fold a histogram into one influence value, from the tail inward.
fn decayed_influence(histogram: &OccurrenceHistogram, decay: f64) -> f64 {
    let Some((&last, rest)) = histogram.counts().split_last() else {
        return 0.0;
    };
    let retained = 1.0 - decay;
    rest.iter().rev().fold(last as f64, |influence, &count| {
        influence * retained + count as f64 * decay
    })
}

/// Statistics over every character of an ingested corpus.
#[derive(Debug)]
pub struct CorpusModel {
    /// Character → its statistics.
    stats: CharacterMap<CharacterStats>,
    /// Word lengths, index = length - 1.
    word_lengths: OccurrenceHistogram,
    cache: InfluenceCache,
}

impl CorpusModel {
    /// Create an empty model.
    ///
    /// # Arguments
    /// * `case_sensitive` - `false` folds every ingested word and every query
    ///   to lowercase
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            stats: CharacterMap::new(case_sensitive, merge_stats),
            word_lengths: OccurrenceHistogram::new(),
            cache: InfluenceCache::new(),
        }
    }

    /// Create an empty model using the case sensitivity and cache size of
    /// `config`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            cache: InfluenceCache::with_capacity(config.secondary_cache_size),
            ..Self::new(config.case_sensitive)
        }
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.stats.is_case_sensitive()
    }

    /// Change case sensitivity for the whole model.
    ///
    /// Every character's correlation table is updated first, then the
    /// statistics table itself. Switching to case-insensitive merges the
    /// statistics of characters that differ only by case. The influence
    /// cache is cleared since its maps were built under the old folding.
    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        if self.is_case_sensitive() == case_sensitive {
            return;
        }
        for stats in self.stats.values_mut() {
            stats.set_case_sensitive(case_sensitive);
        }
        self.stats.set_case_sensitive(case_sensitive);
        self.cache.clear();
        debug!(
            case_sensitive,
            characters = self.stats.len(),
            "changed model case sensitivity"
        );
    }

    /// Add a single word to the statistics.
    ///
    /// Updates the word length histogram and, for every character, its
    /// occurrence count, positions and correlations. Empty words are ignored.
    ///
    /// # Example
    /// ```rust
    /// use garbler::CorpusModel;
    ///
    /// let mut model = CorpusModel::default();
    /// model.parse_word("ab").unwrap();
    /// assert_eq!(model.stats('a').unwrap().correlations('b').unwrap().counts(), &[1]);
    /// assert!(model.stats('b').unwrap().all_correlations().is_empty());
    /// ```
    pub fn parse_word(&mut self, word: &str) -> Result<()> {
        let case_sensitive = self.is_case_sensitive();
        let chars: Vec<char> = if case_sensitive {
            word.chars().collect()
        } else {
            word.chars().map(fold_case).collect()
        };

        if chars.is_empty() {
            return Ok(());
        }

        self.word_lengths.increment(chars.len() - 1);

        for (index, &c) in chars.iter().enumerate() {
            let stats = self.stats.get_or_insert_with(c, || {
                let mut stats = CharacterStats::new(c);
                stats.set_case_sensitive(case_sensitive);
                stats
            });
            stats.add_word(&chars, index)?;
        }

        trace!(word, "parsed word");
        Ok(())
    }

    /// Split `line` on whitespace and parse every word.
    ///
    /// Returns the number of words parsed.
    pub fn parse_line(&mut self, line: &str) -> Result<usize> {
        self.parse_line_with_delimiters(line, "")
    }

    /// Split `line` on whitespace and on any character in `delimiters`, then
    /// parse every word.
    ///
    /// Returns the number of words parsed.
    pub fn parse_line_with_delimiters(&mut self, line: &str, delimiters: &str) -> Result<usize> {
        let mut parsed = 0;
        let words = line
            .split(|c: char| c.is_whitespace() || delimiters.contains(c))
            .filter(|word| !word.is_empty());
        for word in words {
            self.parse_word(word)?;
            parsed += 1;
        }
        Ok(parsed)
    }

    /// Histogram of every ingested word length. Index 0 is length 1.
    pub fn word_lengths(&self) -> &OccurrenceHistogram {
        &self.word_lengths
    }

    pub fn stats(&self, c: char) -> Option<&CharacterStats> {
        self.stats.get(c)
    }

    /// Every character with statistics, in ascending order.
    pub fn alphabet(&self) -> impl Iterator<Item = char> + '_ {
        self.stats.keys()
    }

    /// Number of distinct characters tracked.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn cache(&self) -> &InfluenceCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut InfluenceCache {
        &mut self.cache
    }

    /// Forget everything: statistics, word lengths and cached influence maps.
    pub fn clear(&mut self) {
        self.stats.clear();
        self.word_lengths.clear();
        self.cache.clear();
    }

    /// Drop every character seen `threshold` times or fewer, along with any
    /// correlations pointing at it.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if `threshold` is 0.
    ///
    /// # Returns
    /// The number of characters removed.
    pub fn prune(&mut self, threshold: u64) -> Result<usize> {
        let mut counts: CharacterMap<u64> = CharacterMap::summing(self.is_case_sensitive());
        for (c, stats) in self.stats.iter() {
            counts.put(c, stats.count());
        }
        let removed = trim_low_value_entries(&mut counts, threshold)?;
        if removed == 0 {
            return Ok(0);
        }

        let pruned: Vec<char> = self
            .stats
            .keys()
            .filter(|&c| !counts.contains_key(c))
            .collect();
        self.stats.retain(|c, _| counts.contains_key(c));
        for stats in self.stats.values_mut() {
            for &c in &pruned {
                stats.forget(c);
            }
        }
        self.cache.clear();

        debug!(removed, threshold, "pruned rare characters");
        Ok(removed)
    }

    /// Build the influence map for `sequence` from the current statistics.
    ///
    /// Characters without statistics contribute nothing. No normalization
    /// happens here; see [`CorpusModel::compact_influence_map`].
    pub fn generate_influence_map(&self, sequence: &str) -> InfluenceMap {
        build_influence_map(&self.stats, sequence)
    }

    /// Influence map for `sequence`, served from the two-tier cache when
    /// possible.
    ///
    /// A cached map reflects the statistics at the time it was generated.
    pub fn influence_map_cached(&mut self, sequence: &str) -> &InfluenceMap {
        let stats = &self.stats;
        self.cache
            .get_or_insert_with(sequence, || build_influence_map(stats, sequence))
    }

    /// Turn an influence map into probabilities summing to 1.0.
    ///
    /// # Errors
    /// Returns `Error::NoEvidence` when the total influence is zero.
    pub fn compact_influence_map(influence_map: &InfluenceMap, decay: f64) -> Result<Distribution> {
        Self::compact_influence_map_with_threshold(influence_map, decay, 0.0)
    }

    /// Turn an influence map into probabilities, dropping weak candidates.
    ///
    /// Candidates whose share of the total influence is below `threshold`
    /// are removed, then the survivors are renormalized by the reduced total
    /// so they still sum to 1.0. Shares are measured against the total
    /// before any removal. A `threshold` of 0 or less keeps every candidate.
    ///
    /// # Arguments
    /// * `influence_map` - Output of [`CorpusModel::generate_influence_map`]
    /// * `decay` - Weight of nearer evidence; values outside `[0, 1]` are
    ///   accepted but no longer give a weighted average
    /// * `threshold` - Minimum share of the total a candidate needs to survive
    ///
    /// # Errors
    /// Returns `Error::NoEvidence` when the total influence is zero (or not
    /// finite). If every candidate falls below the threshold the result is
    /// an empty distribution.
    pub fn compact_influence_map_with_threshold(
        influence_map: &InfluenceMap,
        decay: f64,
        threshold: f64,
    ) -> Result<Distribution> {
        let mut distribution = CharacterMap::summing(influence_map.is_case_sensitive());
        let mut total = 0.0;
        for (candidate, histogram) in influence_map.iter() {
            let influence = decayed_influence(histogram, decay);
            distribution.put(candidate, influence);
            total += influence;
        }

        if total == 0.0 || !total.is_finite() {
            return Err(Error::NoEvidence);
        }

        if threshold > 0.0 {
            let original_total = total;
            distribution.retain(|_, influence| {
                if *influence / original_total < threshold {
                    total -= *influence;
                    false
                } else {
                    true
                }
            });
            if distribution.is_empty() {
                return Ok(distribution);
            }
            if total == 0.0 {
                return Err(Error::NoEvidence);
            }
        }

        for probability in distribution.values_mut() {
            *probability /= total;
        }
        Ok(distribution)
    }

    /// Probability of each possible next character after `sequence`.
    ///
    /// Cached inference followed by compaction.
    pub fn next_character_distribution(
        &mut self,
        sequence: &str,
        decay: f64,
        threshold: f64,
    ) -> Result<Distribution> {
        let influence_map = self.influence_map_cached(sequence);
        Self::compact_influence_map_with_threshold(influence_map, decay, threshold)
    }
}

impl Default for CorpusModel {
    fn default() -> Self {
        Self::new(true)
    }
}
