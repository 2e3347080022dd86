//! Character-keyed map with case-folding merge semantics.
//!
//! `CharacterMap` is the container every other structure in the crate is
//! built from: the model's table of character statistics, each character's
//! correlation table, influence maps and the final probability distribution.
//!
//! # Case Folding
//!
//! A map can be case-sensitive or case-insensitive:
//! - **Case-sensitive**: `'a'` and `'A'` are different keys, `put` on an
//!   existing key replaces its value
//! - **Case-insensitive**: keys are folded to lowercase for lookup. Putting a
//!   key that folds onto an existing entry combines the two values with the
//!   map's merge function. The stored key keeps the case it was first
//!   inserted with.
//!
//! Switching a populated map to case-insensitive re-folds every key and
//! merges the entries that now collide.
//!
//! # Merge Strategy
//!
//! The merge function is chosen when the map is built, e.g. a sum for counts
//! or an elementwise sum for histograms:
//! ```rust
//! use garbler::CharacterMap;
//!
//! let mut counts: CharacterMap<u64> = CharacterMap::summing(false);
//! counts.put('a', 3);
//! counts.put('A', 4);
//! assert_eq!(counts.len(), 1);
//! assert_eq!(counts.get('a'), Some(&7));
//! ```

use crate::error::{Error, Result};
use crate::histogram::OccurrenceHistogram;
use ahash::AHashMap;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;

/// Combines an incoming value into the value already stored for a key.
pub type MergeFn<V> = fn(&mut V, V);

/// Fold a character to its lowercase form.
///
/// Characters whose lowercase form is more than one character (e.g. `'İ'`)
/// are left untouched so folding always yields a single key.
pub fn fold_case(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(folded), None) => folded,
        _ => c,
    }
}

fn add_assign<V: AddAssign>(existing: &mut V, incoming: V) {
    *existing += incoming;
}

fn add_histograms(existing: &mut OccurrenceHistogram, incoming: OccurrenceHistogram) {
    existing.add_all(&incoming);
}

/// Mapping from a single character to a value, with optional case folding.
#[derive(Clone)]
pub struct CharacterMap<V> {
    /// Values keyed by their stored (unfolded) key.
    entries: BTreeMap<char, V>,
    /// Folded key → stored key. Only populated while case-insensitive.
    folded: AHashMap<char, char>,
    case_sensitive: bool,
    merge: MergeFn<V>,
}

impl<V> CharacterMap<V> {
    /// Create an empty map with the given case sensitivity and merge function.
    pub fn new(case_sensitive: bool, merge: MergeFn<V>) -> Self {
        Self {
            entries: BTreeMap::new(),
            folded: AHashMap::new(),
            case_sensitive,
            merge,
        }
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Toggle case folding.
    ///
    /// Switching to case-insensitive compacts the map: every key is re-folded
    /// and entries that now collide are merged.
    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        if self.case_sensitive == case_sensitive {
            return;
        }
        self.case_sensitive = case_sensitive;
        self.folded.clear();
        self.compact();
    }

    /// Re-fold every key and merge colliding entries. Does nothing for a
    /// case-sensitive map.
    pub fn compact(&mut self) {
        if self.case_sensitive {
            return;
        }
        let entries = std::mem::take(&mut self.entries);
        self.folded.clear();
        for (key, value) in entries {
            self.merge_in(key, value);
        }
    }

    /// Stored key that `key` resolves to, if any entry matches.
    fn resolve(&self, key: char) -> Option<char> {
        if self.case_sensitive {
            self.entries.contains_key(&key).then_some(key)
        } else {
            self.folded.get(&fold_case(key)).copied()
        }
    }

    fn insert_fresh(&mut self, key: char, value: V) {
        if !self.case_sensitive {
            self.folded.insert(fold_case(key), key);
        }
        self.entries.insert(key, value);
    }

    /// Merge `value` into the entry `key` resolves to, or insert it fresh.
    fn merge_in(&mut self, key: char, value: V) {
        let merge = self.merge;
        match self.resolve(key).and_then(|stored| self.entries.get_mut(&stored)) {
            Some(existing) => merge(existing, value),
            None => self.insert_fresh(key, value),
        }
    }

    /// Store `value` under `key`.
    ///
    /// In a case-insensitive map a key that folds onto an existing entry is
    /// merged into it. In a case-sensitive map an existing key is replaced.
    pub fn put(&mut self, key: char, value: V) {
        if self.case_sensitive {
            self.entries.insert(key, value);
        } else {
            self.merge_in(key, value);
        }
    }

    pub fn get(&self, key: char) -> Option<&V> {
        self.resolve(key).and_then(|stored| self.entries.get(&stored))
    }

    pub fn get_mut(&mut self, key: char) -> Option<&mut V> {
        let stored = self.resolve(key)?;
        self.entries.get_mut(&stored)
    }

    pub fn contains_key(&self, key: char) -> bool {
        self.resolve(key).is_some()
    }

    /// Fetch the entry for `key`, creating it with `default` when absent.
    pub fn get_or_insert_with<F>(&mut self, key: char, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let stored = self.resolve(key).unwrap_or(key);
        if !self.case_sensitive {
            self.folded.entry(fold_case(stored)).or_insert(stored);
        }
        self.entries.entry(stored).or_insert_with(default)
    }

    /// Remove the entry `key` resolves to and return its value.
    pub fn remove(&mut self, key: char) -> Option<V> {
        let stored = self.resolve(key)?;
        if !self.case_sensitive {
            self.folded.remove(&fold_case(stored));
        }
        self.entries.remove(&stored)
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(char, &mut V) -> bool,
    {
        self.entries.retain(|&key, value| keep(key, value));
        if !self.case_sensitive {
            self.folded = self
                .entries
                .keys()
                .map(|&key| (fold_case(key), key))
                .collect();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.folded.clear();
    }

    /// Iterate entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (char, &V)> + '_ {
        self.entries.iter().map(|(&key, value)| (key, value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (char, &mut V)> + '_ {
        self.entries.iter_mut().map(|(&key, value)| (key, value))
    }

    /// Every stored key, i.e. the alphabet this map has seen.
    pub fn keys(&self) -> impl Iterator<Item = char> + '_ {
        self.entries.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.entries.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.entries.values_mut()
    }
}

impl<V: Clone> CharacterMap<V> {
    /// Merge every entry of `other` into this map.
    ///
    /// Keys that resolve to an existing entry are combined with this map's
    /// merge function regardless of case sensitivity.
    pub fn add_all(&mut self, other: &CharacterMap<V>) {
        for (key, value) in other.iter() {
            self.merge_in(key, value.clone());
        }
    }
}

impl<V: AddAssign> CharacterMap<V> {
    /// A map whose merge function sums values.
    pub fn summing(case_sensitive: bool) -> Self {
        Self::new(case_sensitive, add_assign::<V>)
    }
}

impl CharacterMap<OccurrenceHistogram> {
    /// A map of histograms merged by elementwise sum.
    pub fn histograms(case_sensitive: bool) -> Self {
        Self::new(case_sensitive, add_histograms)
    }
}

impl CharacterMap<u64> {
    /// Add `quantity` at `key`, creating the entry at 0 if needed.
    ///
    /// Returns the new count.
    pub fn increment(&mut self, key: char, quantity: u64) -> u64 {
        let count = self.get_or_insert_with(key, || 0);
        *count += quantity;
        *count
    }

    /// Subtract `quantity` at `key`, saturating at 0, creating the entry if
    /// needed.
    ///
    /// Returns the new count.
    pub fn decrement(&mut self, key: char, quantity: u64) -> u64 {
        let count = self.get_or_insert_with(key, || 0);
        *count = count.saturating_sub(quantity);
        *count
    }

    /// Zero the count at `key` without removing it. Missing keys are not
    /// created.
    pub fn reset(&mut self, key: char) {
        if let Some(count) = self.get_mut(key) {
            *count = 0;
        }
    }

    pub fn sum(&self) -> u64 {
        self.values().sum()
    }

    /// Same keys and folding, values converted to `f64`.
    pub fn to_decimal_map(&self) -> CharacterMap<f64> {
        let mut decimals = CharacterMap::summing(self.case_sensitive);
        for (key, &count) in self.iter() {
            decimals.put(key, count as f64);
        }
        decimals
    }
}

impl<V: PartialEq> PartialEq for CharacterMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.case_sensitive == other.case_sensitive && self.entries == other.entries
    }
}

impl<V: fmt::Debug> fmt::Debug for CharacterMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharacterMap")
            .field("case_sensitive", &self.case_sensitive)
            .field("entries", &self.entries)
            .finish()
    }
}

/// Remove every entry whose value is at or below `threshold`.
///
/// Used for periodic pruning of rarely seen characters.
///
/// # Errors
/// Returns `Error::InvalidArgument` when `threshold` is not greater than zero.
///
/// # Returns
/// The number of entries removed.
pub fn trim_low_value_entries<V>(map: &mut CharacterMap<V>, threshold: V) -> Result<usize>
where
    V: Copy + PartialOrd + Default,
{
    // NaN thresholds fail this comparison too
    if !(threshold > V::default()) {
        return Err(Error::invalid("threshold must be greater than 0"));
    }
    let before = map.len();
    map.retain(|_, value| *value > threshold);
    Ok(before - map.len())
}
