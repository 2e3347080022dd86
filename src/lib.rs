//! Garbler - per-character correlation statistics for generating word-like text.
//!
//! # Overview
//!
//! The library builds a statistical model of observed words:
//! - How often each character appears
//! - How far from the start and end of a word it tends to sit
//! - Which characters follow it, and at what distance
//!
//! From that model it answers "given the last few characters of a partially
//! built word, how likely is each possible next character?". Drawing from that
//! distribution (the actual garbling) is left to the caller.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Corpus text    │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  CorpusModel    │ ← Ingestion, inference, compaction (library.rs)
//! └────────┬────────┘
//!          │
//!          ├──────────────────────┐
//!          ▼                      ▼
//! ┌─────────────────┐    ┌─────────────────┐
//! │ CharacterStats  │    │ InfluenceCache  │ ← Two-tier cache (cache.rs)
//! └────────┬────────┘    └─────────────────┘
//!          │               (char_stats.rs)
//!          ▼
//! ┌─────────────────┐
//! │  CharacterMap   │ ← Case-folding map + histograms (char_map.rs, histogram.rs)
//! └─────────────────┘
//! ```
//!
//! # Modules
//!
//! - `histogram.rs`: Count-by-distance histogram
//! - `char_map.rs`: Case-folding character map and pruning
//! - `char_stats.rs`: Per-character statistics
//! - `library.rs`: The corpus model
//! - `cache.rs`: Influence map cache
//! - `shared.rs`: Mutex-guarded handle for multi-threaded hosts
//! - `config.rs`: Settings loaded with confy
//!
//! # Threading
//!
//! Everything is single-threaded and synchronous. Use [`SharedCorpusModel`]
//! when one model has to be reached from several threads.

pub mod cache;
pub mod char_map;
pub mod char_stats;
pub mod config;
pub mod error;
pub mod histogram;
pub mod library;
pub mod shared;

pub use crate::cache::{CacheObserver, CacheOutcome, CacheStats, InfluenceCache};
pub use crate::char_map::{trim_low_value_entries, CharacterMap};
pub use crate::char_stats::CharacterStats;
pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::histogram::OccurrenceHistogram;
pub use crate::library::{CorpusModel, Distribution, InfluenceMap};
pub use crate::shared::SharedCorpusModel;
