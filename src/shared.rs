//! Thread-shareable handle around a [`CorpusModel`].
//!
//! The model itself has no internal locking. Hosts that ingest and query from
//! several threads share it through this handle, which holds one
//! `parking_lot::Mutex` across a whole ingest or a whole query.

use crate::config::Config;
use crate::error::Result;
use crate::library::{CorpusModel, Distribution};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

#[derive(Clone)]
pub struct SharedCorpusModel {
    model: Arc<Mutex<CorpusModel>>,
    decay: f64,
    threshold: f64,
    delimiters: Arc<str>,
}

impl SharedCorpusModel {
    pub fn new(model: CorpusModel) -> Self {
        let defaults = Config::default();
        Self {
            model: Arc::new(Mutex::new(model)),
            decay: defaults.decay,
            threshold: defaults.threshold,
            delimiters: Arc::from(defaults.delimiters.as_str()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            model: Arc::new(Mutex::new(CorpusModel::from_config(config))),
            decay: config.decay,
            threshold: config.threshold,
            delimiters: Arc::from(config.delimiters.as_str()),
        }
    }

    /// Lock the model for a sequence of calls that must not interleave with
    /// other threads.
    pub fn lock(&self) -> MutexGuard<'_, CorpusModel> {
        self.model.lock()
    }

    /// Parse a line with the configured delimiters.
    pub fn ingest_line(&self, line: &str) -> Result<usize> {
        self.model
            .lock()
            .parse_line_with_delimiters(line, &self.delimiters)
    }

    /// Next-character distribution using the configured decay and threshold.
    pub fn next_character_distribution(&self, sequence: &str) -> Result<Distribution> {
        self.model
            .lock()
            .next_character_distribution(sequence, self.decay, self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_ingestion() {
        let shared = SharedCorpusModel::new(CorpusModel::default());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        shared.ingest_line("ab, ac").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let model = shared.lock();
        assert_eq!(model.stats('a').unwrap().count(), 200);
        assert_eq!(model.word_lengths().counts(), &[0, 200]);
    }

    #[test]
    fn test_query_uses_config() {
        let config = Config {
            threshold: 0.4,
            ..Config::default()
        };
        let shared = SharedCorpusModel::from_config(&config);
        shared.ingest_line("ab ab ab ac").unwrap();

        let distribution = shared.next_character_distribution("a").unwrap();
        assert_eq!(distribution.keys().collect::<Vec<_>>(), vec!['b']);
        assert!((distribution.get('b').unwrap() - 1.0).abs() < 1e-9);
    }
}
