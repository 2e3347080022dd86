use crate::cache::SECONDARY_CACHE_SIZE;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

const APP_NAME: &str = "garbler";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub case_sensitive: bool,
    /// Weight of evidence near the end of a sequence, see `CorpusModel::compact_influence_map`.
    pub decay: f64,
    /// Minimum share a candidate needs to stay in a distribution. 0 keeps all.
    pub threshold: f64,
    pub secondary_cache_size: usize,
    /// Word delimiters used in addition to whitespace.
    pub delimiters: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            decay: 0.75,
            threshold: 0.0,
            secondary_cache_size: SECONDARY_CACHE_SIZE,
            delimiters: ".,;:!?\"()".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        match confy::load(APP_NAME, Some("config")) {
            Ok(config) => Ok(config),
            Err(err) => {
                warn!("Failed to load config, using defaults: {err}");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        confy::store(APP_NAME, Some("config"), self)?;
        Ok(())
    }

    /// Reject settings the model cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.decay.is_finite() {
            return Err(Error::invalid(format!("decay must be finite, got {}", self.decay)));
        }
        if !(self.threshold >= 0.0) {
            return Err(Error::invalid(format!(
                "threshold must be 0 or greater, got {}",
                self.threshold
            )));
        }
        if self.secondary_cache_size == 0 {
            return Err(Error::invalid("secondary_cache_size must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.secondary_cache_size, 32);
        assert!(config.case_sensitive);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_decay = Config { decay: f64::NAN, ..Config::default() };
        assert!(bad_decay.validate().is_err());

        let bad_threshold = Config { threshold: -0.1, ..Config::default() };
        assert!(bad_threshold.validate().is_err());

        let no_cache = Config { secondary_cache_size: 0, ..Config::default() };
        assert!(matches!(no_cache.validate(), Err(Error::InvalidArgument(_))));

        // Decay outside [0, 1] is allowed
        let strong_decay = Config { decay: 1.5, ..Config::default() };
        assert!(strong_decay.validate().is_ok());
    }
}
