//! Ledger configuration
//!
//! Values that shape validation. Loaded from a JSON file or built from
//! defaults; missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Default coinbase reward cap
pub const DEFAULT_REWARD: f64 = 100.0;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid reward: {0}")]
    InvalidReward(f64),
}

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Largest amount a block's coinbase transaction may mint
    pub reward: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reward: DEFAULT_REWARD,
        }
    }
}

impl LedgerConfig {
    pub fn with_reward(reward: f64) -> Self {
        Self { reward }
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject rewards that would make the coinbase cap meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.reward.is_finite() || self.reward < 0.0 {
            return Err(ConfigError::InvalidReward(self.reward));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_reward() {
        assert_eq!(LedgerConfig::default().reward, DEFAULT_REWARD);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "reward": 25.5 }}"#).unwrap();

        let config = LedgerConfig::load(file.path()).unwrap();
        assert_eq!(config, LedgerConfig::with_reward(25.5));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        assert_eq!(
            LedgerConfig::load(file.path()).unwrap(),
            LedgerConfig::default()
        );
    }

    #[test]
    fn test_invalid_files() {
        let mut garbage = NamedTempFile::new().unwrap();
        write!(garbage, "reward = 3").unwrap();
        assert!(matches!(
            LedgerConfig::load(garbage.path()),
            Err(ConfigError::ParseError(_))
        ));

        let mut negative = NamedTempFile::new().unwrap();
        write!(negative, r#"{{ "reward": -1.0 }}"#).unwrap();
        assert!(matches!(
            LedgerConfig::load(negative.path()),
            Err(ConfigError::InvalidReward(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            LedgerConfig::load(&dir.path().join("missing.json")),
            Err(ConfigError::IoError(_))
        ));
    }
}
