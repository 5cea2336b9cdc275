//! Configuration of the point ledger.
//!
//! The configuration is read from TOML. Every field has a default, so an empty document is a
//! valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::policy::DEFAULT_MAX_BALANCE;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Highest balance a user may hold
    #[serde(default = "default_max_balance")]
    pub max_balance: u64,
}

const fn default_max_balance() -> u64 {
    DEFAULT_MAX_BALANCE
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_balance: default_max_balance(),
        }
    }
}

impl LedgerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds invalid values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or `max_balance` is zero.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_balance == 0 {
            return Err(ConfigError::Validation(
                "max_balance must allow at least one point".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let res = LedgerConfig::from_toml("");

        assert_that!(res).is_ok().is_equal_to(LedgerConfig {
            max_balance: 2_000_000,
        });
    }

    #[test]
    fn test_custom_ceiling() {
        let res = LedgerConfig::from_toml("max_balance = 5000");

        assert_that!(res)
            .is_ok()
            .matches(|config| config.max_balance == 5_000);
    }

    #[test]
    fn test_zero_ceiling_is_rejected() {
        let res = LedgerConfig::from_toml("max_balance = 0");

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_negative_ceiling_is_rejected() {
        let res = LedgerConfig::from_toml("max_balance = -1");

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let res = LedgerConfig::from_file(Path::new("/nonexistent/ledger.toml"));

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, ConfigError::Io(_)));
    }
}
