//! Validator configuration

use crate::ValidatorError;
use serde::{Deserialize, Serialize};

/// Configuration for image-adjacency validation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Row distance within which a sheet image counts as near a proposal
    pub nearby_rows: u32,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self { nearby_rows: 10 }
    }
}

impl ValidatorConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ValidatorError> {
        if self.nearby_rows == 0 {
            return Err(ValidatorError::Config(
                "nearby_rows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ValidatorConfig::default();
        assert_eq!(config.nearby_rows, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_radius_rejected() {
        let config = ValidatorConfig { nearby_rows: 0 };
        assert!(config.validate().is_err());
    }
}
