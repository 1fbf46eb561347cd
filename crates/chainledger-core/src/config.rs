//! Classifier configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;
use crate::matcher::{DEFAULT_TOLERANCE, WIDE_TOLERANCE};

/// Relative tolerances used by the transfer matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceConfig {
    /// Ordinary amount matches
    #[serde(default = "default_tolerance")]
    pub default: Decimal,
    /// Lossy derivative-token conversions
    #[serde(default = "wide_tolerance")]
    pub wide: Decimal,
}

fn default_tolerance() -> Decimal { DEFAULT_TOLERANCE }
fn wide_tolerance() -> Decimal { WIDE_TOLERANCE }

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            default: DEFAULT_TOLERANCE,
            wide: WIDE_TOLERANCE,
        }
    }
}

/// Top-level classifier configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    /// Parser names to skip, e.g. `["tornado"]`
    #[serde(default)]
    pub disabled_parsers: Vec<String>,
}

impl ClassifierConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ClassifyError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ClassifyError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn is_disabled(&self, parser: &str) -> bool {
        self.disabled_parsers.iter().any(|p| p == parser)
    }

    fn validate(&self) -> Result<(), ClassifyError> {
        let in_range = |t: Decimal| t >= Decimal::ZERO && t < Decimal::ONE;
        if !in_range(self.tolerance.default) || !in_range(self.tolerance.wide) {
            return Err(ClassifyError::Config(format!(
                "tolerances must be in [0, 1): default={}, wide={}",
                self.tolerance.default, self.tolerance.wide
            )));
        }
        Ok(())
    }
}
