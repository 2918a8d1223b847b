//! Run configuration.
//!
//! A run configuration is a small YAML document selecting the random seed,
//! playback options and chaos parameters:
//!
//! ```yaml
//! seed: 42
//! speed: 1.5
//! stepping: false
//! round_trip: true
//! chaos:
//!   sub_mode: network-partition
//!   interval_ms: 500
//!   protected_node_ids: [gateway]
//! ```
//!
//! Every field is optional.

use serde::{Deserialize, Serialize};

use crate::chaos::ChaosConfig;
use crate::error::SimError;

fn default_speed() -> f64 {
    1.0
}

/// Options applied to a [`crate::playback::SimulationController`] before a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seed for reproducible chaos rounds; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Renderer playback speed multiplier
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Start traced flows in manual stepping mode
    #[serde(default)]
    pub stepping: bool,
    /// Enable request/response phases for traced flows
    #[serde(default)]
    pub round_trip: bool,
    #[serde(default)]
    pub chaos: ChaosConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            speed: default_speed(),
            stepping: false,
            round_trip: false,
            chaos: ChaosConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Validate playback options and the embedded chaos configuration
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(SimError::invalid_config(format!(
                "speed must be a positive number, got {}",
                self.speed
            )));
        }
        self.chaos.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chaos::ChaosSubMode;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: SimulationConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_document() {
        let yaml = r#"
seed: 7
speed: 2.0
stepping: true
round_trip: true
chaos:
  sub_mode: network-partition
  interval_ms: 250
  protected_node_ids: [db]
"#;
        let config: SimulationConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.seed, Some(7));
        assert!(config.stepping);
        assert_eq!(config.chaos.sub_mode, ChaosSubMode::NetworkPartition);
        assert_eq!(config.chaos.interval_ms, 250);
        // unspecified chaos fields keep their defaults
        assert_eq!(config.chaos.failure_probability, 0.3);
        assert!(config.chaos.is_protected("db"));
    }

    #[test]
    fn test_validate_rejects_bad_speed() {
        let config = SimulationConfig {
            speed: -1.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_bad_chaos() {
        let mut config = SimulationConfig::default();
        config.chaos.failure_probability = 1.5;
        assert!(config.validate().is_err());
    }
}
