//! Configuration types for the incentive engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use serde::{Deserialize, Serialize};

use crate::models::{CustomFormula, FuelTierDefaults, ScoringRule, default_scoring_rules};

/// Metadata about the deployment, from `engine.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMetadata {
    /// Human-readable name of this configuration set.
    pub name: String,
    /// Version of the configuration set.
    pub version: String,
    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineMetadata {
    fn default() -> Self {
        Self {
            name: "Fleet incentive engine".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: default_log_level(),
        }
    }
}

/// Scoring rules file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringRulesFile {
    /// The achievement → score table, in lookup order.
    pub scoring_rules: Vec<ScoringRule>,
}

/// Standing formulas file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct FormulasFile {
    /// Formulas applied when a request supplies none.
    #[serde(default)]
    pub formulas: Vec<CustomFormula>,
}

/// The complete engine configuration loaded from YAML files.
///
/// Every part has a built-in default, so [`EngineConfig::default`] is a
/// usable configuration on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Deployment metadata.
    pub metadata: EngineMetadata,
    /// Fuel tier sets per driver type.
    pub fuel_tiers: FuelTierDefaults,
    /// Achievement → score table.
    pub scoring_rules: Vec<ScoringRule>,
    /// Standing custom formulas.
    pub formulas: Vec<CustomFormula>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            metadata: EngineMetadata::default(),
            fuel_tiers: FuelTierDefaults::default(),
            scoring_rules: default_scoring_rules(),
            formulas: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_log_level_defaults_to_info() {
        let yaml = "name: Fleet\nversion: \"2025.1\"\n";
        let metadata: EngineMetadata = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(metadata.log_level, "info");
        assert_eq!(metadata.version, "2025.1");
    }

    #[test]
    fn test_default_config_carries_built_in_tables() {
        let config = EngineConfig::default();
        assert_eq!(config.scoring_rules, default_scoring_rules());
        assert_eq!(config.fuel_tiers, FuelTierDefaults::default());
        assert!(config.formulas.is_empty());
    }
}
