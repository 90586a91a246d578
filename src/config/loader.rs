//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::models::{AuditWarning, CustomFormula, FuelTierDefaults, ScoringRule};

use super::types::{EngineConfig, EngineMetadata, FormulasFile, ScoringRulesFile};
use super::validation::{validate_formulas, validate_fuel_config, validate_scoring_rules};

/// Loads and provides access to engine configuration.
///
/// The `ConfigLoader` reads YAML configuration files from a directory,
/// validates every item, and keeps the warnings raised along the way.
///
/// # Directory Structure
///
/// ```text
/// config/fleet/
/// ├── engine.yaml         # Name, version, default log level
/// ├── fuel_tiers.yaml     # Fuel tiers per driver type
/// ├── scoring_rules.yaml  # Achievement → score table
/// └── formulas.yaml       # Standing custom formulas (optional)
/// ```
///
/// # Example
///
/// ```no_run
/// use incentive_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/fleet").unwrap();
/// println!("Loaded {} scoring rules", loader.scoring_rules().len());
/// for warning in loader.warnings() {
///     println!("{}: {}", warning.code, warning.message);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
    warnings: Vec<AuditWarning>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::from_config(EngineConfig::default())
    }
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/fleet")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    ///
    /// Items that parse but cannot be used are dropped and reported through
    /// [`ConfigLoader::warnings`] rather than failing the load.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let metadata = Self::load_yaml::<EngineMetadata>(&path.join("engine.yaml"))?;
        let fuel_tiers = Self::load_yaml::<FuelTierDefaults>(&path.join("fuel_tiers.yaml"))?;
        let scoring = Self::load_yaml::<ScoringRulesFile>(&path.join("scoring_rules.yaml"))?;

        let formulas_path = path.join("formulas.yaml");
        let formulas = if formulas_path.exists() {
            Self::load_yaml::<FormulasFile>(&formulas_path)?.formulas
        } else {
            Vec::new()
        };

        let mut warnings = Vec::new();

        let (local, local_warnings) = validate_fuel_config("local", fuel_tiers.local);
        let (export, export_warnings) = validate_fuel_config("export", fuel_tiers.export);
        let (scoring_rules, scoring_warnings) = validate_scoring_rules(scoring.scoring_rules);
        let (formulas, formula_warnings) = validate_formulas(formulas);
        warnings.extend(local_warnings);
        warnings.extend(export_warnings);
        warnings.extend(scoring_warnings);
        warnings.extend(formula_warnings);

        // An emptied tier set falls back to the built-in tiers for that type.
        let defaults = FuelTierDefaults::default();
        let fuel_tiers = FuelTierDefaults {
            local: if local.enabled && local.tiers.is_empty() {
                defaults.local
            } else {
                local
            },
            export: if export.enabled && export.tiers.is_empty() {
                defaults.export
            } else {
                export
            },
        };

        info!(
            path = %path.display(),
            name = %metadata.name,
            version = %metadata.version,
            scoring_rules = scoring_rules.len(),
            formulas = formulas.len(),
            warnings = warnings.len(),
            "Configuration loaded"
        );

        Ok(Self {
            config: EngineConfig {
                metadata,
                fuel_tiers,
                scoring_rules,
                formulas,
            },
            warnings,
        })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self {
            config,
            warnings: Vec::new(),
        }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the deployment metadata.
    pub fn metadata(&self) -> &EngineMetadata {
        &self.config.metadata
    }

    /// Returns the fuel tier sets.
    pub fn fuel_tiers(&self) -> &FuelTierDefaults {
        &self.config.fuel_tiers
    }

    /// Returns the validated scoring rules.
    pub fn scoring_rules(&self) -> &[ScoringRule] {
        &self.config.scoring_rules
    }

    /// Returns the validated standing formulas.
    pub fn formulas(&self) -> &[CustomFormula] {
        &self.config.formulas
    }

    /// Returns the issues found while validating the configuration.
    pub fn warnings(&self) -> &[AuditWarning] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_scoring_rules;
    use rust_decimal::Decimal;
    use std::path::PathBuf;
    use std::str::FromStr;

    fn config_path() -> &'static str {
        "./config/fleet"
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn scratch_dir(name: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "incentive-engine-{}-{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        for (file, content) in files {
            fs::write(dir.join(file), content).unwrap();
        }
        dir
    }

    const ENGINE_YAML: &str = "name: Test fleet\nversion: \"1\"\n";
    const FUEL_YAML: &str = r#"
local:
  tiers:
    - { min_efficiency: "1.5", max_efficiency: "2.0", bonus_amount: "10" }
    - { min_efficiency: "1.8", max_efficiency: "2.5", bonus_amount: "20" }
export:
  enabled: false
"#;
    const RULES_YAML: &str = r#"
scoring_rules:
  - { min_achievement: "0", max_achievement: "100", score: "50" }
  - { min_achievement: "100", max_achievement: "200", score: "150" }
"#;

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.metadata().name, "Fleet incentive engine");
        assert_eq!(loader.metadata().log_level, "info");
        assert!(loader.warnings().is_empty(), "{:?}", loader.warnings());
    }

    #[test]
    fn test_shipped_tables_match_built_in_defaults() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        assert_eq!(loader.fuel_tiers(), &FuelTierDefaults::default());
        assert_eq!(loader.scoring_rules(), default_scoring_rules().as_slice());
    }

    #[test]
    fn test_shipped_formulas_loaded() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let keys: Vec<&str> = loader.formulas().iter().map(|f| f.key.as_str()).collect();
        assert!(keys.contains(&"safety_bonus"));
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("engine.yaml"));
            }
            _ => panic!("Expected ConfigNotFound error"),
        }
    }

    #[test]
    fn test_invalid_yaml_returns_parse_error() {
        let dir = scratch_dir(
            "bad-yaml",
            &[
                ("engine.yaml", ENGINE_YAML),
                ("fuel_tiers.yaml", "local: [unclosed"),
                ("scoring_rules.yaml", RULES_YAML),
            ],
        );

        match ConfigLoader::load(&dir) {
            Err(EngineError::ConfigParseError { path, .. }) => {
                assert!(path.contains("fuel_tiers.yaml"));
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_items_dropped_with_warnings() {
        let dir = scratch_dir(
            "invalid-items",
            &[
                ("engine.yaml", ENGINE_YAML),
                ("fuel_tiers.yaml", FUEL_YAML),
                ("scoring_rules.yaml", RULES_YAML),
                (
                    "formulas.yaml",
                    "formulas:\n  - { key: broken, expression: \"actual_km * \" }\n",
                ),
            ],
        );

        let loader = ConfigLoader::load(&dir).unwrap();

        assert_eq!(loader.fuel_tiers().local.tiers.len(), 1);
        assert_eq!(loader.fuel_tiers().local.tiers[0].bonus_amount, dec("10"));
        assert!(!loader.fuel_tiers().export.enabled);
        assert_eq!(loader.scoring_rules().len(), 1);
        assert!(loader.formulas().is_empty());

        let codes: Vec<&str> = loader.warnings().iter().map(|w| w.code.as_str()).collect();
        assert_eq!(
            codes,
            vec!["FUEL_TIER_OVERLAP", "INVALID_SCORING_RULE", "FORMULA_INVALID"]
        );
    }

    #[test]
    fn test_default_loader_uses_built_in_config() {
        let loader = ConfigLoader::default();
        assert_eq!(loader.config(), &EngineConfig::default());
        assert!(loader.warnings().is_empty());
    }
}
