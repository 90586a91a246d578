//! Configuration loading and management for the incentive engine.
//!
//! This module loads fuel tiers, scoring rules and standing formulas from
//! YAML files and validates them at the load boundary.
//!
//! # Example
//!
//! ```no_run
//! use incentive_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/fleet").unwrap();
//! println!("Loaded configuration: {}", config.metadata().name);
//! ```

mod loader;
mod types;
mod validation;

pub use loader::ConfigLoader;
pub use types::{EngineConfig, EngineMetadata, FormulasFile, ScoringRulesFile};
pub use validation::{validate_formulas, validate_fuel_config, validate_scoring_rules};
