//! Error types for the incentive and scorecard engine.
//!
//! The calculation functions themselves never fail: bad configuration and
//! missing data degrade to zero contributions and are reported through the
//! audit trace. [`EngineError`] covers the places where a hard failure is the
//! right answer: loading configuration, validating operator-entered formulas,
//! and rejecting batch records that cannot belong together.

use thiserror::Error;

/// The main error type for the engine.
///
/// # Example
///
/// ```
/// use incentive_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/fuel_tiers.yaml".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Configuration file not found: /missing/fuel_tiers.yaml"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A configuration item was structurally invalid.
    #[error("Invalid configuration item '{item}': {message}")]
    InvalidConfig {
        /// Identifies the offending item (e.g. "scoring_rules[2]").
        item: String,
        /// A description of what made the item invalid.
        message: String,
    },

    /// A custom formula expression could not be parsed.
    #[error("Invalid formula '{expression}': {message}")]
    InvalidFormula {
        /// The expression text as entered.
        expression: String,
        /// A description of the parse failure.
        message: String,
    },

    /// An input record was inconsistent and cannot be calculated.
    #[error("Invalid {entity} '{id}': {message}")]
    InvalidRecord {
        /// The kind of record (e.g. "performance").
        entity: String,
        /// The record's identifier.
        id: String,
        /// A description of the inconsistency.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/file.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/file.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_invalid_config_displays_item_and_message() {
        let error = EngineError::InvalidConfig {
            item: "scoring_rules[2]".to_string(),
            message: "min_achievement must be below max_achievement".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration item 'scoring_rules[2]': min_achievement must be below max_achievement"
        );
    }

    #[test]
    fn test_invalid_formula_displays_expression_and_message() {
        let error = EngineError::InvalidFormula {
            expression: "actual_km / /".to_string(),
            message: "unexpected '/' at position 12".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid formula 'actual_km / /': unexpected '/' at position 12"
        );
    }

    #[test]
    fn test_invalid_record_displays_entity_id_and_message() {
        let error = EngineError::InvalidRecord {
            entity: "performance".to_string(),
            id: "drv_001".to_string(),
            message: "month 13 is out of range".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid performance 'drv_001': month 13 is out of range"
        );
    }

    #[test]
    fn test_calculation_error_displays_message() {
        let error = EngineError::CalculationError {
            message: "kilometre incentive overflowed".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Calculation error: kilometre incentive overflowed"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_config_not_found() -> EngineResult<()> {
            Err(EngineError::ConfigNotFound {
                path: "/test".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_config_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
