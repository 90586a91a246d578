//! Custom formula evaluation.
//!
//! Active formulas that apply to the driver's type are evaluated in
//! ascending priority order. Each formula sees the standard variables plus
//! the results of every formula evaluated before it, so later formulas can
//! build on earlier ones. A formula that fails is skipped and evaluation
//! continues with the rest.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::expression::Expression;
use crate::error::{EngineError, EngineResult};
use crate::models::{CustomFormula, DriverType, FormulaOutcome, SkipReason, SkippedFormula};

/// Kilometres driven in the month.
pub const VAR_ACTUAL_KM: &str = "actual_km";
/// Per-truck kilometre target.
pub const VAR_TARGET_KM: &str = "target_km";
/// Derived incentive rate per kilometre.
pub const VAR_RATE_PER_KM: &str = "rate_per_km";
/// The driver's monthly salary.
pub const VAR_BASE_SALARY: &str = "base_salary";
/// Accidents recorded for the month.
pub const VAR_ACCIDENT_COUNT: &str = "accident_count";
/// Incidents recorded for the month.
pub const VAR_INCIDENT_COUNT: &str = "incident_count";

/// Variables always present in the formula context.
pub const STANDARD_VARIABLES: [&str; 6] = [
    VAR_ACTUAL_KM,
    VAR_TARGET_KM,
    VAR_RATE_PER_KM,
    VAR_BASE_SALARY,
    VAR_ACCIDENT_COUNT,
    VAR_INCIDENT_COUNT,
];

/// The outcome of evaluating a formula set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaEvaluation {
    /// Every successful result, keyed by formula key.
    pub results: BTreeMap<String, Decimal>,
    /// Successful results in the order they were evaluated.
    pub evaluation_order: Vec<FormulaOutcome>,
    /// Formulas that did not produce a result.
    pub skipped: Vec<SkippedFormula>,
}

impl FormulaEvaluation {
    /// Returns the failed formulas only.
    pub fn failures(&self) -> impl Iterator<Item = &SkippedFormula> {
        self.skipped.iter().filter(|s| s.is_failure())
    }
}

/// Evaluates `formulas` for a driver of `driver_type`.
///
/// # Examples
///
/// ```
/// use incentive_engine::calculation::evaluate_formulas;
/// use incentive_engine::models::{CustomFormula, DriverType};
/// use rust_decimal::Decimal;
/// use std::collections::HashMap;
///
/// let formulas = vec![
///     CustomFormula::new("b", "a + 1", 2),
///     CustomFormula::new("a", "actual_km / 10", 1),
/// ];
/// let mut context = HashMap::new();
/// context.insert("actual_km".to_string(), Decimal::new(200, 0));
///
/// let evaluation = evaluate_formulas(&formulas, &context, DriverType::Local);
/// assert_eq!(evaluation.results["a"], Decimal::new(20, 0));
/// assert_eq!(evaluation.results["b"], Decimal::new(21, 0));
/// ```
pub fn evaluate_formulas(
    formulas: &[CustomFormula],
    context: &HashMap<String, Decimal>,
    driver_type: DriverType,
) -> FormulaEvaluation {
    let mut evaluation = FormulaEvaluation::default();

    let mut selected: Vec<&CustomFormula> = Vec::with_capacity(formulas.len());
    for formula in formulas {
        if !formula.is_active {
            evaluation
                .skipped
                .push(SkippedFormula::new(&formula.key, SkipReason::Inactive));
        } else if !formula.applies_to(driver_type) {
            evaluation
                .skipped
                .push(SkippedFormula::new(&formula.key, SkipReason::NotApplicable));
        } else {
            selected.push(formula);
        }
    }
    // sort_by_key is stable, so equal priorities keep their input order
    selected.sort_by_key(|f| f.priority);

    let mut variables = context.clone();
    for formula in selected {
        let outcome = Expression::parse(&formula.expression)
            .and_then(|expr| expr.evaluate(&variables));
        match outcome {
            Ok(value) => {
                variables.insert(formula.key.clone(), value);
                evaluation.results.insert(formula.key.clone(), value);
                evaluation.evaluation_order.push(FormulaOutcome {
                    key: formula.key.clone(),
                    value,
                });
            }
            Err(e) => {
                warn!(
                    formula = %formula.key,
                    expression = %formula.expression,
                    error = %e,
                    "Skipping custom formula"
                );
                evaluation
                    .skipped
                    .push(SkippedFormula::failed(&formula.key, e.to_string()));
            }
        }
    }

    evaluation
}

/// The result of checking a formula without evaluating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaCheck {
    /// Every variable the expression references, sorted.
    pub variables: Vec<String>,
    /// Referenced variables that are neither standard variables nor known
    /// formula keys.
    pub unknown_variables: Vec<String>,
}

impl FormulaCheck {
    /// Returns true if every referenced variable is known.
    pub fn is_resolvable(&self) -> bool {
        self.unknown_variables.is_empty()
    }
}

/// Parses `expression` and lists the variables it references.
///
/// `known_keys` are formula keys that will be available at evaluation time in
/// addition to [`STANDARD_VARIABLES`].
///
/// # Errors
///
/// Returns [`EngineError::InvalidFormula`] if the expression does not parse.
///
/// # Examples
///
/// ```
/// use incentive_engine::calculation::validate_formula;
///
/// let check = validate_formula("actual_km * bonus_rate", &[]).unwrap();
/// assert_eq!(check.variables, vec!["actual_km", "bonus_rate"]);
/// assert_eq!(check.unknown_variables, vec!["bonus_rate"]);
///
/// assert!(validate_formula("actual_km * ", &[]).is_err());
/// ```
pub fn validate_formula(expression: &str, known_keys: &[&str]) -> EngineResult<FormulaCheck> {
    let parsed = Expression::parse(expression).map_err(|e| EngineError::InvalidFormula {
        expression: expression.to_string(),
        message: e.to_string(),
    })?;

    let variables: Vec<String> = parsed.variables().into_iter().map(String::from).collect();
    let unknown_variables = variables
        .iter()
        .filter(|v| !STANDARD_VARIABLES.contains(&v.as_str()) && !known_keys.contains(&v.as_str()))
        .cloned()
        .collect();

    Ok(FormulaCheck {
        variables,
        unknown_variables,
    })
}
