//! Custom formula records.
//!
//! Formulas are operator-authored arithmetic expressions that extend the
//! incentive calculation. They are evaluated in ascending priority order and
//! each result becomes a variable for the formulas after it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::DriverType;

/// Which drivers a formula applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaScope {
    /// Every driver.
    All,
    /// Local drivers only.
    Local,
    /// Export drivers only.
    Export,
}

impl FormulaScope {
    /// Returns true if a formula with this scope applies to `driver_type`.
    pub fn includes(&self, driver_type: DriverType) -> bool {
        match self {
            FormulaScope::All => true,
            FormulaScope::Local => driver_type == DriverType::Local,
            FormulaScope::Export => driver_type == DriverType::Export,
        }
    }
}

/// A user-authored formula.
///
/// # Example
///
/// ```
/// use incentive_engine::models::{CustomFormula, DriverType, FormulaScope};
///
/// let formula = CustomFormula::new("trip_bonus", "actual_km * 0.01", 1);
/// assert!(formula.applies_to(DriverType::Export));
/// assert_eq!(formula.scope, FormulaScope::All);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFormula {
    /// Variable name the result is published under.
    pub key: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Arithmetic expression over named variables.
    pub expression: String,
    /// Driver types this formula applies to.
    #[serde(rename = "applies_to", default = "default_scope")]
    pub scope: FormulaScope,
    /// Evaluation order; lower runs first.
    #[serde(default)]
    pub priority: i32,
    /// Inactive formulas are skipped.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_scope() -> FormulaScope {
    FormulaScope::All
}

fn default_active() -> bool {
    true
}

impl CustomFormula {
    /// Creates an active formula that applies to all drivers.
    pub fn new(key: impl Into<String>, expression: impl Into<String>, priority: i32) -> Self {
        let key = key.into();
        Self {
            name: key.clone(),
            key,
            expression: expression.into(),
            scope: FormulaScope::All,
            priority,
            is_active: true,
        }
    }

    /// Returns true if this formula applies to `driver_type`.
    pub fn applies_to(&self, driver_type: DriverType) -> bool {
        self.scope.includes(driver_type)
    }
}

/// One evaluated formula result, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaOutcome {
    /// The formula key.
    pub key: String,
    /// The computed value.
    pub value: Decimal,
}

/// Why a formula did not contribute a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The formula is switched off.
    Inactive,
    /// The formula is scoped to a different driver type.
    NotApplicable,
    /// The formula failed to parse or evaluate.
    Failed,
}

/// A formula that was left out of the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFormula {
    /// The formula key.
    pub key: String,
    /// Why it was skipped.
    pub reason: SkipReason,
    /// The parse or evaluation error, for failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SkippedFormula {
    /// Creates a skip record without detail.
    pub fn new(key: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            key: key.into(),
            reason,
            detail: None,
        }
    }

    /// Creates a failure record carrying the error message.
    pub fn failed(key: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: SkipReason::Failed,
            detail: Some(detail.into()),
        }
    }

    /// Returns true if the formula was skipped because it failed.
    pub fn is_failure(&self) -> bool {
        self.reason == SkipReason::Failed
    }
}
