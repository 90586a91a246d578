//! Calculation result models.
//!
//! This module contains the [`IncentiveResult`] type produced by the driver
//! incentive calculator and the audit structures shared by every calculation.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{DriverType, SkippedFormula};

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings mark every place where a missing value or bad configuration item
/// was replaced by a zero or default, so operators can find and fix the
/// underlying data.
///
/// # Example
///
/// ```
/// use incentive_engine::models::AuditWarning;
///
/// let warning = AuditWarning::medium("BUDGET_MISSING", "no budget for local 2025-03");
/// assert_eq!(warning.severity, "medium");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level ("low", "medium", "high").
    pub severity: String,
}

impl AuditWarning {
    /// Creates a warning with an explicit severity.
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: severity.into(),
        }
    }

    /// Creates a low-severity warning.
    pub fn low(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, "low")
    }

    /// Creates a medium-severity warning.
    pub fn medium(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, "medium")
    }

    /// Creates a high-severity warning.
    pub fn high(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, "high")
    }
}

/// The complete audit trace for a calculation.
///
/// # Example
///
/// ```
/// use incentive_engine::models::AuditTrace;
///
/// let trace = AuditTrace::default();
/// assert!(trace.steps.is_empty());
/// assert!(!trace.has_warning("FUEL_TIER_UNMATCHED"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
    /// Formulas that did not contribute a result, with the reason.
    #[serde(default)]
    pub skipped_formulas: Vec<SkippedFormula>,
}

impl AuditTrace {
    /// Returns true if a warning with the given code was recorded.
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}

/// The complete incentive breakdown for one driver-month.
///
/// Natural key: `(driver_id, year, month)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveResult {
    /// The driver the calculation is for.
    pub driver_id: String,
    /// Calendar year.
    pub year: i32,
    /// Calendar month.
    pub month: u32,
    /// The driver's type at calculation time.
    pub driver_type: DriverType,
    /// Fixed monthly salary.
    pub base_salary: Decimal,
    /// Kilometres driven.
    pub actual_km: Decimal,
    /// Per-truck kilometre target derived from the budget.
    pub target_km: Decimal,
    /// Derived incentive rate per kilometre.
    pub rate_per_km: Decimal,
    /// `actual_km * rate_per_km`.
    pub km_incentive: Decimal,
    /// Flat bonus from the fuel-efficiency tiers.
    pub fuel_bonus: Decimal,
    /// Bonus from the `performance_bonus` formula, if configured.
    pub performance_bonus: Decimal,
    /// Bonus from the `safety_bonus` formula, if configured.
    pub safety_bonus: Decimal,
    /// Every formula result, keyed by formula key.
    ///
    /// Informational: this includes the reserved keys and negative results,
    /// which are already counted in `performance_bonus`, `safety_bonus` or
    /// `deductions`. Do not sum it into the total; use
    /// `custom_formula_total`.
    pub custom_formula_results: BTreeMap<String, Decimal>,
    /// The part of the formula results paid as general incentive: the
    /// non-negative results under keys other than `performance_bonus`,
    /// `safety_bonus` and `deductions`.
    ///
    /// `total_incentive = km_incentive + fuel_bonus + performance_bonus +
    /// safety_bonus + custom_formula_total - deductions`.
    pub custom_formula_total: Decimal,
    /// Total deductions, as a positive magnitude.
    pub deductions: Decimal,
    /// Sum of all incentive components less deductions.
    pub total_incentive: Decimal,
    /// `base_salary + total_incentive`.
    pub total_earnings: Decimal,
    /// The version of the engine that performed the calculation.
    pub engine_version: String,
    /// Complete audit trace of calculation decisions.
    pub audit_trace: AuditTrace,
}

impl IncentiveResult {
    /// Returns the natural key callers upsert on.
    pub fn key(&self) -> (&str, i32, u32) {
        (&self.driver_id, self.year, self.month)
    }
}
