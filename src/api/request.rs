//! Request types for the incentive engine API.
//!
//! Requests carry every record a calculation needs. Fields that fall back to
//! the loaded configuration are `Option`s so an omitted field can be told
//! apart from an explicitly empty one.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::{IncentiveInput, ScorecardInput};
use crate::models::{
    Budget, CustomFormula, Driver, FuelConfig, PerformancePeriod, ScorecardRole, ScoringRule,
    Target,
};

/// Request body for the `/incentives/calculate` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncentiveRequest {
    /// The driver.
    pub driver: Driver,
    /// The driver's performance for the month.
    pub performance: PerformancePeriod,
    /// The budget for the driver's type and month.
    #[serde(default)]
    pub budget: Option<Budget>,
    /// Monthly incentive pool per truck.
    pub divisor: Decimal,
    /// Custom formulas. The configured standing formulas are used when
    /// omitted.
    #[serde(default)]
    pub formulas: Option<Vec<CustomFormula>>,
    /// Fuel bonus configuration. The configured tiers are used when omitted.
    #[serde(default)]
    pub fuel_config: Option<FuelConfig>,
    /// Accidents recorded for the month.
    #[serde(default)]
    pub accident_count: u32,
    /// Incidents recorded for the month.
    #[serde(default)]
    pub incident_count: u32,
    /// Caller-supplied deductions.
    #[serde(default)]
    pub deductions: Decimal,
}

impl IncentiveRequest {
    /// Converts the request into calculator input, filling omitted formulas
    /// from `standing_formulas`.
    pub fn into_input(self, standing_formulas: &[CustomFormula]) -> IncentiveInput {
        IncentiveInput {
            driver: self.driver,
            performance: self.performance,
            budget: self.budget,
            divisor: self.divisor,
            formulas: self
                .formulas
                .unwrap_or_else(|| standing_formulas.to_vec()),
            fuel_config: self.fuel_config,
            accident_count: self.accident_count,
            incident_count: self.incident_count,
            deductions: self.deductions,
        }
    }
}

/// Request body for the `/incentives/batch` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncentiveBatchRequest {
    /// One entry per driver-month.
    pub items: Vec<IncentiveRequest>,
}

/// Request body for the `/scorecards/score` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorecardRequest {
    /// The employee being scored.
    pub employee_id: String,
    /// Calendar year.
    pub year: i32,
    /// Calendar month.
    pub month: u32,
    /// The employee's role.
    pub role: ScorecardRole,
    /// Actual readings keyed by KPI id.
    #[serde(default)]
    pub actuals: BTreeMap<String, Decimal>,
    /// Monthly targets.
    #[serde(default)]
    pub targets: Vec<Target>,
    /// Scoring rules. The configured table is used when omitted.
    #[serde(default)]
    pub scoring_rules: Option<Vec<ScoringRule>>,
}

impl ScorecardRequest {
    /// Converts the request into scorer input with the given rule table.
    pub fn into_input(self, scoring_rules: Vec<ScoringRule>) -> ScorecardInput {
        ScorecardInput {
            employee_id: self.employee_id,
            year: self.year,
            month: self.month,
            role: self.role,
            actuals: self.actuals,
            targets: self.targets,
            scoring_rules,
        }
    }
}

/// Request body for the `/formulas/validate` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaValidationRequest {
    /// The expression to check.
    pub expression: String,
    /// Formula keys that will be available alongside the standard
    /// variables. The configured standing formula keys are always included.
    #[serde(default)]
    pub known_keys: Vec<String>,
}
