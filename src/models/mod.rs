//! Core data models for the incentive and scorecard engine.
//!
//! This module contains the input records the engine calculates over and the
//! result types it returns.

mod calculation_result;
mod driver;
mod formula;
mod fuel;
mod performance;
mod scorecard;

pub use calculation_result::{AuditStep, AuditTrace, AuditWarning, IncentiveResult};
pub use driver::{Driver, DriverType};
pub use formula::{CustomFormula, FormulaOutcome, FormulaScope, SkipReason, SkippedFormula};
pub use fuel::{FuelConfig, FuelEfficiencyTier, FuelTierDefaults};
pub use performance::{Budget, PerformancePeriod, period_start};
pub use scorecard::{
    Kpi, Kra, KraScore, Rating, ScorecardEntry, ScorecardResult, ScorecardRole,
    ScorecardSummary, ScoringRule, Target, TargetDirection, TargetSource, default_scoring_rules,
};
