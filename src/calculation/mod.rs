//! Calculation logic for the incentive and scorecard engine.
//!
//! This module contains the driver incentive pipeline (budget target, per-km
//! rate, fuel-efficiency bonus, custom formulas) and the employee scorecard
//! pipeline (achievement percentage, score banding, weighted roll-up and
//! rating), plus a batch runner over both.
//!
//! Every function here is pure: inputs are passed in, nothing is fetched or
//! persisted.

mod achievement;
mod batch;
mod custom_formula;
mod driver_incentive;
mod expression;
mod fuel_tier;
mod rate;
mod scorecard;
mod scoring_bands;

pub use achievement::calculate_achievement;
pub use batch::{
    BatchFailure, BatchOutcome, calculate_incentive_batch, run_batch, score_scorecard_batch,
};
pub use custom_formula::{
    FormulaCheck, FormulaEvaluation, STANDARD_VARIABLES, VAR_ACCIDENT_COUNT, VAR_ACTUAL_KM,
    VAR_BASE_SALARY, VAR_INCIDENT_COUNT, VAR_RATE_PER_KM, VAR_TARGET_KM, evaluate_formulas,
    validate_formula,
};
pub use driver_incentive::{
    DEDUCTIONS_KEY, IncentiveInput, PERFORMANCE_BONUS_KEY, SAFETY_BONUS_KEY,
    calculate_driver_incentive, calculate_driver_incentive_with, validate_incentive_input,
};
pub use expression::{
    BinaryOp, Expr, Expression, FormulaError, MAX_EXPRESSION_LENGTH, MAX_NESTING_DEPTH,
};
pub use fuel_tier::{FuelBonusOutcome, FuelBonusResult, effective_fuel_config, resolve_fuel_bonus};
pub use rate::{checked_rate_per_km, derive_rate_per_km, target_per_truck};
pub use scorecard::{ScorecardInput, score_employee, validate_scorecard_input};
pub use scoring_bands::{RATING_BANDS, get_final_rating, lookup_score};
