//! Batch calculation.
//!
//! Payroll and scorecard runs cover many records at once. Each record is
//! validated and calculated on its own, and a record that fails validation is
//! reported without affecting the others.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::driver_incentive::{
    IncentiveInput, calculate_driver_incentive_with, validate_incentive_input,
};
use super::scorecard::{ScorecardInput, score_employee, validate_scorecard_input};
use crate::error::EngineResult;
use crate::models::{FuelTierDefaults, IncentiveResult, ScorecardResult};

/// A record that could not be calculated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// The identifier of the failed record.
    pub entity_id: String,
    /// Why it failed.
    pub error: String,
}

/// The results of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome<R> {
    /// Results for every record that succeeded, in input order.
    pub results: Vec<R>,
    /// Every record that failed, in input order.
    pub failures: Vec<BatchFailure>,
}

impl<R> BatchOutcome<R> {
    /// Number of records that succeeded.
    pub fn succeeded(&self) -> usize {
        self.results.len()
    }

    /// Number of records that failed.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Runs `calc_fn` over every item, collecting successes and failures.
///
/// # Examples
///
/// ```
/// use incentive_engine::calculation::run_batch;
/// use incentive_engine::error::EngineError;
///
/// let outcome = run_batch(
///     &[2, -1, 4],
///     |n| n.to_string(),
///     |n| {
///         if *n < 0 {
///             Err(EngineError::CalculationError { message: "negative".to_string() })
///         } else {
///             Ok(n * 10)
///         }
///     },
/// );
///
/// assert_eq!(outcome.results, vec![20, 40]);
/// assert_eq!(outcome.failed(), 1);
/// assert_eq!(outcome.failures[0].entity_id, "-1");
/// ```
pub fn run_batch<T, R, I, C>(items: &[T], id_fn: I, calc_fn: C) -> BatchOutcome<R>
where
    I: Fn(&T) -> String,
    C: Fn(&T) -> EngineResult<R>,
{
    let mut outcome = BatchOutcome {
        results: Vec::with_capacity(items.len()),
        failures: Vec::new(),
    };

    for item in items {
        match calc_fn(item) {
            Ok(result) => outcome.results.push(result),
            Err(e) => {
                let entity_id = id_fn(item);
                warn!(entity_id = %entity_id, error = %e, "Batch item failed");
                outcome.failures.push(BatchFailure {
                    entity_id,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        succeeded = outcome.succeeded(),
        failed = outcome.failed(),
        "Batch complete"
    );
    outcome
}

/// Calculates incentives for many driver-months.
pub fn calculate_incentive_batch(
    inputs: &[IncentiveInput],
    fuel_defaults: &FuelTierDefaults,
) -> BatchOutcome<IncentiveResult> {
    run_batch(
        inputs,
        |input| input.driver.id.clone(),
        |input| {
            validate_incentive_input(input)?;
            Ok(calculate_driver_incentive_with(input, fuel_defaults))
        },
    )
}

/// Scores many employee-months.
pub fn score_scorecard_batch(inputs: &[ScorecardInput]) -> BatchOutcome<ScorecardResult> {
    run_batch(
        inputs,
        |input| input.employee_id.clone(),
        |input| {
            validate_scorecard_input(input)?;
            Ok(score_employee(input))
        },
    )
}
