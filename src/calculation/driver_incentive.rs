//! Driver incentive calculation.
//!
//! Combines the base computation (budget target, per-km rate, km incentive,
//! fuel bonus) with the custom formula set to produce one driver's monthly
//! [`IncentiveResult`]. Each sub-step that cannot run degrades to a zero
//! contribution and records an [`AuditWarning`], so one bad record never
//! blocks the rest of a payroll run.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::custom_formula::{
    FormulaEvaluation, VAR_ACCIDENT_COUNT, VAR_ACTUAL_KM, VAR_BASE_SALARY, VAR_INCIDENT_COUNT,
    VAR_RATE_PER_KM, VAR_TARGET_KM, evaluate_formulas,
};
use super::fuel_tier::{FuelBonusOutcome, effective_fuel_config, resolve_fuel_bonus};
use super::rate::{checked_rate_per_km, target_per_truck};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrace, AuditWarning, Budget, CustomFormula, Driver, FuelConfig,
    FuelTierDefaults, IncentiveResult, PerformancePeriod, period_start,
};

/// Formula key whose result is paid as the performance bonus.
pub const PERFORMANCE_BONUS_KEY: &str = "performance_bonus";

/// Formula key whose result is paid as the safety bonus.
pub const SAFETY_BONUS_KEY: &str = "safety_bonus";

/// Formula key whose result is added to deductions.
pub const DEDUCTIONS_KEY: &str = "deductions";

/// Everything needed to calculate one driver-month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncentiveInput {
    /// The driver.
    pub driver: Driver,
    /// The driver's performance for the month.
    pub performance: PerformancePeriod,
    /// The budget for the driver's type and month, if one exists.
    #[serde(default)]
    pub budget: Option<Budget>,
    /// Monthly incentive pool per truck.
    pub divisor: Decimal,
    /// Custom formulas to evaluate.
    #[serde(default)]
    pub formulas: Vec<CustomFormula>,
    /// Fuel bonus configuration; the built-in tiers are used when absent.
    #[serde(default)]
    pub fuel_config: Option<FuelConfig>,
    /// Accidents recorded for the month.
    #[serde(default)]
    pub accident_count: u32,
    /// Incidents recorded for the month.
    #[serde(default)]
    pub incident_count: u32,
    /// Deductions supplied by the caller.
    #[serde(default)]
    pub deductions: Decimal,
}

/// Checks that the records in `input` belong together.
///
/// The calculator itself accepts anything; this is for callers, such as the
/// batch runner, that want to reject inconsistent records up front.
///
/// # Errors
///
/// Returns [`EngineError::InvalidRecord`] if the performance record belongs
/// to a different driver, the month is outside 1-12, or the kilometres are
/// negative.
pub fn validate_incentive_input(input: &IncentiveInput) -> EngineResult<()> {
    let performance = &input.performance;
    let invalid = |message: String| EngineError::InvalidRecord {
        entity: "performance".to_string(),
        id: performance.driver_id.clone(),
        message,
    };

    if performance.driver_id != input.driver.id {
        return Err(invalid(format!(
            "belongs to driver '{}', not '{}'",
            performance.driver_id, input.driver.id
        )));
    }
    if period_start(performance.year, performance.month).is_none() {
        return Err(invalid(format!(
            "{}-{} is not a valid month",
            performance.year, performance.month
        )));
    }
    if performance.actual_kilometers < Decimal::ZERO {
        return Err(invalid(format!(
            "actual kilometres {} is negative",
            performance.actual_kilometers
        )));
    }
    Ok(())
}

/// Calculates a driver's monthly incentive using the built-in fuel tiers as
/// the fallback tier set.
///
/// # Examples
///
/// ```
/// use incentive_engine::calculation::{IncentiveInput, calculate_driver_incentive};
/// use incentive_engine::models::{Budget, Driver, DriverType, PerformancePeriod};
/// use rust_decimal::Decimal;
///
/// let input = IncentiveInput {
///     driver: Driver {
///         id: "drv_001".to_string(),
///         name: String::new(),
///         driver_type: DriverType::Local,
///         base_salary: Decimal::new(5000, 0),
///     },
///     performance: PerformancePeriod {
///         driver_id: "drv_001".to_string(),
///         year: 2025,
///         month: 3,
///         actual_kilometers: Decimal::new(3200, 0),
///         trips_completed: 40,
///         fuel_efficiency: Some(Decimal::new(21, 1)),
///         on_time_delivery_rate: None,
///         safety_score: None,
///         customer_rating: None,
///     },
///     budget: Some(Budget {
///         year: 2025,
///         month: 3,
///         driver_type: DriverType::Local,
///         budgeted_kilometers: Decimal::new(60000, 0),
///         truck_count: 5,
///     }),
///     divisor: Decimal::new(10, 0),
///     formulas: vec![],
///     fuel_config: None,
///     accident_count: 0,
///     incident_count: 0,
///     deductions: Decimal::ZERO,
/// };
///
/// let result = calculate_driver_incentive(&input);
/// assert_eq!(result.fuel_bonus, Decimal::new(20, 0));
/// assert_eq!(result.total_earnings.round_dp(2), Decimal::new(502267, 2));
/// ```
pub fn calculate_driver_incentive(input: &IncentiveInput) -> IncentiveResult {
    calculate_driver_incentive_with(input, &FuelTierDefaults::default())
}

/// Calculates a driver's monthly incentive, falling back to `fuel_defaults`
/// when the input carries no usable fuel configuration.
pub fn calculate_driver_incentive_with(
    input: &IncentiveInput,
    fuel_defaults: &FuelTierDefaults,
) -> IncentiveResult {
    let driver = &input.driver;
    let performance = &input.performance;
    let driver_type = driver.driver_type;

    let mut steps: Vec<AuditStep> = Vec::new();
    let mut warnings: Vec<AuditWarning> = Vec::new();
    let mut step_number: u32 = 1;

    // Step 1: budget target
    let budget = match &input.budget {
        Some(b) if b.applies_to(driver_type, performance.year, performance.month) => Some(b),
        Some(b) => {
            warnings.push(AuditWarning::medium(
                "BUDGET_MISMATCH",
                format!(
                    "Budget for {} {}-{:02} does not cover {} {}-{:02}; treated as missing",
                    b.driver_type, b.year, b.month, driver_type, performance.year, performance.month
                ),
            ));
            None
        }
        None => {
            warnings.push(AuditWarning::medium(
                "BUDGET_MISSING",
                format!(
                    "No budget for {} {}-{:02}; km incentive is zero",
                    driver_type, performance.year, performance.month
                ),
            ));
            None
        }
    };

    let (budgeted_km, truck_count) = budget
        .map(|b| (b.budgeted_kilometers, b.truck_count))
        .unwrap_or((Decimal::ZERO, 1));
    if budget.is_some() && truck_count == 0 {
        warnings.push(AuditWarning::medium(
            "TRUCK_COUNT_ZERO",
            format!(
                "Budget for {} {}-{:02} has no trucks; rate is zero",
                driver_type, performance.year, performance.month
            ),
        ));
    }

    let target_km = target_per_truck(budgeted_km, truck_count.max(1));
    steps.push(AuditStep {
        step_number,
        rule_id: "budget_target".to_string(),
        rule_name: "Per-Truck Kilometre Target".to_string(),
        input: serde_json::json!({
            "budget_found": budget.is_some(),
            "budgeted_kilometers": budgeted_km.normalize().to_string(),
            "truck_count": truck_count
        }),
        output: serde_json::json!({
            "target_km": target_km.normalize().to_string()
        }),
        reasoning: if budget.is_some() {
            format!(
                "{} budgeted km / {} trucks = {} km per truck",
                budgeted_km.normalize(),
                truck_count.max(1),
                target_km.normalize()
            )
        } else {
            "No applicable budget, target is zero".to_string()
        },
    });
    step_number += 1;

    // Step 2: rate per km
    let (rate_per_km, rate_overflowed) =
        match checked_rate_per_km(budgeted_km, input.divisor, truck_count) {
            Some(rate) => (rate, false),
            None => {
                warnings.push(AuditWarning::high(
                    "RATE_OVERFLOW",
                    format!(
                        "Divisor {} over target {} km is not representable; rate is zero",
                        input.divisor, target_km
                    ),
                ));
                (Decimal::ZERO, true)
            }
        };
    steps.push(AuditStep {
        step_number,
        rule_id: "rate_per_km".to_string(),
        rule_name: "Rate Per Kilometre".to_string(),
        input: serde_json::json!({
            "divisor": input.divisor.normalize().to_string(),
            "target_km": target_km.normalize().to_string()
        }),
        output: serde_json::json!({
            "rate_per_km": rate_per_km.normalize().to_string()
        }),
        reasoning: if rate_overflowed {
            "Rate is not representable, rate is zero".to_string()
        } else if rate_per_km.is_zero() {
            "Target or divisor is not positive, rate is zero".to_string()
        } else {
            format!(
                "Divisor {} / target {} km",
                input.divisor.normalize(),
                target_km.normalize()
            )
        },
    });
    step_number += 1;

    // Step 3: km incentive
    let actual_km = performance.actual_kilometers;
    let km_incentive = match actual_km.checked_mul(rate_per_km) {
        Some(value) => value,
        None => {
            warnings.push(AuditWarning::high(
                "KM_INCENTIVE_OVERFLOW",
                format!(
                    "{} km at rate {} is not representable; km incentive is zero",
                    actual_km, rate_per_km
                ),
            ));
            Decimal::ZERO
        }
    };
    steps.push(AuditStep {
        step_number,
        rule_id: "km_incentive".to_string(),
        rule_name: "Kilometre Incentive".to_string(),
        input: serde_json::json!({
            "actual_km": actual_km.normalize().to_string(),
            "rate_per_km": rate_per_km.normalize().to_string()
        }),
        output: serde_json::json!({
            "km_incentive": km_incentive.normalize().to_string()
        }),
        reasoning: format!(
            "{} km x {} per km = {}",
            actual_km.normalize(),
            rate_per_km.normalize(),
            km_incentive.round_dp(2)
        ),
    });
    step_number += 1;

    // Step 4: fuel bonus
    let (fuel_config, substituted) =
        effective_fuel_config(input.fuel_config.as_ref(), driver_type, fuel_defaults);
    if substituted {
        warnings.push(AuditWarning::low(
            "FUEL_DEFAULT_TIERS",
            format!("No fuel tiers configured; using built-in {} tiers", driver_type),
        ));
    }
    let fuel = resolve_fuel_bonus(performance.fuel_efficiency, fuel_config, step_number);
    match fuel.outcome {
        FuelBonusOutcome::NoReading => warnings.push(AuditWarning::low(
            "FUEL_READING_MISSING",
            "No fuel efficiency recorded; fuel bonus is zero",
        )),
        FuelBonusOutcome::Disabled => warnings.push(AuditWarning::low(
            "FUEL_BONUS_DISABLED",
            format!("Fuel bonus is disabled for {} drivers", driver_type),
        )),
        FuelBonusOutcome::Unmatched => warnings.push(AuditWarning::low(
            "FUEL_TIER_UNMATCHED",
            format!(
                "Fuel efficiency {} matches no tier; fuel bonus is zero",
                performance
                    .fuel_efficiency
                    .map(|v| v.normalize().to_string())
                    .unwrap_or_default()
            ),
        )),
        FuelBonusOutcome::Matched { .. } => {}
    }
    let fuel_bonus = fuel.bonus;
    steps.push(fuel.audit_step);
    step_number += 1;

    // Step 5-6: custom formulas
    let context = formula_context(input, target_km, rate_per_km);
    let evaluation = evaluate_formulas(&input.formulas, &context, driver_type);
    for failure in evaluation.failures() {
        warnings.push(AuditWarning::medium(
            "FORMULA_FAILED",
            format!(
                "Formula '{}' skipped: {}",
                failure.key,
                failure.detail.as_deref().unwrap_or("evaluation failed")
            ),
        ));
    }
    steps.push(formula_step(&evaluation, step_number));
    step_number += 1;

    // Step 7-8: reserved keys and deductions
    let split = split_formula_results(&evaluation);
    let caller_deductions = input.deductions.abs();
    let deductions = split.deductions.saturating_add(caller_deductions);
    steps.push(AuditStep {
        step_number,
        rule_id: "formula_allocation".to_string(),
        rule_name: "Bonus and Deduction Allocation".to_string(),
        input: serde_json::json!({
            "results": evaluation.results,
            "caller_deductions": caller_deductions.normalize().to_string()
        }),
        output: serde_json::json!({
            "performance_bonus": split.performance_bonus.normalize().to_string(),
            "safety_bonus": split.safety_bonus.normalize().to_string(),
            "custom_formula_total": split.custom_total.normalize().to_string(),
            "deductions": deductions.normalize().to_string()
        }),
        reasoning: format!(
            "'{}' and '{}' paid as bonuses, negative results and '{}' deducted, {} other results paid as incentive",
            PERFORMANCE_BONUS_KEY, SAFETY_BONUS_KEY, DEDUCTIONS_KEY, split.custom_count
        ),
    });
    step_number += 1;

    // Step 9: totals
    let total_incentive = km_incentive
        .saturating_add(fuel_bonus)
        .saturating_add(split.performance_bonus)
        .saturating_add(split.safety_bonus)
        .saturating_add(split.custom_total)
        .saturating_sub(deductions);
    let total_earnings = driver.base_salary.saturating_add(total_incentive);
    steps.push(AuditStep {
        step_number,
        rule_id: "totals".to_string(),
        rule_name: "Incentive Totals".to_string(),
        input: serde_json::json!({
            "base_salary": driver.base_salary.normalize().to_string(),
            "km_incentive": km_incentive.normalize().to_string(),
            "fuel_bonus": fuel_bonus.normalize().to_string(),
            "performance_bonus": split.performance_bonus.normalize().to_string(),
            "safety_bonus": split.safety_bonus.normalize().to_string(),
            "custom_formula_total": split.custom_total.normalize().to_string(),
            "deductions": deductions.normalize().to_string()
        }),
        output: serde_json::json!({
            "total_incentive": total_incentive.normalize().to_string(),
            "total_earnings": total_earnings.normalize().to_string()
        }),
        reasoning: format!(
            "Total incentive {} on base salary {} gives earnings {}",
            total_incentive.round_dp(2),
            driver.base_salary.round_dp(2),
            total_earnings.round_dp(2)
        ),
    });

    IncentiveResult {
        driver_id: driver.id.clone(),
        year: performance.year,
        month: performance.month,
        driver_type,
        base_salary: driver.base_salary,
        actual_km,
        target_km,
        rate_per_km,
        km_incentive,
        fuel_bonus,
        performance_bonus: split.performance_bonus,
        safety_bonus: split.safety_bonus,
        custom_formula_results: evaluation.results,
        custom_formula_total: split.custom_total,
        deductions,
        total_incentive,
        total_earnings,
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        audit_trace: AuditTrace {
            steps,
            warnings,
            skipped_formulas: evaluation.skipped,
        },
    }
}

fn formula_context(
    input: &IncentiveInput,
    target_km: Decimal,
    rate_per_km: Decimal,
) -> HashMap<String, Decimal> {
    HashMap::from([
        (VAR_ACTUAL_KM.to_string(), input.performance.actual_kilometers),
        (VAR_TARGET_KM.to_string(), target_km),
        (VAR_RATE_PER_KM.to_string(), rate_per_km),
        (VAR_BASE_SALARY.to_string(), input.driver.base_salary),
        (VAR_ACCIDENT_COUNT.to_string(), Decimal::from(input.accident_count)),
        (VAR_INCIDENT_COUNT.to_string(), Decimal::from(input.incident_count)),
    ])
}

fn formula_step(evaluation: &FormulaEvaluation, step_number: u32) -> AuditStep {
    AuditStep {
        step_number,
        rule_id: "custom_formulas".to_string(),
        rule_name: "Custom Formulas".to_string(),
        input: serde_json::json!({
            "evaluated": evaluation.evaluation_order.len(),
            "skipped": evaluation.skipped.len()
        }),
        output: serde_json::json!({
            "evaluation_order": evaluation.evaluation_order,
            "skipped": evaluation.skipped
        }),
        reasoning: format!(
            "{} formulas evaluated, {} skipped",
            evaluation.evaluation_order.len(),
            evaluation.skipped.len()
        ),
    }
}

#[derive(Debug, Default)]
struct FormulaSplit {
    performance_bonus: Decimal,
    safety_bonus: Decimal,
    custom_total: Decimal,
    custom_count: usize,
    deductions: Decimal,
}

// Every result lands in exactly one bucket: negative results are deductions,
// reserved keys go to their own component, everything else is paid as
// general incentive.
fn split_formula_results(evaluation: &FormulaEvaluation) -> FormulaSplit {
    let mut split = FormulaSplit::default();
    for (key, value) in &evaluation.results {
        let value = *value;
        if value < Decimal::ZERO {
            split.deductions = split.deductions.saturating_add(value.abs());
            continue;
        }
        match key.as_str() {
            PERFORMANCE_BONUS_KEY => split.performance_bonus = value,
            SAFETY_BONUS_KEY => split.safety_bonus = value,
            DEDUCTIONS_KEY => split.deductions = split.deductions.saturating_add(value),
            _ => {
                split.custom_total = split.custom_total.saturating_add(value);
                split.custom_count += 1;
            }
        }
    }
    split
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DriverType, FormulaScope, FuelEfficiencyTier};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_input() -> IncentiveInput {
        IncentiveInput {
            driver: Driver {
                id: "drv_001".to_string(),
                name: "Sam Carter".to_string(),
                driver_type: DriverType::Local,
                base_salary: dec("5000"),
            },
            performance: PerformancePeriod {
                driver_id: "drv_001".to_string(),
                year: 2025,
                month: 3,
                actual_kilometers: dec("3200"),
                trips_completed: 40,
                fuel_efficiency: Some(dec("2.1")),
                on_time_delivery_rate: None,
                safety_score: None,
                customer_rating: None,
            },
            budget: Some(Budget {
                year: 2025,
                month: 3,
                driver_type: DriverType::Local,
                budgeted_kilometers: dec("60000"),
                truck_count: 5,
            }),
            divisor: dec("10"),
            formulas: vec![],
            fuel_config: None,
            accident_count: 0,
            incident_count: 0,
            deductions: Decimal::ZERO,
        }
    }

    #[test]
    fn test_reference_driver_month() {
        let result = calculate_driver_incentive(&create_input());

        assert_eq!(result.target_km, dec("12000"));
        assert_eq!(result.rate_per_km.round_dp(6), dec("0.000833"));
        assert_eq!(result.km_incentive.round_dp(2), dec("2.67"));
        assert_eq!(result.fuel_bonus, dec("20"));
        assert_eq!(result.performance_bonus, Decimal::ZERO);
        assert_eq!(result.safety_bonus, Decimal::ZERO);
        assert_eq!(result.deductions, Decimal::ZERO);
        assert_eq!(result.total_incentive.round_dp(2), dec("22.67"));
        assert_eq!(result.total_earnings.round_dp(2), dec("5022.67"));
        assert_eq!(result.key(), ("drv_001", 2025, 3));
    }

    #[test]
    fn test_audit_steps_are_numbered_in_order() {
        let result = calculate_driver_incentive(&create_input());
        let rule_ids: Vec<&str> = result
            .audit_trace
            .steps
            .iter()
            .map(|s| s.rule_id.as_str())
            .collect();
        assert_eq!(
            rule_ids,
            vec![
                "budget_target",
                "rate_per_km",
                "km_incentive",
                "fuel_bonus",
                "custom_formulas",
                "formula_allocation",
                "totals"
            ]
        );
        for (i, step) in result.audit_trace.steps.iter().enumerate() {
            assert_eq!(step.step_number, i as u32 + 1);
        }
    }

    #[test]
    fn test_default_tiers_are_reported() {
        let result = calculate_driver_incentive(&create_input());
        assert!(result.audit_trace.has_warning("FUEL_DEFAULT_TIERS"));
    }

    #[test]
    fn test_missing_budget_zeroes_km_incentive() {
        let mut input = create_input();
        input.budget = None;

        let result = calculate_driver_incentive(&input);

        assert_eq!(result.target_km, Decimal::ZERO);
        assert_eq!(result.rate_per_km, Decimal::ZERO);
        assert_eq!(result.km_incentive, Decimal::ZERO);
        assert_eq!(result.fuel_bonus, dec("20"));
        assert_eq!(result.total_earnings, dec("5020"));
        assert!(result.audit_trace.has_warning("BUDGET_MISSING"));
    }

    #[test]
    fn test_budget_for_other_month_is_ignored() {
        let mut input = create_input();
        if let Some(budget) = input.budget.as_mut() {
            budget.month = 4;
        }

        let result = calculate_driver_incentive(&input);

        assert_eq!(result.km_incentive, Decimal::ZERO);
        assert!(result.audit_trace.has_warning("BUDGET_MISMATCH"));
        assert!(!result.audit_trace.has_warning("BUDGET_MISSING"));
    }

    #[test]
    fn test_zero_trucks_zeroes_rate() {
        let mut input = create_input();
        if let Some(budget) = input.budget.as_mut() {
            budget.truck_count = 0;
        }

        let result = calculate_driver_incentive(&input);

        assert_eq!(result.target_km, dec("60000"));
        assert_eq!(result.rate_per_km, Decimal::ZERO);
        assert_eq!(result.km_incentive, Decimal::ZERO);
        assert!(result.audit_trace.has_warning("TRUCK_COUNT_ZERO"));
    }

    #[test]
    fn test_unrepresentable_rate_is_reported() {
        let mut input = create_input();
        input.divisor = Decimal::MAX;
        if let Some(budget) = input.budget.as_mut() {
            budget.budgeted_kilometers = dec("0.0000000001");
            budget.truck_count = 1;
        }

        let result = calculate_driver_incentive(&input);

        assert_eq!(result.rate_per_km, Decimal::ZERO);
        assert_eq!(result.km_incentive, Decimal::ZERO);
        assert!(result.audit_trace.has_warning("RATE_OVERFLOW"));
        let rate_step = &result.audit_trace.steps[1];
        assert_eq!(rate_step.rule_id, "rate_per_km");
        assert!(rate_step.reasoning.contains("not representable"));
    }

    #[test]
    fn test_ordinary_zero_rate_is_not_an_overflow() {
        let mut input = create_input();
        input.divisor = Decimal::ZERO;

        let result = calculate_driver_incentive(&input);

        assert_eq!(result.rate_per_km, Decimal::ZERO);
        assert!(!result.audit_trace.has_warning("RATE_OVERFLOW"));
        assert!(result.audit_trace.steps[1].reasoning.contains("not positive"));
    }

    #[test]
    fn test_missing_fuel_reading_pays_no_fuel_bonus() {
        let mut input = create_input();
        input.performance.fuel_efficiency = None;

        let result = calculate_driver_incentive(&input);

        assert_eq!(result.fuel_bonus, Decimal::ZERO);
        assert!(result.audit_trace.has_warning("FUEL_READING_MISSING"));
    }

    #[test]
    fn test_unmatched_fuel_reading_is_reported() {
        let mut input = create_input();
        input.fuel_config = Some(FuelConfig::enabled(vec![
            FuelEfficiencyTier::new(dec("1.5"), dec("2.0"), dec("10")),
            FuelEfficiencyTier::new(dec("2.0"), dec("2.5"), dec("20")),
        ]));
        input.performance.fuel_efficiency = Some(dec("2.6"));

        let result = calculate_driver_incentive(&input);

        assert_eq!(result.fuel_bonus, Decimal::ZERO);
        assert!(result.audit_trace.has_warning("FUEL_TIER_UNMATCHED"));
        assert!(!result.audit_trace.has_warning("FUEL_DEFAULT_TIERS"));
    }

    #[test]
    fn test_disabled_fuel_config_is_reported() {
        let mut input = create_input();
        input.fuel_config = Some(FuelConfig {
            enabled: false,
            tiers: vec![],
        });

        let result = calculate_driver_incentive(&input);

        assert_eq!(result.fuel_bonus, Decimal::ZERO);
        assert!(result.audit_trace.has_warning("FUEL_BONUS_DISABLED"));
    }

    #[test]
    fn test_configured_defaults_are_used() {
        let mut defaults = FuelTierDefaults::default();
        defaults.local = FuelConfig::enabled(vec![FuelEfficiencyTier::new(
            dec("2.0"),
            dec("3.0"),
            dec("99"),
        )]);

        let result = calculate_driver_incentive_with(&create_input(), &defaults);
        assert_eq!(result.fuel_bonus, dec("99"));
    }

    #[test]
    fn test_reserved_formulas_feed_bonus_components() {
        let mut input = create_input();
        input.accident_count = 1;
        input.formulas = vec![
            CustomFormula::new(PERFORMANCE_BONUS_KEY, "100", 1),
            CustomFormula::new(SAFETY_BONUS_KEY, "50 - accident_count * 50", 2),
            CustomFormula::new("trip_bonus", "actual_km / 320", 3),
        ];

        let result = calculate_driver_incentive(&input);

        assert_eq!(result.performance_bonus, dec("100"));
        assert_eq!(result.safety_bonus, Decimal::ZERO);
        assert_eq!(result.custom_formula_total, dec("10"));
        assert_eq!(result.custom_formula_results.len(), 3);
        // 2.67 + 20 + 100 + 0 + 10
        assert_eq!(result.total_incentive.round_dp(2), dec("132.67"));
    }

    #[test]
    fn test_total_is_rebuilt_from_component_fields() {
        let mut input = create_input();
        input.accident_count = 1;
        input.deductions = dec("7.5");
        input.formulas = vec![
            CustomFormula::new(PERFORMANCE_BONUS_KEY, "100", 1),
            CustomFormula::new(SAFETY_BONUS_KEY, "50 - accident_count * 50", 2),
            CustomFormula::new("trip_bonus", "actual_km / 320", 3),
            CustomFormula::new("late_penalty", "0 - 12", 4),
            CustomFormula::new(DEDUCTIONS_KEY, "3", 5),
        ];

        let result = calculate_driver_incentive(&input);

        let rebuilt = result.km_incentive
            + result.fuel_bonus
            + result.performance_bonus
            + result.safety_bonus
            + result.custom_formula_total
            - result.deductions;
        assert_eq!(result.total_incentive, rebuilt);
        assert_eq!(result.total_earnings, result.base_salary + rebuilt);

        // The raw map still lists reserved and negative results
        let raw_sum: Decimal = result.custom_formula_results.values().copied().sum();
        assert_ne!(raw_sum, result.custom_formula_total);
        assert_eq!(result.custom_formula_total, dec("10"));
        assert_eq!(result.deductions, dec("22.5"));
    }

    #[test]
    fn test_negative_results_and_deductions_are_deducted_once() {
        let mut input = create_input();
        input.incident_count = 2;
        input.deductions = dec("-5");
        input.formulas = vec![
            CustomFormula::new("incident_penalty", "incident_count * -10", 1),
            CustomFormula::new(DEDUCTIONS_KEY, "7.5", 2),
            CustomFormula::new(SAFETY_BONUS_KEY, "-3", 3),
        ];

        let result = calculate_driver_incentive(&input);

        // 20 + 7.5 + 3 from formulas, 5 from the caller
        assert_eq!(result.deductions, dec("35.5"));
        assert_eq!(result.safety_bonus, Decimal::ZERO);
        assert_eq!(result.custom_formula_total, Decimal::ZERO);
        assert_eq!(result.total_incentive.round_dp(2), dec("-12.83"));
    }

    #[test]
    fn test_failed_formula_degrades_to_zero() {
        let mut input = create_input();
        input.formulas = vec![
            CustomFormula::new("broken", "actual_km / /", 1),
            CustomFormula::new("trip_bonus", "5", 2),
        ];

        let result = calculate_driver_incentive(&input);

        assert_eq!(result.custom_formula_total, dec("5"));
        assert!(result.audit_trace.has_warning("FORMULA_FAILED"));
        assert_eq!(result.audit_trace.skipped_formulas.len(), 1);
        assert_eq!(result.total_incentive.round_dp(2), dec("27.67"));
    }

    #[test]
    fn test_formulas_scoped_to_other_driver_type_are_skipped() {
        let mut input = create_input();
        let mut export_bonus = CustomFormula::new("border_bonus", "50", 1);
        export_bonus.scope = FormulaScope::Export;
        input.formulas = vec![export_bonus];

        let result = calculate_driver_incentive(&input);

        assert_eq!(result.custom_formula_total, Decimal::ZERO);
        assert!(!result.audit_trace.has_warning("FORMULA_FAILED"));
        assert_eq!(result.audit_trace.skipped_formulas.len(), 1);
    }

    #[test]
    fn test_recalculation_is_identical() {
        let mut input = create_input();
        input.formulas = vec![CustomFormula::new("trip_bonus", "actual_km * rate_per_km", 1)];

        let first = calculate_driver_incentive(&input);
        let second = calculate_driver_incentive(&input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_validate_input_accepts_consistent_records() {
        assert!(validate_incentive_input(&create_input()).is_ok());
    }

    #[test]
    fn test_validate_input_rejects_other_driver() {
        let mut input = create_input();
        input.performance.driver_id = "drv_999".to_string();

        let err = validate_incentive_input(&input).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRecord { .. }));
        assert!(err.to_string().contains("drv_999"));
    }

    #[test]
    fn test_validate_input_rejects_bad_month() {
        let mut input = create_input();
        input.performance.month = 13;
        assert!(validate_incentive_input(&input).is_err());
    }

    #[test]
    fn test_validate_input_rejects_negative_kilometres() {
        let mut input = create_input();
        input.performance.actual_kilometers = dec("-1");
        assert!(validate_incentive_input(&input).is_err());
    }
}
