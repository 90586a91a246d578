//! Employee scorecard scoring.
//!
//! Walks a role's KRA → KPI hierarchy for one employee-month: resolves each
//! KPI's target, converts the actual reading into an achievement percentage,
//! bands it into a score, and rolls the weighted scores up into a total and
//! a rating.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::achievement::calculate_achievement;
use super::scoring_bands::{get_final_rating, lookup_score};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditWarning, Kpi, KraScore, ScorecardEntry, ScorecardResult, ScorecardRole, ScoringRule,
    Target, TargetSource, default_scoring_rules, period_start,
};

/// Everything needed to score one employee-month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorecardInput {
    /// The employee being scored.
    pub employee_id: String,
    /// Calendar year.
    pub year: i32,
    /// Calendar month.
    pub month: u32,
    /// The employee's role with its KRAs and KPIs.
    pub role: ScorecardRole,
    /// Actual readings keyed by KPI id.
    #[serde(default)]
    pub actuals: BTreeMap<String, Decimal>,
    /// Monthly targets. Only those for this year and month are used.
    #[serde(default)]
    pub targets: Vec<Target>,
    /// Achievement → score table.
    #[serde(default = "default_scoring_rules")]
    pub scoring_rules: Vec<ScoringRule>,
}

/// Rejects scorecard inputs that do not name an employee or a real month.
///
/// # Errors
///
/// Returns [`EngineError::InvalidRecord`] describing the problem.
pub fn validate_scorecard_input(input: &ScorecardInput) -> EngineResult<()> {
    let invalid = |message: String| EngineError::InvalidRecord {
        entity: "scorecard".to_string(),
        id: input.employee_id.clone(),
        message,
    };

    if input.employee_id.trim().is_empty() {
        return Err(invalid("employee id is empty".to_string()));
    }
    if period_start(input.year, input.month).is_none() {
        return Err(invalid(format!(
            "{}-{} is not a valid month",
            input.year, input.month
        )));
    }
    Ok(())
}

/// Scores one employee-month.
///
/// # Examples
///
/// ```
/// use incentive_engine::calculation::{ScorecardInput, score_employee};
/// use incentive_engine::models::{
///     Kpi, Kra, Rating, ScorecardRole, TargetDirection, default_scoring_rules,
/// };
/// use rust_decimal::Decimal;
/// use std::collections::BTreeMap;
///
/// let kpi = |id: &str| Kpi {
///     id: id.to_string(),
///     name: String::new(),
///     weighting: Decimal::new(50, 0),
///     target_direction: TargetDirection::HigherBetter,
///     unit: String::new(),
///     default_target: Some(Decimal::new(100, 0)),
/// };
/// let role = ScorecardRole {
///     id: "dispatcher".to_string(),
///     name: String::new(),
///     kras: vec![Kra {
///         id: "ops".to_string(),
///         name: String::new(),
///         weighting: Decimal::new(100, 0),
///         kpis: vec![kpi("on_time"), kpi("accuracy")],
///     }],
/// };
/// let actuals = BTreeMap::from([
///     ("on_time".to_string(), Decimal::new(95, 0)),
///     ("accuracy".to_string(), Decimal::new(92, 0)),
/// ]);
///
/// let result = score_employee(&ScorecardInput {
///     employee_id: "emp_001".to_string(),
///     year: 2025,
///     month: 3,
///     role,
///     actuals,
///     targets: vec![],
///     scoring_rules: default_scoring_rules(),
/// });
///
/// assert_eq!(result.total_weighted_score, Decimal::new(80, 0));
/// assert_eq!(result.rating, Rating::VeryGood);
/// ```
pub fn score_employee(input: &ScorecardInput) -> ScorecardResult {
    let mut warnings: Vec<AuditWarning> = Vec::new();

    let kra_weights = weighting_sum(input.role.kras.iter().map(|kra| kra.weighting));
    if kra_weights != Decimal::ONE_HUNDRED {
        warnings.push(AuditWarning::low(
            "KRA_WEIGHTING_SUM",
            format!(
                "KRA weightings for role '{}' sum to {}, not 100",
                input.role.id,
                kra_weights.normalize()
            ),
        ));
    }

    let mut kra_scores = Vec::with_capacity(input.role.kras.len());
    let mut total_weighted_score = Decimal::ZERO;

    for kra in &input.role.kras {
        let kpi_weights = weighting_sum(kra.kpis.iter().map(|kpi| kpi.weighting));
        if kpi_weights != Decimal::ONE_HUNDRED {
            warnings.push(AuditWarning::low(
                "KPI_WEIGHTING_SUM",
                format!(
                    "KPI weightings for KRA '{}' sum to {}, not 100",
                    kra.id,
                    kpi_weights.normalize()
                ),
            ));
        }

        let mut kpi_scores = Vec::with_capacity(kra.kpis.len());
        let mut kra_weighted_score = Decimal::ZERO;

        for kpi in &kra.kpis {
            let Some(&actual_value) = input.actuals.get(&kpi.id) else {
                warnings.push(AuditWarning::low(
                    "ACTUAL_MISSING",
                    format!("No actual recorded for KPI '{}'; scored as zero", kpi.id),
                ));
                continue;
            };

            let entry = score_kpi(input, kpi, actual_value, &mut warnings);
            kra_weighted_score = kra_weighted_score.saturating_add(entry.weighted_score);
            kpi_scores.push(entry);
        }

        let final_kra_score = percent_of(kra_weighted_score, kra.weighting);
        total_weighted_score = total_weighted_score.saturating_add(final_kra_score);

        kra_scores.push(KraScore {
            kra_id: kra.id.clone(),
            kra_name: kra.name.clone(),
            weighting: kra.weighting,
            kpi_scores,
            kra_weighted_score,
            final_kra_score,
        });
    }

    ScorecardResult {
        employee_id: input.employee_id.clone(),
        role_id: input.role.id.clone(),
        year: input.year,
        month: input.month,
        kra_scores,
        total_weighted_score,
        rating: get_final_rating(total_weighted_score),
        warnings,
    }
}

fn score_kpi(
    input: &ScorecardInput,
    kpi: &Kpi,
    actual_value: Decimal,
    warnings: &mut Vec<AuditWarning>,
) -> ScorecardEntry {
    let (target_value, target_source) = resolve_target(input, kpi);
    if target_source == TargetSource::Missing {
        warnings.push(AuditWarning::medium(
            "TARGET_MISSING",
            format!(
                "No target for KPI '{}' in {}-{:02}; target taken as zero",
                kpi.id, input.year, input.month
            ),
        ));
    }

    let achievement_percentage = calculate_achievement(actual_value, target_value, kpi.target_direction);
    let score = match lookup_score(achievement_percentage, &input.scoring_rules) {
        Some(score) => score,
        None => {
            warn!(
                employee_id = %input.employee_id,
                kpi_id = %kpi.id,
                achievement = %achievement_percentage,
                "No scoring rule matched"
            );
            warnings.push(AuditWarning::medium(
                "SCORE_BAND_UNMATCHED",
                format!(
                    "Achievement {}% for KPI '{}' matches no scoring rule; score is zero",
                    achievement_percentage.round_dp(2),
                    kpi.id
                ),
            ));
            Decimal::ZERO
        }
    };

    ScorecardEntry {
        employee_id: input.employee_id.clone(),
        kpi_id: kpi.id.clone(),
        year: input.year,
        month: input.month,
        actual_value,
        target_value,
        target_source,
        achievement_percentage,
        score,
        weighted_score: percent_of(score, kpi.weighting),
    }
}

fn resolve_target(input: &ScorecardInput, kpi: &Kpi) -> (Decimal, TargetSource) {
    let monthly = input
        .targets
        .iter()
        .find(|t| t.kpi_id == kpi.id && t.year == input.year && t.month == input.month);

    match (monthly, kpi.default_target) {
        (Some(target), _) => (target.target_value, TargetSource::Monthly),
        (None, Some(default)) => (default, TargetSource::Default),
        (None, None) => (Decimal::ZERO, TargetSource::Missing),
    }
}

fn weighting_sum(weightings: impl Iterator<Item = Decimal>) -> Decimal {
    weightings.fold(Decimal::ZERO, |acc, w| acc.saturating_add(w))
}

// value * weighting / 100
fn percent_of(value: Decimal, weighting: Decimal) -> Decimal {
    value.saturating_mul(weighting) / Decimal::ONE_HUNDRED
}
