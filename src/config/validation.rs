//! Load-boundary validation of dynamic configuration.
//!
//! Fuel tiers, scoring rules and formulas are operator-entered. Each
//! validator takes the raw items, drops the ones the engine cannot use, and
//! returns the survivors together with one [`AuditWarning`] per issue. None
//! of them fail outright.

use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::warn;

use crate::calculation::validate_formula;
use crate::error::EngineError;
use crate::models::{
    AuditWarning, CustomFormula, FuelConfig, FuelEfficiencyTier, ScoringRule, default_scoring_rules,
};

fn issue(code: &str, severity: &str, item: String, message: String) -> AuditWarning {
    let error = EngineError::InvalidConfig { item, message };
    warn!(code, error = %error, "Configuration issue");
    AuditWarning::new(code, error.to_string(), severity)
}

/// Validates one driver type's fuel tiers.
///
/// Tiers with `min >= max` or a negative bonus are dropped, as is any tier
/// overlapping a tier kept before it. `label` names the tier set in
/// warnings (e.g. "local").
///
/// # Examples
///
/// ```
/// use incentive_engine::config::validate_fuel_config;
/// use incentive_engine::models::{FuelConfig, FuelEfficiencyTier};
/// use rust_decimal::Decimal;
///
/// let config = FuelConfig::enabled(vec![
///     FuelEfficiencyTier::new(Decimal::new(15, 1), Decimal::new(20, 1), Decimal::new(10, 0)),
///     FuelEfficiencyTier::new(Decimal::new(25, 1), Decimal::new(20, 1), Decimal::new(20, 0)),
/// ]);
///
/// let (cleaned, warnings) = validate_fuel_config("local", config);
/// assert_eq!(cleaned.tiers.len(), 1);
/// assert_eq!(warnings[0].code, "INVALID_FUEL_TIER");
/// ```
pub fn validate_fuel_config(label: &str, config: FuelConfig) -> (FuelConfig, Vec<AuditWarning>) {
    let mut warnings = Vec::new();
    let mut kept: Vec<FuelEfficiencyTier> = Vec::with_capacity(config.tiers.len());

    for (index, tier) in config.tiers.into_iter().enumerate() {
        let item = format!("fuel_tiers.{}[{}]", label, index);
        if tier.min_efficiency >= tier.max_efficiency {
            warnings.push(issue(
                "INVALID_FUEL_TIER",
                "high",
                item,
                format!(
                    "minimum {} is not below maximum {}; tier dropped",
                    tier.min_efficiency, tier.max_efficiency
                ),
            ));
            continue;
        }
        if tier.bonus_amount < Decimal::ZERO {
            warnings.push(issue(
                "INVALID_FUEL_TIER",
                "high",
                item,
                format!("bonus {} is negative; tier dropped", tier.bonus_amount),
            ));
            continue;
        }
        let overlaps = kept.iter().any(|k| {
            tier.min_efficiency < k.max_efficiency && k.min_efficiency < tier.max_efficiency
        });
        if overlaps {
            warnings.push(issue(
                "FUEL_TIER_OVERLAP",
                "medium",
                item,
                format!(
                    "[{}, {}) overlaps an earlier tier; tier dropped",
                    tier.min_efficiency, tier.max_efficiency
                ),
            ));
            continue;
        }
        kept.push(tier);
    }

    if config.enabled && kept.is_empty() {
        warnings.push(AuditWarning::low(
            "FUEL_TIERS_EMPTY",
            format!("No usable {} fuel tiers; built-in tiers will be used", label),
        ));
    }

    (
        FuelConfig {
            enabled: config.enabled,
            tiers: kept,
        },
        warnings,
    )
}

/// Validates the achievement → score table.
///
/// Rules with `min >= max` or a score outside 0-100 are dropped, as is any
/// rule overlapping a rule kept before it. Survivors are ordered by lower
/// bound so the last rule is the top band. Gaps between bands are warned
/// about but kept. An empty result falls back to the built-in table.
pub fn validate_scoring_rules(rules: Vec<ScoringRule>) -> (Vec<ScoringRule>, Vec<AuditWarning>) {
    let mut warnings = Vec::new();
    let mut kept: Vec<ScoringRule> = Vec::with_capacity(rules.len());

    for (index, rule) in rules.into_iter().enumerate() {
        let item = format!("scoring_rules[{}]", index);
        if rule.min_achievement >= rule.max_achievement {
            warnings.push(issue(
                "INVALID_SCORING_RULE",
                "high",
                item,
                format!(
                    "minimum {} is not below maximum {}; rule dropped",
                    rule.min_achievement, rule.max_achievement
                ),
            ));
            continue;
        }
        if rule.score < Decimal::ZERO || rule.score > Decimal::ONE_HUNDRED {
            warnings.push(issue(
                "INVALID_SCORING_RULE",
                "high",
                item,
                format!("score {} is outside 0-100; rule dropped", rule.score),
            ));
            continue;
        }
        let overlaps = kept.iter().any(|k| {
            rule.min_achievement < k.max_achievement && k.min_achievement < rule.max_achievement
        });
        if overlaps {
            warnings.push(issue(
                "SCORING_RULE_OVERLAP",
                "medium",
                item,
                format!(
                    "[{}, {}) overlaps an earlier rule; rule dropped",
                    rule.min_achievement, rule.max_achievement
                ),
            ));
            continue;
        }
        kept.push(rule);
    }

    if kept.is_empty() {
        warnings.push(AuditWarning::high(
            "SCORING_RULES_EMPTY",
            "No usable scoring rules; built-in table will be used",
        ));
        return (default_scoring_rules(), warnings);
    }

    kept.sort_by(|a, b| a.min_achievement.cmp(&b.min_achievement));
    for pair in kept.windows(2) {
        if pair[0].max_achievement < pair[1].min_achievement {
            warnings.push(AuditWarning::low(
                "SCORING_RULE_GAP",
                format!(
                    "No scoring rule covers achievement from {} to {}",
                    pair[0].max_achievement, pair[1].min_achievement
                ),
            ));
        }
    }

    (kept, warnings)
}

/// Validates custom formulas.
///
/// Formulas that do not parse are dropped, as are later formulas reusing a
/// key. Formulas referencing a variable that is neither a standard variable
/// nor another formula's key are kept with a warning, since they will fail
/// at evaluation time.
pub fn validate_formulas(formulas: Vec<CustomFormula>) -> (Vec<CustomFormula>, Vec<AuditWarning>) {
    let mut warnings = Vec::new();
    let known_keys: Vec<String> = formulas.iter().map(|f| f.key.clone()).collect();
    let known: Vec<&str> = known_keys.iter().map(String::as_str).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(formulas.len());

    for formula in formulas {
        let item = format!("formulas.{}", formula.key);
        if !seen.insert(formula.key.clone()) {
            warnings.push(issue(
                "FORMULA_DUPLICATE_KEY",
                "medium",
                item,
                "key is already used by an earlier formula; formula dropped".to_string(),
            ));
            continue;
        }
        match validate_formula(&formula.expression, &known) {
            Ok(check) => {
                if !check.is_resolvable() {
                    warnings.push(issue(
                        "FORMULA_UNKNOWN_VARIABLE",
                        "medium",
                        item,
                        format!("references unknown variables: {}", check.unknown_variables.join(", ")),
                    ));
                }
                kept.push(formula);
            }
            Err(e) => {
                warnings.push(issue("FORMULA_INVALID", "high", item, format!("{}; formula dropped", e)));
            }
        }
    }

    (kept, warnings)
}
