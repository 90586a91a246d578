//! Fuel-efficiency bonus resolution.
//!
//! Maps a monthly fuel-efficiency reading to a flat bonus by scanning the
//! configured tiers in order and taking the first half-open range that
//! contains the reading.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AuditStep, DriverType, FuelConfig, FuelTierDefaults};

/// How the fuel bonus was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FuelBonusOutcome {
    /// No efficiency reading was recorded.
    NoReading,
    /// Fuel bonuses are switched off for this configuration.
    Disabled,
    /// The reading fell inside the tier at `tier_index`.
    Matched {
        /// Position of the matched tier in the configuration.
        tier_index: usize,
    },
    /// The reading fell outside every tier.
    Unmatched,
}

/// The result of resolving a fuel bonus, including the audit step.
#[derive(Debug, Clone)]
pub struct FuelBonusResult {
    /// The bonus paid (zero unless a tier matched).
    pub bonus: Decimal,
    /// How the bonus was arrived at.
    pub outcome: FuelBonusOutcome,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Selects the tier set to resolve against.
///
/// A supplied configuration wins unless it has no tiers, in which case the
/// built-in set for the driver type is used. A supplied configuration that is
/// disabled is still honoured, even with no tiers.
///
/// Returns the configuration and whether the defaults were substituted.
pub fn effective_fuel_config<'a>(
    supplied: Option<&'a FuelConfig>,
    driver_type: DriverType,
    defaults: &'a FuelTierDefaults,
) -> (&'a FuelConfig, bool) {
    match supplied {
        Some(config) if !config.tiers.is_empty() || !config.enabled => (config, false),
        _ => (defaults.for_driver_type(driver_type), true),
    }
}

/// Resolves the fuel bonus for an efficiency reading.
///
/// Returns zero when the reading is absent, when the configuration is
/// disabled, or when no tier contains the reading. Tiers are scanned in
/// stored order and the first match wins.
///
/// # Examples
///
/// ```
/// use incentive_engine::calculation::{FuelBonusOutcome, resolve_fuel_bonus};
/// use incentive_engine::models::{FuelConfig, FuelEfficiencyTier};
/// use rust_decimal::Decimal;
///
/// let config = FuelConfig::enabled(vec![
///     FuelEfficiencyTier::new(Decimal::new(15, 1), Decimal::new(20, 1), Decimal::new(10, 0)),
///     FuelEfficiencyTier::new(Decimal::new(20, 1), Decimal::new(25, 1), Decimal::new(20, 0)),
/// ]);
///
/// let result = resolve_fuel_bonus(Some(Decimal::new(20, 1)), &config, 1);
/// assert_eq!(result.bonus, Decimal::new(20, 0));
/// assert_eq!(result.outcome, FuelBonusOutcome::Matched { tier_index: 1 });
/// ```
pub fn resolve_fuel_bonus(
    efficiency: Option<Decimal>,
    config: &FuelConfig,
    step_number: u32,
) -> FuelBonusResult {
    let (bonus, outcome) = match efficiency {
        None => (Decimal::ZERO, FuelBonusOutcome::NoReading),
        Some(_) if !config.enabled => (Decimal::ZERO, FuelBonusOutcome::Disabled),
        Some(value) => match config.tiers.iter().position(|t| t.contains(value)) {
            Some(tier_index) => (
                config.tiers[tier_index].bonus_amount,
                FuelBonusOutcome::Matched { tier_index },
            ),
            None => (Decimal::ZERO, FuelBonusOutcome::Unmatched),
        },
    };

    let reasoning = match (outcome, efficiency) {
        (FuelBonusOutcome::NoReading, _) => {
            "No fuel efficiency reading recorded, no fuel bonus".to_string()
        }
        (FuelBonusOutcome::Disabled, _) => "Fuel bonus is disabled, no fuel bonus".to_string(),
        (FuelBonusOutcome::Matched { tier_index }, Some(value)) => {
            let tier = &config.tiers[tier_index];
            format!(
                "Efficiency {} falls in tier [{}, {}), bonus ${}",
                value.normalize(),
                tier.min_efficiency.normalize(),
                tier.max_efficiency.normalize(),
                tier.bonus_amount.normalize()
            )
        }
        (_, value) => format!(
            "Efficiency {} matches none of {} tiers, no fuel bonus",
            value.map(|v| v.normalize().to_string()).unwrap_or_default(),
            config.tiers.len()
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "fuel_bonus".to_string(),
        rule_name: "Fuel Efficiency Bonus".to_string(),
        input: serde_json::json!({
            "fuel_efficiency": efficiency.map(|v| v.normalize().to_string()),
            "enabled": config.enabled,
            "tier_count": config.tiers.len()
        }),
        output: serde_json::json!({
            "bonus": bonus.normalize().to_string(),
            "outcome": outcome
        }),
        reasoning,
    };

    FuelBonusResult {
        bonus,
        outcome,
        audit_step,
    }
}
