//! Fuel-efficiency tier configuration.
//!
//! A [`FuelConfig`] is an ordered list of half-open efficiency ranges, each
//! paying a flat bonus. [`FuelTierDefaults`] holds the built-in tier sets for
//! each driver type; they are plain data and are replaced wholesale when a
//! configuration directory provides its own.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::DriverType;

/// One fuel-efficiency band, covering `[min_efficiency, max_efficiency)`.
///
/// # Example
///
/// ```
/// use incentive_engine::models::FuelEfficiencyTier;
/// use rust_decimal::Decimal;
///
/// let tier = FuelEfficiencyTier::new(Decimal::new(20, 1), Decimal::new(25, 1), Decimal::new(20, 0));
/// assert!(tier.contains(Decimal::new(20, 1)));
/// assert!(!tier.contains(Decimal::new(25, 1)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelEfficiencyTier {
    /// Inclusive lower bound.
    pub min_efficiency: Decimal,
    /// Exclusive upper bound.
    pub max_efficiency: Decimal,
    /// Flat bonus paid when the efficiency falls in this tier.
    pub bonus_amount: Decimal,
}

impl FuelEfficiencyTier {
    /// Creates a tier from its bounds and bonus.
    pub fn new(min_efficiency: Decimal, max_efficiency: Decimal, bonus_amount: Decimal) -> Self {
        Self {
            min_efficiency,
            max_efficiency,
            bonus_amount,
        }
    }

    /// Returns true if `efficiency` lies in `[min, max)`.
    pub fn contains(&self, efficiency: Decimal) -> bool {
        efficiency >= self.min_efficiency && efficiency < self.max_efficiency
    }
}

/// The fuel bonus configuration for one driver type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelConfig {
    /// When false, no fuel bonus is paid.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Tiers in resolution order.
    #[serde(default)]
    pub tiers: Vec<FuelEfficiencyTier>,
}

fn default_enabled() -> bool {
    true
}

impl FuelConfig {
    /// Creates an enabled configuration with the given tiers.
    pub fn enabled(tiers: Vec<FuelEfficiencyTier>) -> Self {
        Self {
            enabled: true,
            tiers,
        }
    }
}

/// Built-in fuel tier sets, one per driver type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelTierDefaults {
    /// Tiers for local drivers.
    pub local: FuelConfig,
    /// Tiers for export drivers.
    pub export: FuelConfig,
}

impl FuelTierDefaults {
    /// Returns the tier set for a driver type.
    pub fn for_driver_type(&self, driver_type: DriverType) -> &FuelConfig {
        match driver_type {
            DriverType::Local => &self.local,
            DriverType::Export => &self.export,
        }
    }
}

fn tier(min_tenths: i64, max_tenths: i64, bonus: i64) -> FuelEfficiencyTier {
    FuelEfficiencyTier::new(
        Decimal::new(min_tenths, 1),
        Decimal::new(max_tenths, 1),
        Decimal::new(bonus, 0),
    )
}

impl Default for FuelTierDefaults {
    fn default() -> Self {
        Self {
            local: FuelConfig::enabled(vec![
                tier(15, 20, 10),
                tier(20, 25, 20),
                tier(25, 30, 35),
                tier(30, 40, 50),
            ]),
            export: FuelConfig::enabled(vec![
                tier(12, 16, 15),
                tier(16, 20, 30),
                tier(20, 25, 50),
                tier(25, 35, 75),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_tier_lower_bound_is_inclusive() {
        let t = tier(15, 20, 10);
        assert!(t.contains(dec("1.5")));
    }

    #[test]
    fn test_tier_upper_bound_is_exclusive() {
        let t = tier(15, 20, 10);
        assert!(!t.contains(dec("2.0")));
        assert!(t.contains(dec("1.99")));
    }

    #[test]
    fn test_defaults_have_increasing_bonuses() {
        let defaults = FuelTierDefaults::default();
        for config in [&defaults.local, &defaults.export] {
            assert!(config.enabled);
            let bonuses: Vec<Decimal> = config.tiers.iter().map(|t| t.bonus_amount).collect();
            assert!(bonuses.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_local_default_pays_20_at_2_1() {
        let defaults = FuelTierDefaults::default();
        let local = defaults.for_driver_type(DriverType::Local);
        let matched = local.tiers.iter().find(|t| t.contains(dec("2.1"))).unwrap();
        assert_eq!(matched.bonus_amount, dec("20"));
    }

    #[test]
    fn test_fuel_config_enabled_defaults_to_true() {
        let config: FuelConfig = serde_json::from_str(r#"{"tiers": []}"#).unwrap();
        assert!(config.enabled);
        assert!(config.tiers.is_empty());
    }
}
