//! Driver model and related types.
//!
//! This module defines the [`Driver`] struct and [`DriverType`] enum used as
//! calculation inputs for driver incentives.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The kind of haulage a driver does. Budgets, fuel tiers and custom
/// formulas are all scoped by driver type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverType {
    /// Local distribution driver.
    Local,
    /// Cross-border export driver.
    Export,
}

impl DriverType {
    /// Returns the snake_case name used in storage and audit records.
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverType::Local => "local",
            DriverType::Export => "export",
        }
    }
}

impl fmt::Display for DriverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A driver whose monthly incentive is being calculated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    /// Unique identifier for the driver.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// The driver's type, which selects budgets, tiers and formulas.
    pub driver_type: DriverType,
    /// Fixed monthly salary before incentives.
    pub base_salary: Decimal,
}
