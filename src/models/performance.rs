//! Monthly performance and budget records.
//!
//! A [`PerformancePeriod`] carries what a driver actually did in a calendar
//! month; a [`Budget`] carries the kilometre target pool for a driver type in
//! that month.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::DriverType;

/// Returns the first day of the given calendar month, or `None` if the
/// year/month pair does not name a real month.
///
/// # Example
///
/// ```
/// use incentive_engine::models::period_start;
/// use chrono::NaiveDate;
///
/// assert_eq!(period_start(2025, 3), NaiveDate::from_ymd_opt(2025, 3, 1));
/// assert_eq!(period_start(2025, 13), None);
/// ```
pub fn period_start(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// One driver's measured performance for one calendar month.
///
/// Natural key: `(driver_id, year, month)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePeriod {
    /// The driver this record belongs to.
    pub driver_id: String,
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// Kilometres driven in the month.
    pub actual_kilometers: Decimal,
    /// Trips completed in the month.
    #[serde(default)]
    pub trips_completed: u32,
    /// Average fuel efficiency (km per litre), if recorded.
    #[serde(default)]
    pub fuel_efficiency: Option<Decimal>,
    /// On-time delivery rate as a percentage, if recorded.
    #[serde(default)]
    pub on_time_delivery_rate: Option<Decimal>,
    /// Safety score, if recorded.
    #[serde(default)]
    pub safety_score: Option<Decimal>,
    /// Customer rating, if recorded.
    #[serde(default)]
    pub customer_rating: Option<Decimal>,
}

impl PerformancePeriod {
    /// Returns the natural key callers upsert on.
    pub fn key(&self) -> (&str, i32, u32) {
        (&self.driver_id, self.year, self.month)
    }
}

/// The kilometre budget for one driver type in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// The driver type this budget applies to.
    pub driver_type: DriverType,
    /// Total kilometres budgeted across the fleet of this type.
    pub budgeted_kilometers: Decimal,
    /// Number of trucks sharing the budget. Expected to be at least 1.
    pub truck_count: u32,
}

impl Budget {
    /// Returns true if this budget covers the given driver type and month.
    pub fn applies_to(&self, driver_type: DriverType, year: i32, month: u32) -> bool {
        self.driver_type == driver_type && self.year == year && self.month == month
    }
}
