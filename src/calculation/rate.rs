//! Per-kilometre rate derivation.
//!
//! The divisor is a fixed monthly incentive pool per truck. Spreading it over
//! the per-truck kilometre target gives the rate paid per kilometre, so the
//! rate falls as the target grows.

use rust_decimal::Decimal;

/// Returns the kilometre target for one truck, or zero when there are no
/// trucks.
pub fn target_per_truck(budgeted_kilometers: Decimal, truck_count: u32) -> Decimal {
    if truck_count == 0 {
        return Decimal::ZERO;
    }
    budgeted_kilometers / Decimal::from(truck_count)
}

/// Derives the incentive rate per kilometre.
///
/// `rate = divisor / (budgeted_kilometers / truck_count)`, or zero when the
/// per-truck target or the divisor is not positive.
///
/// # Examples
///
/// ```
/// use incentive_engine::calculation::derive_rate_per_km;
/// use rust_decimal::Decimal;
///
/// let rate = derive_rate_per_km(Decimal::new(60000, 0), Decimal::new(10, 0), 5);
/// assert_eq!(rate.round_dp(6), Decimal::new(833, 6));
///
/// assert_eq!(derive_rate_per_km(Decimal::new(60000, 0), Decimal::new(10, 0), 0), Decimal::ZERO);
/// ```
pub fn derive_rate_per_km(budgeted_kilometers: Decimal, divisor: Decimal, truck_count: u32) -> Decimal {
    checked_rate_per_km(budgeted_kilometers, divisor, truck_count).unwrap_or(Decimal::ZERO)
}

/// Like [`derive_rate_per_km`], but returns `None` when the quotient is not
/// representable instead of substituting zero.
///
/// ```
/// use incentive_engine::calculation::checked_rate_per_km;
/// use rust_decimal::Decimal;
///
/// let tiny_target = Decimal::new(1, 10);
/// assert_eq!(checked_rate_per_km(tiny_target, Decimal::MAX, 1), None);
/// assert_eq!(checked_rate_per_km(Decimal::ZERO, Decimal::MAX, 1), Some(Decimal::ZERO));
/// ```
pub fn checked_rate_per_km(
    budgeted_kilometers: Decimal,
    divisor: Decimal,
    truck_count: u32,
) -> Option<Decimal> {
    let per_truck = target_per_truck(budgeted_kilometers, truck_count);
    if per_truck <= Decimal::ZERO || divisor <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }
    divisor.checked_div(per_truck)
}
