//! Direction-aware achievement percentage.
//!
//! Converts an (actual, target, direction) triple into a percentage where 100
//! means "on target". Higher-better and lower-better results are not clamped
//! at 100, so beating a target scores above 100.

use rust_decimal::Decimal;

use crate::models::TargetDirection;

/// Calculates the achievement percentage for a KPI reading.
///
/// - `HigherBetter`: `actual / target * 100`; a target of zero or less yields 0.
/// - `LowerBetter`: 100 at or below zero usage; otherwise achievement falls
///   linearly as `actual` exceeds `target` and floors at 0. A target of zero
///   or less yields 100 only when `actual` is also zero or less.
/// - `Exact`: 100 on target, otherwise reduced by the deviation as a
///   percentage of `max(target, 1)`, floored at 0.
///
/// # Examples
///
/// ```
/// use incentive_engine::calculation::calculate_achievement;
/// use incentive_engine::models::TargetDirection;
/// use rust_decimal::Decimal;
///
/// let pct = calculate_achievement(Decimal::new(45, 0), Decimal::new(50, 0), TargetDirection::HigherBetter);
/// assert_eq!(pct, Decimal::new(90, 0));
///
/// let pct = calculate_achievement(Decimal::new(8, 0), Decimal::new(10, 0), TargetDirection::LowerBetter);
/// assert_eq!(pct, Decimal::new(120, 0));
/// ```
pub fn calculate_achievement(actual: Decimal, target: Decimal, direction: TargetDirection) -> Decimal {
    match direction {
        TargetDirection::HigherBetter => {
            if target <= Decimal::ZERO {
                return Decimal::ZERO;
            }
            ratio(actual, target).saturating_mul(Decimal::ONE_HUNDRED)
        }
        TargetDirection::LowerBetter => {
            if target <= Decimal::ZERO {
                return if actual <= Decimal::ZERO {
                    Decimal::ONE_HUNDRED
                } else {
                    Decimal::ZERO
                };
            }
            if actual <= Decimal::ZERO {
                return Decimal::ONE_HUNDRED;
            }
            let overrun = ratio(actual.saturating_sub(target), target);
            (Decimal::ONE - overrun).max(Decimal::ZERO) * Decimal::ONE_HUNDRED
        }
        TargetDirection::Exact => {
            if actual == target {
                return Decimal::ONE_HUNDRED;
            }
            let deviation = ratio(actual.saturating_sub(target).abs(), target.max(Decimal::ONE));
            Decimal::ONE_HUNDRED
                .saturating_sub(deviation.saturating_mul(Decimal::ONE_HUNDRED))
                .max(Decimal::ZERO)
        }
    }
}

// Saturates instead of panicking when the quotient is not representable.
fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator.checked_div(denominator).unwrap_or(if numerator.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}
