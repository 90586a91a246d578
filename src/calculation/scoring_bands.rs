//! Score and rating bands.
//!
//! Two lookups turn continuous numbers into bands: an achievement percentage
//! into a KPI score via the configurable [`ScoringRule`] table, and a total
//! weighted score into a [`Rating`] via the fixed [`RATING_BANDS`].

use rust_decimal::Decimal;

use crate::models::{Rating, ScoringRule};

/// Rating thresholds, highest first. Each lower bound is inclusive.
pub const RATING_BANDS: [(Decimal, Rating); 5] = [
    (Decimal::from_parts(90, 0, 0, false, 0), Rating::Excellent),
    (Decimal::from_parts(80, 0, 0, false, 0), Rating::VeryGood),
    (Decimal::from_parts(70, 0, 0, false, 0), Rating::Good),
    (Decimal::from_parts(60, 0, 0, false, 0), Rating::Satisfactory),
    (Decimal::from_parts(50, 0, 0, false, 0), Rating::NeedsImprovement),
];

/// Looks up the score for an achievement percentage.
///
/// Rules are scanned in order and the first with `min <= achievement < max`
/// wins. The final rule also accepts `achievement == max`. Returns `None`
/// when no rule matches.
///
/// # Examples
///
/// ```
/// use incentive_engine::calculation::lookup_score;
/// use incentive_engine::models::default_scoring_rules;
/// use rust_decimal::Decimal;
///
/// let rules = default_scoring_rules();
/// assert_eq!(lookup_score(Decimal::new(95, 0), &rules), Some(Decimal::new(80, 0)));
/// assert_eq!(lookup_score(Decimal::new(-5, 0), &rules), None);
/// ```
pub fn lookup_score(achievement: Decimal, rules: &[ScoringRule]) -> Option<Decimal> {
    let last = rules.len().checked_sub(1)?;
    rules
        .iter()
        .enumerate()
        .find(|(i, rule)| {
            achievement >= rule.min_achievement
                && (achievement < rule.max_achievement
                    || (*i == last && achievement == rule.max_achievement))
        })
        .map(|(_, rule)| rule.score)
}

/// Maps a total weighted score to its rating.
///
/// # Examples
///
/// ```
/// use incentive_engine::calculation::get_final_rating;
/// use incentive_engine::models::Rating;
/// use rust_decimal::Decimal;
///
/// assert_eq!(get_final_rating(Decimal::new(80, 0)), Rating::VeryGood);
/// assert_eq!(get_final_rating(Decimal::new(8999, 2)), Rating::VeryGood);
/// assert_eq!(get_final_rating(Decimal::new(90, 0)), Rating::Excellent);
/// ```
pub fn get_final_rating(total_weighted_score: Decimal) -> Rating {
    RATING_BANDS
        .iter()
        .find(|(threshold, _)| total_weighted_score >= *threshold)
        .map(|(_, rating)| *rating)
        .unwrap_or(Rating::Unsatisfactory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_scoring_rules;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_lookup_lower_bound_is_inclusive() {
        let rules = default_scoring_rules();
        assert_eq!(lookup_score(dec("80"), &rules), Some(dec("70")));
        assert_eq!(lookup_score(dec("79.99"), &rules), Some(dec("60")));
    }

    #[test]
    fn test_lookup_zero_achievement() {
        let rules = default_scoring_rules();
        assert_eq!(lookup_score(Decimal::ZERO, &rules), Some(dec("20")));
    }

    #[test]
    fn test_lookup_final_rule_is_inclusive_at_top() {
        let rules = vec![
            ScoringRule::new(dec("0"), dec("50"), dec("10")),
            ScoringRule::new(dec("50"), dec("100"), dec("100")),
        ];
        assert_eq!(lookup_score(dec("100"), &rules), Some(dec("100")));
        assert_eq!(lookup_score(dec("100.01"), &rules), None);
        // earlier rules stay exclusive at the top
        assert_eq!(lookup_score(dec("50"), &rules), Some(dec("100")));
    }

    #[test]
    fn test_lookup_first_match_wins() {
        let rules = vec![
            ScoringRule::new(dec("0"), dec("100"), dec("50")),
            ScoringRule::new(dec("50"), dec("100"), dec("90")),
        ];
        assert_eq!(lookup_score(dec("75"), &rules), Some(dec("50")));
    }

    #[test]
    fn test_lookup_gap_is_unmatched() {
        let rules = vec![
            ScoringRule::new(dec("0"), dec("50"), dec("10")),
            ScoringRule::new(dec("60"), dec("100"), dec("90")),
        ];
        assert_eq!(lookup_score(dec("55"), &rules), None);
    }

    #[test]
    fn test_lookup_empty_table() {
        assert_eq!(lookup_score(dec("50"), &[]), None);
    }

    #[test]
    fn test_rating_boundaries() {
        assert_eq!(get_final_rating(dec("100")), Rating::Excellent);
        assert_eq!(get_final_rating(dec("90")), Rating::Excellent);
        assert_eq!(get_final_rating(dec("89.99")), Rating::VeryGood);
        assert_eq!(get_final_rating(dec("80")), Rating::VeryGood);
        assert_eq!(get_final_rating(dec("79.99")), Rating::Good);
        assert_eq!(get_final_rating(dec("70")), Rating::Good);
        assert_eq!(get_final_rating(dec("60")), Rating::Satisfactory);
        assert_eq!(get_final_rating(dec("50")), Rating::NeedsImprovement);
        assert_eq!(get_final_rating(dec("49.99")), Rating::Unsatisfactory);
        assert_eq!(get_final_rating(dec("-10")), Rating::Unsatisfactory);
    }

    #[test]
    fn test_rating_bands_descend() {
        assert!(RATING_BANDS.windows(2).all(|w| w[0].0 > w[1].0));
    }
}
