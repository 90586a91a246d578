//! Scorecard models: the Role → KRA → KPI hierarchy, monthly targets,
//! the scoring-rule banding table, and the scoring engine's outputs.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AuditWarning;

/// How a KPI's actual value compares to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetDirection {
    /// More is better (e.g. deliveries).
    HigherBetter,
    /// Less is better (e.g. incidents, fuel used).
    LowerBetter,
    /// The target is a set point; any deviation is penalised.
    Exact,
}

/// A Key Performance Indicator within a KRA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Percentage of the parent KRA this KPI carries.
    pub weighting: Decimal,
    /// Whether higher, lower or exact values are better.
    pub target_direction: TargetDirection,
    /// Unit of measure, for display only.
    #[serde(default)]
    pub unit: String,
    /// Target used when no monthly target is set.
    #[serde(default)]
    pub default_target: Option<Decimal>,
}

/// A Key Result Area: a weighted group of KPIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kra {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Percentage of the role this KRA carries.
    pub weighting: Decimal,
    /// KPIs in display order.
    #[serde(default)]
    pub kpis: Vec<Kpi>,
}

/// A scorecard role with its KRAs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorecardRole {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// KRAs in display order.
    #[serde(default)]
    pub kras: Vec<Kra>,
}

/// A monthly target overriding a KPI's default target.
///
/// Natural key: `(kpi_id, year, month)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// The KPI this target is for.
    pub kpi_id: String,
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// The target value.
    pub target_value: Decimal,
}

/// One band of the achievement → score table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRule {
    /// Inclusive lower bound on achievement percentage.
    pub min_achievement: Decimal,
    /// Upper bound on achievement percentage. Exclusive, except for the
    /// final rule in a table.
    pub max_achievement: Decimal,
    /// Score awarded (0-100).
    pub score: Decimal,
}

impl ScoringRule {
    /// Creates a rule from its bounds and score.
    pub fn new(min_achievement: Decimal, max_achievement: Decimal, score: Decimal) -> Self {
        Self {
            min_achievement,
            max_achievement,
            score,
        }
    }
}

/// The built-in achievement → score table.
///
/// Contiguous from 0% upwards; the top band is wide so that over-achievement
/// (which the achievement formulas do not clamp) still scores.
pub fn default_scoring_rules() -> Vec<ScoringRule> {
    let band = |min: i64, max: i64, score: i64| {
        ScoringRule::new(Decimal::new(min, 0), Decimal::new(max, 0), Decimal::new(score, 0))
    };
    vec![
        band(0, 50, 20),
        band(50, 70, 40),
        band(70, 80, 60),
        band(80, 90, 70),
        band(90, 100, 80),
        band(100, 110, 90),
        band(110, 10000, 100),
    ]
}

/// Where a KPI's target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSource {
    /// A monthly [`Target`] row.
    Monthly,
    /// The KPI's `default_target`.
    Default,
    /// Neither was set; the target is zero.
    Missing,
}

/// One scored KPI for one employee-month. Persisted one row per KPI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorecardEntry {
    /// The employee scored.
    pub employee_id: String,
    /// The KPI scored.
    pub kpi_id: String,
    /// Calendar year.
    pub year: i32,
    /// Calendar month.
    pub month: u32,
    /// The recorded actual value.
    pub actual_value: Decimal,
    /// The resolved target.
    pub target_value: Decimal,
    /// Where the target came from.
    pub target_source: TargetSource,
    /// Direction-aware achievement percentage.
    pub achievement_percentage: Decimal,
    /// Banded score (0-100).
    pub score: Decimal,
    /// Score scaled by the KPI's weighting.
    pub weighted_score: Decimal,
}

impl ScorecardEntry {
    /// Returns the natural key callers upsert on.
    pub fn key(&self) -> (&str, &str, i32, u32) {
        (&self.employee_id, &self.kpi_id, self.year, self.month)
    }
}

/// The scored result for one KRA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KraScore {
    /// The KRA identifier.
    pub kra_id: String,
    /// The KRA display name.
    pub kra_name: String,
    /// The KRA's weighting within the role.
    pub weighting: Decimal,
    /// Scored KPIs.
    pub kpi_scores: Vec<ScorecardEntry>,
    /// Sum of the KPIs' weighted scores.
    pub kra_weighted_score: Decimal,
    /// `kra_weighted_score` scaled by the KRA weighting.
    pub final_kra_score: Decimal,
}

/// The qualitative rating derived from a total weighted score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    /// 90 and above.
    Excellent,
    /// 80 up to 90.
    #[serde(rename = "Very Good")]
    VeryGood,
    /// 70 up to 80.
    Good,
    /// 60 up to 70.
    Satisfactory,
    /// 50 up to 60.
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    /// Below 50.
    Unsatisfactory,
}

impl Rating {
    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            Rating::Excellent => "Excellent",
            Rating::VeryGood => "Very Good",
            Rating::Good => "Good",
            Rating::Satisfactory => "Satisfactory",
            Rating::NeedsImprovement => "Needs Improvement",
            Rating::Unsatisfactory => "Unsatisfactory",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The complete scorecard result for one employee-month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorecardResult {
    /// The employee scored.
    pub employee_id: String,
    /// The role the scorecard was built from.
    pub role_id: String,
    /// Calendar year.
    pub year: i32,
    /// Calendar month.
    pub month: u32,
    /// Per-KRA breakdown, in role order.
    pub kra_scores: Vec<KraScore>,
    /// Sum of all final KRA scores.
    pub total_weighted_score: Decimal,
    /// Rating band for the total.
    pub rating: Rating,
    /// Data-quality conditions found while scoring.
    pub warnings: Vec<AuditWarning>,
}

impl ScorecardResult {
    /// Returns every scored KPI row, in role order.
    pub fn entries(&self) -> impl Iterator<Item = &ScorecardEntry> {
        self.kra_scores.iter().flat_map(|kra| kra.kpi_scores.iter())
    }

    /// Returns the summary row for persistence.
    pub fn summary(&self) -> ScorecardSummary {
        ScorecardSummary {
            employee_id: self.employee_id.clone(),
            year: self.year,
            month: self.month,
            total_weighted_score: self.total_weighted_score,
            rating: self.rating,
        }
    }
}

/// The per-employee monthly summary row.
///
/// Natural key: `(employee_id, year, month)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorecardSummary {
    /// The employee scored.
    pub employee_id: String,
    /// Calendar year.
    pub year: i32,
    /// Calendar month.
    pub month: u32,
    /// Total weighted score.
    pub total_weighted_score: Decimal,
    /// Rating band.
    pub rating: Rating,
}

impl ScorecardSummary {
    /// Returns the natural key callers upsert on.
    pub fn key(&self) -> (&str, i32, u32) {
        (&self.employee_id, self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_role_hierarchy() {
        let json = r#"{
            "id": "dispatcher",
            "name": "Dispatcher",
            "kras": [{
                "id": "ops",
                "name": "Operations",
                "weighting": "100",
                "kpis": [{
                    "id": "on_time",
                    "name": "On-time dispatch",
                    "weighting": "60",
                    "target_direction": "higher_better",
                    "unit": "%",
                    "default_target": "95"
                }, {
                    "id": "complaints",
                    "weighting": "40",
                    "target_direction": "lower_better"
                }]
            }]
        }"#;

        let role: ScorecardRole = serde_json::from_str(json).unwrap();
        assert_eq!(role.kras.len(), 1);
        let kpis = &role.kras[0].kpis;
        assert_eq!(kpis[0].target_direction, TargetDirection::HigherBetter);
        assert_eq!(kpis[0].default_target, Some(Decimal::new(95, 0)));
        assert_eq!(kpis[1].target_direction, TargetDirection::LowerBetter);
        assert!(kpis[1].default_target.is_none());
    }

    #[test]
    fn test_rating_serializes_display_label() {
        assert_eq!(
            serde_json::to_string(&Rating::VeryGood).unwrap(),
            "\"Very Good\""
        );
        assert_eq!(
            serde_json::to_string(&Rating::NeedsImprovement).unwrap(),
            "\"Needs Improvement\""
        );
        let rating: Rating = serde_json::from_str("\"Excellent\"").unwrap();
        assert_eq!(rating, Rating::Excellent);
    }

    #[test]
    fn test_rating_display_matches_serialized_form() {
        for rating in [
            Rating::Excellent,
            Rating::VeryGood,
            Rating::Good,
            Rating::Satisfactory,
            Rating::NeedsImprovement,
            Rating::Unsatisfactory,
        ] {
            let json = serde_json::to_string(&rating).unwrap();
            assert_eq!(json, format!("\"{}\"", rating));
        }
    }

    #[test]
    fn test_default_scoring_rules_are_contiguous() {
        let rules = default_scoring_rules();
        assert_eq!(rules[0].min_achievement, Decimal::ZERO);
        for pair in rules.windows(2) {
            assert_eq!(pair[0].max_achievement, pair[1].min_achievement);
        }
    }

    #[test]
    fn test_summary_copies_totals() {
        let result = ScorecardResult {
            employee_id: "emp_001".to_string(),
            role_id: "dispatcher".to_string(),
            year: 2025,
            month: 3,
            kra_scores: vec![],
            total_weighted_score: Decimal::new(80, 0),
            rating: Rating::VeryGood,
            warnings: vec![],
        };

        let summary = result.summary();
        assert_eq!(summary.key(), ("emp_001", 2025, 3));
        assert_eq!(summary.rating, Rating::VeryGood);
        assert_eq!(result.entries().count(), 0);
    }
}
