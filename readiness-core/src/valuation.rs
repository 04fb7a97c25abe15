//! EBITDA-multiple valuation heuristic
//!
//! A fixed, rule-based estimate. Thresholds and deltas are illustrative
//! business rules held in `ValuationRules`, not a statistical model.
//!
//! Global invariants enforced:
//! - Pure function of the score inputs, risk factors and rules
//! - current in [current_min, current_max]
//! - current <= potential <= potential_max

use crate::error::ScoringError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Discrete business risk flagged by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    ClientConcentration,
    RevenueVolatility,
    KeyPersonDependency,
    ProjectBasedRevenue,
    OutdatedTechnology,
}

impl RiskFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFactor::ClientConcentration => "client_concentration",
            RiskFactor::RevenueVolatility => "revenue_volatility",
            RiskFactor::KeyPersonDependency => "key_person_dependency",
            RiskFactor::ProjectBasedRevenue => "project_based_revenue",
            RiskFactor::OutdatedTechnology => "outdated_technology",
        }
    }

    /// Multiple penalty applied to the current valuation
    pub fn penalty(&self) -> f64 {
        match self {
            RiskFactor::ClientConcentration => 0.5,
            RiskFactor::RevenueVolatility => 0.5,
            RiskFactor::KeyPersonDependency => 0.25,
            RiskFactor::ProjectBasedRevenue => 0.25,
            RiskFactor::OutdatedTechnology => 0.25,
        }
    }
}

/// Tunable valuation rules
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationRules {
    pub base_multiple: f64,
    /// Scores above this earn a premium
    pub strong_threshold: f64,
    /// Scores below this incur a discount
    pub weak_threshold: f64,
    pub financial_delta: f64,
    pub operational_delta: f64,
    pub transformation_delta: f64,
    pub vulnerability_threshold: f64,
    pub vulnerability_delta: f64,
    pub current_min: f64,
    pub current_max: f64,
    pub potential_max: f64,
    /// Dimensions below this have room to improve the multiple
    pub improvement_threshold: f64,
    pub financial_improvement: f64,
    pub operational_improvement: f64,
    pub transformation_improvement: f64,
    pub strategic_improvement: f64,
    /// Share of the risk-factor penalty recoverable by mitigation
    pub risk_recovery_ratio: f64,
}

impl Default for ValuationRules {
    fn default() -> Self {
        ValuationRules {
            base_multiple: 3.5,
            strong_threshold: 70.0,
            weak_threshold: 40.0,
            financial_delta: 1.0,
            operational_delta: 0.5,
            transformation_delta: 0.5,
            vulnerability_threshold: 70.0,
            vulnerability_delta: 0.5,
            current_min: 1.5,
            current_max: 6.0,
            potential_max: 8.0,
            improvement_threshold: 70.0,
            financial_improvement: 0.75,
            operational_improvement: 0.5,
            transformation_improvement: 1.0,
            strategic_improvement: 0.5,
            risk_recovery_ratio: 0.5,
        }
    }
}

/// Valuation inputs (scores on the 0..=100 scale)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValuationInput {
    pub financial: f64,
    pub operational: f64,
    pub transformation: f64,
    pub strategic: f64,
    pub service_vulnerability: f64,
    pub risk_factors: Vec<RiskFactor>,
    /// Annual EBITDA, if the user supplied one
    pub ebitda: Option<f64>,
}

/// Valuation estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    pub current_multiple: f64,
    pub potential_multiple: f64,
    pub uplift_percent: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_value: Option<f64>,
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ScoringError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ScoringError::MalformedInput {
            field,
            reason: format!("must be finite (got {})", value),
        })
    }
}

/// Threshold delta: +delta above strong, -delta below weak, else 0
fn band_delta(score: f64, delta: f64, rules: &ValuationRules) -> f64 {
    if score > rules.strong_threshold {
        delta
    } else if score < rules.weak_threshold {
        -delta
    } else {
        0.0
    }
}

/// Current multiple before clamping, and the total risk-factor penalty
fn unclamped_current(
    input: &ValuationInput,
    risks: &BTreeSet<RiskFactor>,
    rules: &ValuationRules,
) -> (f64, f64) {
    let mut multiple = rules.base_multiple;
    multiple += band_delta(input.financial, rules.financial_delta, rules);
    multiple += band_delta(input.operational, rules.operational_delta, rules);

    // Transformation only earns a premium; a weak score is priced into potential
    if input.transformation > rules.strong_threshold {
        multiple += rules.transformation_delta;
    }
    if input.service_vulnerability > rules.vulnerability_threshold {
        multiple -= rules.vulnerability_delta;
    }

    let penalty: f64 = risks.iter().map(RiskFactor::penalty).sum();
    (multiple - penalty, penalty)
}

/// Improvement headroom from dimensions below the improvement threshold
fn improvement_headroom(input: &ValuationInput, rules: &ValuationRules) -> f64 {
    [
        (input.financial, rules.financial_improvement),
        (input.operational, rules.operational_improvement),
        (input.transformation, rules.transformation_improvement),
        (input.strategic, rules.strategic_improvement),
    ]
    .iter()
    .filter(|(score, _)| *score < rules.improvement_threshold)
    .map(|(_, delta)| delta)
    .sum()
}

/// Estimate current and potential EBITDA multiples
pub fn estimate(input: &ValuationInput, rules: &ValuationRules) -> Result<Valuation, ScoringError> {
    check_finite("financial", input.financial)?;
    check_finite("operational", input.operational)?;
    check_finite("transformation", input.transformation)?;
    check_finite("strategic", input.strategic)?;
    check_finite("service_vulnerability", input.service_vulnerability)?;
    if let Some(ebitda) = input.ebitda {
        check_finite("ebitda", ebitda)?;
        if ebitda < 0.0 {
            return Err(ScoringError::MalformedInput {
                field: "ebitda",
                reason: format!("must be non-negative (got {})", ebitda),
            });
        }
    }

    let risks: BTreeSet<RiskFactor> = input.risk_factors.iter().copied().collect();
    let (raw_current, penalty) = unclamped_current(input, &risks, rules);
    let current = raw_current.min(rules.current_max).max(rules.current_min);

    let raw_potential =
        current + improvement_headroom(input, rules) + penalty * rules.risk_recovery_ratio;
    let potential = raw_potential.min(rules.potential_max).max(current);

    let uplift_percent = if current > 0.0 {
        (potential - current) / current * 100.0
    } else {
        0.0
    };

    tracing::debug!(current, potential, penalty, "estimated valuation multiples");

    Ok(Valuation {
        current_multiple: current,
        potential_multiple: potential,
        uplift_percent,
        risk_factors: risks.into_iter().collect(),
        current_value: input.ebitda.map(|e| e * current),
        potential_value: input.ebitda.map(|e| e * potential),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(fin: f64, op: f64, ai: f64, strat: f64, vuln: f64) -> ValuationInput {
        ValuationInput {
            financial: fin,
            operational: op,
            transformation: ai,
            strategic: strat,
            service_vulnerability: vuln,
            risk_factors: Vec::new(),
            ebitda: None,
        }
    }

    #[test]
    fn test_neutral_scores_keep_base_multiple() {
        let v = estimate(&input(50.0, 50.0, 50.0, 50.0, 50.0), &ValuationRules::default()).unwrap();
        assert_eq!(v.current_multiple, 3.5);
        // All four dimensions below 70: 0.75 + 0.5 + 1.0 + 0.5
        assert_eq!(v.potential_multiple, 6.25);
    }

    #[test]
    fn test_strong_scores_raise_current() {
        let v = estimate(&input(80.0, 80.0, 80.0, 80.0, 20.0), &ValuationRules::default()).unwrap();
        // 3.5 + 1.0 + 0.5 + 0.5
        assert_eq!(v.current_multiple, 5.5);
        assert_eq!(v.potential_multiple, 5.5);
        assert_eq!(v.uplift_percent, 0.0);
    }

    #[test]
    fn test_weak_scores_and_vulnerability_lower_current() {
        let v = estimate(&input(20.0, 20.0, 20.0, 20.0, 90.0), &ValuationRules::default()).unwrap();
        // 3.5 - 1.0 - 0.5 - 0.5 = 1.5
        assert_eq!(v.current_multiple, 1.5);
    }

    #[test]
    fn test_current_is_clamped_low() {
        let mut i = input(0.0, 0.0, 0.0, 0.0, 100.0);
        i.risk_factors = vec![
            RiskFactor::ClientConcentration,
            RiskFactor::RevenueVolatility,
            RiskFactor::KeyPersonDependency,
        ];
        let v = estimate(&i, &ValuationRules::default()).unwrap();
        assert_eq!(v.current_multiple, 1.5);
        assert!(v.potential_multiple >= v.current_multiple);
    }

    #[test]
    fn test_duplicate_risk_factors_count_once() {
        let mut once = input(50.0, 50.0, 50.0, 50.0, 50.0);
        once.risk_factors = vec![RiskFactor::ClientConcentration];
        let mut twice = once.clone();
        twice.risk_factors = vec![
            RiskFactor::ClientConcentration,
            RiskFactor::ClientConcentration,
        ];
        let rules = ValuationRules::default();
        assert_eq!(estimate(&once, &rules).unwrap(), estimate(&twice, &rules).unwrap());
        assert_eq!(estimate(&once, &rules).unwrap().current_multiple, 3.0);
    }

    #[test]
    fn test_bounds_hold_across_inputs() {
        let rules = ValuationRules::default();
        let all_risks = vec![
            RiskFactor::ClientConcentration,
            RiskFactor::RevenueVolatility,
            RiskFactor::KeyPersonDependency,
            RiskFactor::ProjectBasedRevenue,
            RiskFactor::OutdatedTechnology,
        ];
        let levels = [0.0, 39.0, 40.0, 55.0, 70.0, 71.0, 100.0];
        for &fin in &levels {
            for &op in &levels {
                for &ai in &levels {
                    for &strat in &levels {
                        for &vuln in &[0.0, 70.0, 95.0] {
                            for risks in [Vec::new(), all_risks.clone()] {
                                let mut i = input(fin, op, ai, strat, vuln);
                                i.risk_factors = risks;
                                let v = estimate(&i, &rules).unwrap();
                                assert!((1.5..=6.0).contains(&v.current_multiple));
                                assert!(v.potential_multiple >= v.current_multiple);
                                assert!(v.potential_multiple <= 8.0);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_ebitda_values() {
        let mut i = input(50.0, 50.0, 50.0, 50.0, 50.0);
        i.ebitda = Some(1_000_000.0);
        let v = estimate(&i, &ValuationRules::default()).unwrap();
        assert_eq!(v.current_value, Some(3_500_000.0));
        assert_eq!(v.potential_value, Some(6_250_000.0));
    }

    #[test]
    fn test_rejects_non_finite_and_negative_inputs() {
        let rules = ValuationRules::default();
        assert!(estimate(&input(f64::NAN, 50.0, 50.0, 50.0, 50.0), &rules).is_err());
        let mut i = input(50.0, 50.0, 50.0, 50.0, 50.0);
        i.ebitda = Some(-1.0);
        assert!(estimate(&i, &rules).is_err());
    }
}
