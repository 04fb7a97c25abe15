//! Service/activity vulnerability mapping
//!
//! Blends the static per-service vulnerability baseline with the user's
//! answer-derived score for that service.
//!
//! Global invariants enforced:
//! - Vulnerability is a table lookup, never derived from answers
//! - Readiness bucketing uses strict comparisons (boundaries fall low)
//! - Aggregation is weighted toward services the user is least ready for

use crate::error::ScoringError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Readiness bucket for a single service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Low,
    Medium,
    High,
}

impl Readiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Readiness::Low => "low",
            Readiness::Medium => "medium",
            Readiness::High => "high",
        }
    }

    /// Weight of a service in the aggregate vulnerability
    pub fn aggregate_weight(&self) -> f64 {
        match self {
            Readiness::Low => 1.5,
            Readiness::Medium => 1.0,
            Readiness::High => 0.7,
        }
    }
}

/// Aggregate vulnerability classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VulnerabilityLevel {
    Low,
    Medium,
    High,
}

impl VulnerabilityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VulnerabilityLevel::Low => "low",
            VulnerabilityLevel::Medium => "medium",
            VulnerabilityLevel::High => "high",
        }
    }
}

/// Score thresholds for readiness buckets (exclusive lower bounds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadinessThresholds {
    pub medium: f64,
    pub high: f64,
}

impl Default for ReadinessThresholds {
    fn default() -> Self {
        ReadinessThresholds {
            medium: 40.0,
            high: 60.0,
        }
    }
}

/// Aggregate vulnerability thresholds (exclusive lower bounds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VulnerabilityThresholds {
    pub medium: f64,
    pub high: f64,
}

impl Default for VulnerabilityThresholds {
    fn default() -> Self {
        VulnerabilityThresholds {
            medium: 40.0,
            high: 70.0,
        }
    }
}

/// Derived scores for one selected service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceScore {
    pub score: f64,
    pub vulnerability: f64,
    pub adaptability: f64,
    pub ai_opportunity: f64,
    pub readiness: Readiness,
}

/// Service scores keyed by service id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceScores {
    services: BTreeMap<String, ServiceScore>,
}

impl ServiceScores {
    pub fn get(&self, service_id: &str) -> Option<&ServiceScore> {
        self.services.get(service_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServiceScore)> {
        self.services.iter().map(|(id, s)| (id.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Services ordered by vulnerability descending, then id ascending
    pub fn by_vulnerability(&self) -> Vec<(&str, &ServiceScore)> {
        let mut ordered: Vec<_> = self.iter().collect();
        ordered.sort_by(|(a_id, a), (b_id, b)| {
            b.vulnerability
                .partial_cmp(&a.vulnerability)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a_id.cmp(b_id))
        });
        ordered
    }
}

/// Inputs for mapping the selected services
pub struct ServiceMapInput<'a> {
    pub selected: &'a [String],
    /// Static vulnerability baseline per service (0..=100)
    pub table: &'a BTreeMap<String, f64>,
    /// Answer-derived scores for services with per-service questions answered
    pub answer_scores: &'a BTreeMap<String, f64>,
    /// Score used for services without their own answers
    pub fallback_score: f64,
}

/// Bucket a service score
pub fn assign_readiness(score: f64, thresholds: &ReadinessThresholds) -> Readiness {
    if score > thresholds.high {
        Readiness::High
    } else if score > thresholds.medium {
        Readiness::Medium
    } else {
        Readiness::Low
    }
}

/// Adaptability = 100 - vulnerability + 0.3 * score, clamped to [0, 100]
pub fn adaptability(vulnerability: f64, score: f64) -> f64 {
    (100.0 - vulnerability + 0.3 * score).clamp(0.0, 100.0)
}

/// AI opportunity = 0.6 * vulnerability + 0.4 * score, clamped to [0, 100]
pub fn ai_opportunity(vulnerability: f64, score: f64) -> f64 {
    (0.6 * vulnerability + 0.4 * score).clamp(0.0, 100.0)
}

/// Map the selected services to their derived scores
///
/// Duplicate ids in the selection are collapsed.
pub fn map_services(
    input: &ServiceMapInput<'_>,
    thresholds: &ReadinessThresholds,
) -> Result<ServiceScores, ScoringError> {
    if input.selected.is_empty() {
        return Err(ScoringError::EmptyServiceSelection);
    }
    if !input.fallback_score.is_finite() {
        return Err(ScoringError::MalformedInput {
            field: "fallback_score",
            reason: format!("must be finite (got {})", input.fallback_score),
        });
    }

    let mut services = BTreeMap::new();
    for service_id in input.selected {
        if services.contains_key(service_id) {
            continue;
        }

        let vulnerability = *input
            .table
            .get(service_id)
            .ok_or_else(|| ScoringError::UnknownService(service_id.clone()))?;
        if !(0.0..=100.0).contains(&vulnerability) {
            return Err(ScoringError::MalformedInput {
                field: "service_vulnerability_table",
                reason: format!(
                    "baseline for '{}' must be within 0..=100 (got {})",
                    service_id, vulnerability
                ),
            });
        }

        let score = input
            .answer_scores
            .get(service_id)
            .copied()
            .unwrap_or(input.fallback_score);

        let entry = ServiceScore {
            score,
            vulnerability,
            adaptability: adaptability(vulnerability, score),
            ai_opportunity: ai_opportunity(vulnerability, score),
            readiness: assign_readiness(score, thresholds),
        };
        tracing::debug!(
            service = %service_id,
            score,
            vulnerability,
            readiness = entry.readiness.as_str(),
            "mapped service"
        );
        services.insert(service_id.clone(), entry);
    }

    Ok(ServiceScores { services })
}

/// Readiness-weighted mean vulnerability across services
///
/// Returns `None` for an empty set.
pub fn aggregate_vulnerability(services: &ServiceScores) -> Option<f64> {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for (_, service) in services.iter() {
        let weight = service.readiness.aggregate_weight();
        weighted_sum += service.vulnerability * weight;
        total_weight += weight;
    }

    (total_weight > 0.0).then(|| weighted_sum / total_weight)
}

/// Classify an aggregate vulnerability
pub fn vulnerability_level(
    aggregate: f64,
    thresholds: &VulnerabilityThresholds,
) -> VulnerabilityLevel {
    if aggregate > thresholds.high {
        VulnerabilityLevel::High
    } else if aggregate > thresholds.medium {
        VulnerabilityLevel::Medium
    } else {
        VulnerabilityLevel::Low
    }
}
