//! Insights and phased action plans derived from scored results

use crate::config::ResolvedConfig;
use crate::recommend::{Level, Recommendation};
use crate::scorer::DimensionScores;
use crate::service::{Readiness, ServiceScores};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Strength,
    Gap,
    Exposure,
    Readiness,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
}

/// Action plan phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    First30Days,
    Days31To90,
    Days91Plus,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::First30Days => "First 30 days",
            Phase::Days31To90 => "Days 31-90",
            Phase::Days91Plus => "Day 91 onward",
        }
    }

    /// High impact and low effort first, other high impact next, the rest last
    pub fn for_recommendation(rec: &Recommendation) -> Phase {
        match (rec.impact, rec.effort) {
            (Level::High, Level::Low) => Phase::First30Days,
            (Level::High, _) => Phase::Days31To90,
            _ => Phase::Days91Plus,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStep {
    pub phase: Phase,
    pub actions: Vec<String>,
}

/// Derive insights from dimension and service scores
///
/// Services are named with the configuration's display names.
pub fn insights(
    scores: &DimensionScores,
    services: &ServiceScores,
    config: &ResolvedConfig,
) -> Vec<Insight> {
    let mut out = Vec::new();

    let strongest = scores.strongest();
    let weakest = scores.weakest();
    if let Some((dimension, score)) = strongest {
        out.push(Insight {
            kind: InsightKind::Strength,
            message: format!(
                "{} is your strongest area ({:.0}/100).",
                dimension.label(),
                score
            ),
        });
    }
    if let Some((dimension, score)) = weakest {
        if strongest.map(|(d, _)| d) != Some(dimension) {
            out.push(Insight {
                kind: InsightKind::Gap,
                message: format!(
                    "{} is your largest gap ({:.0}/100) and the best place to start.",
                    dimension.label(),
                    score
                ),
            });
        }
    }

    if let Some((service_id, service)) = services.by_vulnerability().first() {
        out.push(Insight {
            kind: InsightKind::Exposure,
            message: format!(
                "{} is the most exposed to AI disruption (vulnerability {:.0}/100).",
                config.service_name(service_id),
                service.vulnerability
            ),
        });
    }

    if !services.is_empty() {
        let low = services
            .iter()
            .filter(|(_, s)| s.readiness == Readiness::Low)
            .count();
        out.push(Insight {
            kind: InsightKind::Readiness,
            message: format!(
                "{} of {} selected {} show low readiness.",
                low,
                services.len(),
                config.variant.units_label()
            ),
        });
    }

    out
}

/// Group recommendations into phases, preserving recommendation order
///
/// Phases without actions are omitted.
pub fn action_plan(recommendations: &[Recommendation]) -> Vec<ActionStep> {
    [Phase::First30Days, Phase::Days31To90, Phase::Days91Plus]
        .into_iter()
        .filter_map(|phase| {
            let actions: Vec<String> = recommendations
                .iter()
                .filter(|rec| Phase::for_recommendation(rec) == phase)
                .map(|rec| rec.title.clone())
                .collect();
            (!actions.is_empty()).then_some(ActionStep { phase, actions })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dimension, Variant};
    use crate::service::{map_services, ReadinessThresholds, ServiceMapInput};
    use std::collections::BTreeMap;

    fn agency() -> ResolvedConfig {
        ResolvedConfig::builtin(Variant::Agency).unwrap()
    }

    fn scored(selected: &[&str], table: &[(&str, f64)], score: f64) -> ServiceScores {
        let selected: Vec<String> = selected.iter().map(|s| s.to_string()).collect();
        let table: BTreeMap<String, f64> =
            table.iter().map(|(id, v)| (id.to_string(), *v)).collect();
        map_services(
            &ServiceMapInput {
                selected: &selected,
                table: &table,
                answer_scores: &BTreeMap::new(),
                fallback_score: score,
            },
            &ReadinessThresholds::default(),
        )
        .unwrap()
    }

    fn rec(title: &str, impact: Level, effort: Level) -> Recommendation {
        Recommendation {
            title: title.to_string(),
            description: String::new(),
            impact,
            effort,
            service: None,
        }
    }

    #[test]
    fn test_action_plan_phases() {
        let plan = action_plan(&[
            rec("a", Level::High, Level::Medium),
            rec("b", Level::High, Level::Low),
            rec("c", Level::Medium, Level::Low),
            rec("d", Level::High, Level::Low),
        ]);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].phase, Phase::First30Days);
        assert_eq!(plan[0].actions, vec!["b", "d"]);
        assert_eq!(plan[1].actions, vec!["a"]);
        assert_eq!(plan[2].actions, vec!["c"]);
    }

    #[test]
    fn test_action_plan_skips_empty_phases() {
        let plan = action_plan(&[rec("a", Level::Low, Level::Low)]);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].phase, Phase::Days91Plus);
    }

    #[test]
    fn test_insights_strength_and_gap() {
        let mut scores = DimensionScores::default();
        scores.insert(Dimension::Operational, 80.0);
        scores.insert(Dimension::Ai, 20.0);
        let found = insights(&scores, &ServiceScores::default(), &agency());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].kind, InsightKind::Strength);
        assert!(found[0].message.starts_with("Operational efficiency"));
        assert_eq!(found[1].kind, InsightKind::Gap);
        assert!(found[1].message.starts_with("AI readiness"));
    }

    #[test]
    fn test_single_dimension_has_no_gap() {
        let mut scores = DimensionScores::default();
        scores.insert(Dimension::Financial, 60.0);
        let found = insights(&scores, &ServiceScores::default(), &agency());
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_exposure_uses_display_name() {
        let services = scored(
            &["seo", "content_creation"],
            &[("seo", 75.0), ("content_creation", 85.0)],
            20.0,
        );
        let found = insights(&DimensionScores::default(), &services, &agency());
        let exposure = found
            .iter()
            .find(|i| i.kind == InsightKind::Exposure)
            .unwrap();
        assert!(exposure.message.starts_with("Content creation is the most exposed"));
    }

    #[test]
    fn test_readiness_message_names_activities_for_in_house() {
        let config = ResolvedConfig::builtin(Variant::InHouse).unwrap();
        let services = scored(&["brand_strategy"], &[("brand_strategy", 30.0)], 20.0);
        let found = insights(&DimensionScores::default(), &services, &config);
        let readiness = found
            .iter()
            .find(|i| i.kind == InsightKind::Readiness)
            .unwrap();
        assert_eq!(
            readiness.message,
            "1 of 1 selected activities show low readiness."
        );

        let agency_found = insights(&DimensionScores::default(), &services, &agency());
        assert!(agency_found
            .iter()
            .any(|i| i.message == "1 of 1 selected services show low readiness."));
    }
}
