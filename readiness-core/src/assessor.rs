//! Assessment pipeline
//!
//! Runs dimension scoring, service mapping, valuation and recommendation
//! selection against an explicitly supplied configuration.
//!
//! Global invariants enforced:
//! - Pure: no IO, no clocks, no shared state
//! - Identical input yields identical `Results`

use crate::config::ResolvedConfig;
use crate::error::ScoringError;
use crate::insight;
use crate::model::{Answer, AnswerSet, Dimension, Variant};
use crate::recommend;
use crate::report::{Results, Scores};
use crate::scorer::{self, MissingDimensionPolicy};
use crate::service::{self, ServiceMapInput};
use crate::valuation::{self, RiskFactor, ValuationInput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serialized assessment submission: option picks per question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct AssessmentInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
    pub selected_services: Vec<String>,
    /// Question id -> selected option index
    #[serde(default)]
    pub answers: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebitda: Option<f64>,
}

/// Business context that does not come from question answers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessContext {
    pub risk_factors: Vec<RiskFactor>,
    pub ebitda: Option<f64>,
}

pub struct Assessor {
    config: ResolvedConfig,
    missing_dimension: MissingDimensionPolicy,
}

impl Assessor {
    pub fn new(config: ResolvedConfig) -> Self {
        let missing_dimension = config.missing_dimension;
        Assessor {
            config,
            missing_dimension,
        }
    }

    /// Override the configured missing-dimension policy
    pub fn with_missing_dimension(mut self, policy: MissingDimensionPolicy) -> Self {
        self.missing_dimension = policy;
        self
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Resolve option picks into answers, rejecting unknown questions, bad
    /// option indices and questions of services that are not selected
    pub fn resolve_answers(
        &self,
        picks: &BTreeMap<String, usize>,
        selected: &[String],
    ) -> Result<AnswerSet, ScoringError> {
        let mut answers = AnswerSet::new();
        for (question_id, &option_index) in picks {
            let (question, owner) = self
                .config
                .find_question(question_id)
                .ok_or_else(|| ScoringError::UnknownQuestion(question_id.clone()))?;
            if let Some(service_id) = owner {
                if !selected.iter().any(|s| s == service_id) {
                    return Err(ScoringError::malformed_answer(
                        question_id,
                        format!("question belongs to unselected service '{}'", service_id),
                    ));
                }
            }
            answers.record(Answer::from_question(question, option_index)?);
        }
        Ok(answers)
    }

    /// Run the full pipeline for a serialized submission
    pub fn assess(&self, input: &AssessmentInput) -> Result<Results, ScoringError> {
        if let Some(variant) = input.variant {
            if variant != self.config.variant {
                return Err(ScoringError::MalformedInput {
                    field: "variant",
                    reason: format!(
                        "submission is for '{}' but the configuration is for '{}'",
                        variant, self.config.variant
                    ),
                });
            }
        }

        let answers = self.resolve_answers(&input.answers, &input.selected_services)?;
        let context = BusinessContext {
            risk_factors: input.risk_factors.clone(),
            ebitda: input.ebitda,
        };
        self.assess_answers(&input.selected_services, &answers, &context)
    }

    /// Answer-derived score per selected service that has answered questions
    fn service_answer_scores(
        &self,
        selected: &[String],
        answers: &AnswerSet,
    ) -> Result<BTreeMap<String, f64>, ScoringError> {
        let mut scores = BTreeMap::new();
        for service_id in selected {
            let Some(questions) = self.config.service_questions.get(service_id) else {
                continue;
            };
            let subset = questions.iter().filter_map(|q| answers.get(&q.id));
            if let Some(score) = scorer::score_answers(subset)? {
                scores.insert(service_id.clone(), score);
            }
        }
        Ok(scores)
    }

    /// Run the full pipeline for already-resolved answers
    pub fn assess_answers(
        &self,
        selected: &[String],
        answers: &AnswerSet,
        context: &BusinessContext,
    ) -> Result<Results, ScoringError> {
        let config = &self.config;

        let dimensions =
            scorer::score_dimensions(answers, &config.dimensions, self.missing_dimension)?;
        let overall = scorer::overall_score(&dimensions);
        tracing::debug!(overall, answers = answers.len(), "scored dimensions");

        let answer_scores = self.service_answer_scores(selected, answers)?;
        let services = service::map_services(
            &ServiceMapInput {
                selected,
                table: &config.vulnerability_table,
                answer_scores: &answer_scores,
                fallback_score: dimensions.get_or_neutral(Dimension::Operational),
            },
            &config.readiness_thresholds,
        )?;

        let aggregate_vulnerability = service::aggregate_vulnerability(&services)
            .ok_or(ScoringError::EmptyServiceSelection)?;
        let vulnerability_level =
            service::vulnerability_level(aggregate_vulnerability, &config.vulnerability_thresholds);
        tracing::debug!(
            aggregate_vulnerability,
            level = vulnerability_level.as_str(),
            "mapped services"
        );

        let valuation = valuation::estimate(
            &ValuationInput {
                financial: dimensions.get_or_neutral(Dimension::Financial),
                operational: dimensions.get_or_neutral(Dimension::Operational),
                transformation: dimensions.get_or_neutral(Dimension::Ai),
                strategic: dimensions.get_or_neutral(Dimension::Strategic),
                service_vulnerability: aggregate_vulnerability,
                risk_factors: context.risk_factors.clone(),
                ebitda: context.ebitda,
            },
            &config.valuation_rules,
        )?;

        let recommendations = recommend::select(overall, &services, config.recommendation_limit);
        let insights = insight::insights(&dimensions, &services, config);
        let action_plan = insight::action_plan(&recommendations);

        Ok(Results {
            variant: config.variant,
            scores: Scores {
                overall,
                dimensions,
            },
            services,
            aggregate_vulnerability,
            vulnerability_level,
            valuation,
            recommendations,
            insights,
            action_plan,
        })
    }
}
