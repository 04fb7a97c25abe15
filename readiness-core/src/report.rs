//! Results and output generation
//!
//! Global invariants enforced:
//! - Results are created once per completed assessment and never mutated
//! - Deterministic output ordering
//! - JSON output parses back to identical values

use crate::insight::{ActionStep, Insight};
use crate::model::Variant;
use crate::recommend::Recommendation;
use crate::scorer::DimensionScores;
use crate::service::{ServiceScores, VulnerabilityLevel};
use crate::valuation::Valuation;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Overall score plus one entry per dimension (`scores.<dimension>`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub overall: f64,
    #[serde(flatten)]
    pub dimensions: DimensionScores,
}

/// Complete assessment results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Results {
    pub variant: Variant,
    pub scores: Scores,
    pub services: ServiceScores,
    pub aggregate_vulnerability: f64,
    pub vulnerability_level: VulnerabilityLevel,
    pub valuation: Valuation,
    pub recommendations: Vec<Recommendation>,
    pub insights: Vec<Insight>,
    pub action_plan: Vec<ActionStep>,
}

/// Render results as JSON output
pub fn render_json(results: &Results) -> String {
    serde_json::to_string_pretty(results).unwrap_or_else(|_| "{}".to_string())
}

/// Parse results previously produced by `render_json`
pub fn parse_json(json: &str) -> Result<Results> {
    serde_json::from_str(json).context("failed to parse results JSON")
}

/// Write results to a `.json` file
pub fn write_json(path: &Path, results: &Results) -> Result<()> {
    std::fs::write(path, render_json(results))
        .with_context(|| format!("failed to write results: {}", path.display()))
}

/// Render results as text output
pub fn render_text(results: &Results) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "AI readiness ({}): {:.1}/100\n\n",
        results.variant, results.scores.overall
    ));

    output.push_str(&format!("{:<24} {}\n", "DIMENSION", "SCORE"));
    for (dimension, score) in results.scores.dimensions.iter() {
        output.push_str(&format!("{:<24} {:.1}\n", dimension.label(), score));
    }

    output.push_str(&format!(
        "\n{:<24} {:<8} {:<8} {:<8} {:<8} {}\n",
        "SERVICE", "SCORE", "VULN", "ADAPT", "AI OPP", "READINESS"
    ));
    for (service_id, service) in results.services.iter() {
        output.push_str(&format!(
            "{:<24} {:<8} {:<8} {:<8} {:<8} {}\n",
            truncate_or_pad(service_id, 24),
            format!("{:.1}", service.score),
            format!("{:.1}", service.vulnerability),
            format!("{:.1}", service.adaptability),
            format!("{:.1}", service.ai_opportunity),
            service.readiness.as_str(),
        ));
    }
    output.push_str(&format!(
        "\nVulnerability: {:.1} ({})\n",
        results.aggregate_vulnerability,
        results.vulnerability_level.as_str()
    ));

    let valuation = &results.valuation;
    output.push_str(&format!(
        "Valuation multiple: {:.2}x now, {:.2}x potential (+{:.0}%)\n",
        valuation.current_multiple, valuation.potential_multiple, valuation.uplift_percent
    ));
    if let (Some(current), Some(potential)) = (valuation.current_value, valuation.potential_value) {
        output.push_str(&format!(
            "Estimated value: {:.0} now, {:.0} potential\n",
            current, potential
        ));
    }

    if !results.recommendations.is_empty() {
        output.push_str("\nRecommendations:\n");
        for (i, rec) in results.recommendations.iter().enumerate() {
            output.push_str(&format!(
                "{:>2}. {} [impact: {}, effort: {}]\n    {}\n",
                i + 1,
                rec.title,
                rec.impact.as_str(),
                rec.effort.as_str(),
                rec.description
            ));
        }
    }

    if !results.insights.is_empty() {
        output.push_str("\nInsights:\n");
        for insight in &results.insights {
            output.push_str(&format!("  - {}\n", insight.message));
        }
    }

    if !results.action_plan.is_empty() {
        output.push_str("\nAction plan:\n");
        for step in &results.action_plan {
            output.push_str(&format!("  {}:\n", step.phase.label()));
            for action in &step.actions {
                output.push_str(&format!("    - {}\n", action));
            }
        }
    }

    output
}

/// Truncate or pad string to fixed width
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        format!("{:<width$}", s, width = width)
    }
}
