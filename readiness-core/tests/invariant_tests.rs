//! Determinism, bounds and serialization invariants

use readiness_core::report::parse_json;
use readiness_core::{assess_file, render_json, ResolvedConfig, Variant};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixtures() -> Vec<(Variant, &'static str)> {
    vec![
        (Variant::Agency, "agency_submission.json"),
        (Variant::InHouse, "in_house_submission.json"),
        (Variant::Agency, "partial_submission.json"),
    ]
}

#[test]
fn test_repeated_runs_are_byte_identical() {
    for (variant, name) in fixtures() {
        let config = ResolvedConfig::builtin(variant).unwrap();
        let first = render_json(&assess_file(&fixture_path(name), &config).unwrap());
        let second = render_json(&assess_file(&fixture_path(name), &config).unwrap());
        assert_eq!(first, second, "output differs between runs for {}", name);
    }
}

#[test]
fn test_json_output_round_trips() {
    for (variant, name) in fixtures() {
        let config = ResolvedConfig::builtin(variant).unwrap();
        let results = assess_file(&fixture_path(name), &config).unwrap();
        let parsed = parse_json(&render_json(&results)).unwrap();
        assert_eq!(parsed, results, "round trip changed results for {}", name);
    }
}

#[test]
fn test_scores_stay_in_range() {
    for (variant, name) in fixtures() {
        let config = ResolvedConfig::builtin(variant).unwrap();
        let results = assess_file(&fixture_path(name), &config).unwrap();

        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        assert!(in_range(results.scores.overall));
        for (_, score) in results.scores.dimensions.iter() {
            assert!(in_range(score));
        }
        for (_, service) in results.services.iter() {
            assert!(in_range(service.score));
            assert!(in_range(service.vulnerability));
            assert!(in_range(service.adaptability));
            assert!(in_range(service.ai_opportunity));
        }
        assert!(in_range(results.aggregate_vulnerability));

        let v = &results.valuation;
        assert!(v.current_multiple >= config.valuation_rules.current_min);
        assert!(v.current_multiple <= config.valuation_rules.current_max);
        assert!(v.potential_multiple >= v.current_multiple);
        assert!(v.potential_multiple <= config.valuation_rules.potential_max);
        assert!(results.recommendations.len() <= config.recommendation_limit);
    }
}

#[test]
fn test_json_uses_camel_case_keys() {
    let config = ResolvedConfig::builtin(Variant::Agency).unwrap();
    let results = assess_file(&fixture_path("agency_submission.json"), &config).unwrap();
    let json = render_json(&results);
    assert!(json.contains("\"aggregateVulnerability\""));
    assert!(json.contains("\"aiOpportunity\""));
    assert!(json.contains("\"currentMultiple\""));
    assert!(json.contains("\"actionPlan\""));
}
