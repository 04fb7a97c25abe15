//! Assessment configuration
//!
//! Loads question banks, service vulnerability tables and thresholds from
//! JSON files. Loading is a one-time startup step: load once, fail fast.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.readinessrc.json` in project root
//! 3. `readiness.config.json` in project root
//! 4. `"readiness"` key in `package.json`
//! 5. Built-in configuration for the requested variant
//!
//! Threshold fields are optional. CLI flags take precedence over config file values.

use crate::model::{Dimension, Question, Variant, MAX_OPTION_SCORE};
use crate::recommend::DEFAULT_LIMIT;
use crate::scorer::MissingDimensionPolicy;
use crate::service::{ReadinessThresholds, VulnerabilityThresholds};
use crate::valuation::ValuationRules;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

const AGENCY_CONFIG: &str = include_str!("../data/agency.json");
const IN_HOUSE_CONFIG: &str = include_str!("../data/in_house.json");

fn default_dimensions() -> Vec<Dimension> {
    Dimension::ALL.to_vec()
}

/// Assessment configuration loaded from a JSON config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct AssessmentConfig {
    pub variant: Variant,

    /// Dimensions scored, in output order (default: all four)
    #[serde(default = "default_dimensions")]
    pub dimensions: Vec<Dimension>,

    #[serde(default)]
    pub questions: QuestionBank,

    /// Static vulnerability baseline per service id (0..=100)
    #[serde(default)]
    pub service_vulnerability_table: BTreeMap<String, f64>,

    /// Display names per service id
    #[serde(default)]
    pub service_names: BTreeMap<String, String>,

    /// Custom readiness and vulnerability thresholds
    #[serde(default)]
    pub thresholds: Option<ThresholdConfig>,

    /// Maximum number of recommendations (default: 5)
    #[serde(default)]
    pub recommendation_limit: Option<usize>,

    /// Policy for dimensions without answers (default: neutral)
    #[serde(default)]
    pub missing_dimension: Option<MissingDimensionPolicy>,
}

/// Core questions plus per-service question subsets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct QuestionBank {
    #[serde(default)]
    pub core: Vec<Question>,
    #[serde(default)]
    pub per_service: BTreeMap<String, Vec<Question>>,
}

/// Custom thresholds (all exclusive lower bounds on the 0..=100 scale)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ThresholdConfig {
    /// Service score above which readiness is medium (default: 40)
    pub readiness_medium: Option<f64>,
    /// Service score above which readiness is high (default: 60)
    pub readiness_high: Option<f64>,
    /// Aggregate vulnerability above which the level is medium (default: 40)
    pub vulnerability_medium: Option<f64>,
    /// Aggregate vulnerability above which the level is high (default: 70)
    pub vulnerability_high: Option<f64>,
}

/// Resolved configuration with defaults applied
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub variant: Variant,
    pub dimensions: Vec<Dimension>,
    pub core_questions: Vec<Question>,
    pub service_questions: BTreeMap<String, Vec<Question>>,
    pub vulnerability_table: BTreeMap<String, f64>,
    pub service_names: BTreeMap<String, String>,
    pub readiness_thresholds: ReadinessThresholds,
    pub vulnerability_thresholds: VulnerabilityThresholds,
    pub valuation_rules: ValuationRules,
    pub recommendation_limit: usize,
    pub missing_dimension: MissingDimensionPolicy,
    /// Path the config was loaded from (None if built-in)
    pub config_path: Option<PathBuf>,
}

fn check_percent(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        anyhow::bail!("{} must be within 0..=100 (got {})", name, value);
    }
    Ok(())
}

fn validate_question(question: &Question, dimensions: &[Dimension]) -> Result<()> {
    if question.id.trim().is_empty() {
        anyhow::bail!("question ids must not be empty");
    }
    if !dimensions.contains(&question.dimension) {
        anyhow::bail!(
            "question '{}' uses dimension '{}' which is not listed in dimensions",
            question.id,
            question.dimension
        );
    }
    if !question.weight.is_finite() || question.weight <= 0.0 {
        anyhow::bail!(
            "question '{}' weight must be positive (got {})",
            question.id,
            question.weight
        );
    }
    if question.weight > 10.0 {
        anyhow::bail!(
            "question '{}' weight must be at most 10.0 (got {})",
            question.id,
            question.weight
        );
    }
    if question.options.is_empty() {
        anyhow::bail!("question '{}' must have at least one option", question.id);
    }
    for (index, option) in question.options.iter().enumerate() {
        if option.score > MAX_OPTION_SCORE {
            anyhow::bail!(
                "question '{}' option {} score must be at most {} (got {})",
                question.id,
                index,
                MAX_OPTION_SCORE,
                option.score
            );
        }
    }
    Ok(())
}

impl AssessmentConfig {
    /// Built-in configuration for a variant
    pub fn builtin(variant: Variant) -> Result<Self> {
        let source = match variant {
            Variant::Agency => AGENCY_CONFIG,
            Variant::InHouse => IN_HOUSE_CONFIG,
        };
        let config: AssessmentConfig = serde_json::from_str(source)
            .with_context(|| format!("failed to parse built-in {} config", variant))?;
        Ok(config)
    }

    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if self.dimensions.is_empty() {
            anyhow::bail!("dimensions must not be empty");
        }
        let mut seen_dimensions = BTreeSet::new();
        for dimension in &self.dimensions {
            if !seen_dimensions.insert(*dimension) {
                anyhow::bail!("dimension '{}' is listed more than once", dimension);
            }
        }

        // Question ids are unique across core and per-service banks
        let mut seen_ids = BTreeSet::new();
        let all_questions = self
            .questions
            .core
            .iter()
            .chain(self.questions.per_service.values().flatten());
        for question in all_questions {
            validate_question(question, &self.dimensions)?;
            if !seen_ids.insert(question.id.as_str()) {
                anyhow::bail!("question id '{}' is defined more than once", question.id);
            }
        }

        for (service_id, baseline) in &self.service_vulnerability_table {
            check_percent(
                &format!("serviceVulnerabilityTable.{}", service_id),
                *baseline,
            )?;
        }
        for service_id in self.questions.per_service.keys() {
            if !self.service_vulnerability_table.contains_key(service_id) {
                anyhow::bail!(
                    "questions.perService.{} has no entry in serviceVulnerabilityTable",
                    service_id
                );
            }
        }

        if let Some(ref t) = self.thresholds {
            let readiness_medium = t.readiness_medium.unwrap_or(40.0);
            let readiness_high = t.readiness_high.unwrap_or(60.0);
            let vulnerability_medium = t.vulnerability_medium.unwrap_or(40.0);
            let vulnerability_high = t.vulnerability_high.unwrap_or(70.0);

            check_percent("thresholds.readinessMedium", readiness_medium)?;
            check_percent("thresholds.readinessHigh", readiness_high)?;
            check_percent("thresholds.vulnerabilityMedium", vulnerability_medium)?;
            check_percent("thresholds.vulnerabilityHigh", vulnerability_high)?;

            if readiness_medium >= readiness_high {
                anyhow::bail!(
                    "thresholds.readinessMedium ({}) must be less than thresholds.readinessHigh ({})",
                    readiness_medium,
                    readiness_high
                );
            }
            if vulnerability_medium >= vulnerability_high {
                anyhow::bail!(
                    "thresholds.vulnerabilityMedium ({}) must be less than thresholds.vulnerabilityHigh ({})",
                    vulnerability_medium,
                    vulnerability_high
                );
            }
        }

        if let Some(limit) = self.recommendation_limit {
            if limit == 0 {
                anyhow::bail!("recommendationLimit must be at least 1");
            }
        }

        Ok(())
    }

    /// Resolve config into the form used by the assessor
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let readiness_thresholds = match &self.thresholds {
            Some(t) => ReadinessThresholds {
                medium: t.readiness_medium.unwrap_or(40.0),
                high: t.readiness_high.unwrap_or(60.0),
            },
            None => ReadinessThresholds::default(),
        };
        let vulnerability_thresholds = match &self.thresholds {
            Some(t) => VulnerabilityThresholds {
                medium: t.vulnerability_medium.unwrap_or(40.0),
                high: t.vulnerability_high.unwrap_or(70.0),
            },
            None => VulnerabilityThresholds::default(),
        };

        Ok(ResolvedConfig {
            variant: self.variant,
            dimensions: self.dimensions.clone(),
            core_questions: self.questions.core.clone(),
            service_questions: self.questions.per_service.clone(),
            vulnerability_table: self.service_vulnerability_table.clone(),
            service_names: self.service_names.clone(),
            readiness_thresholds,
            vulnerability_thresholds,
            valuation_rules: ValuationRules::default(),
            recommendation_limit: self.recommendation_limit.unwrap_or(DEFAULT_LIMIT),
            missing_dimension: self.missing_dimension.unwrap_or_default(),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Resolved built-in configuration for a variant
    pub fn builtin(variant: Variant) -> Result<Self> {
        AssessmentConfig::builtin(variant)?.resolve()
    }

    pub fn is_known_service(&self, service_id: &str) -> bool {
        self.vulnerability_table.contains_key(service_id)
    }

    /// Known service ids in id order
    pub fn service_ids(&self) -> impl Iterator<Item = &str> {
        self.vulnerability_table.keys().map(String::as_str)
    }

    /// Display name for a service, falling back to the id
    pub fn service_name<'a>(&'a self, service_id: &'a str) -> &'a str {
        self.service_names
            .get(service_id)
            .map(String::as_str)
            .unwrap_or(service_id)
    }

    /// Find a question and the service that owns it (None for core questions)
    pub fn find_question(&self, question_id: &str) -> Option<(&Question, Option<&str>)> {
        if let Some(q) = self.core_questions.iter().find(|q| q.id == question_id) {
            return Some((q, None));
        }
        self.service_questions
            .iter()
            .find_map(|(service_id, questions)| {
                questions
                    .iter()
                    .find(|q| q.id == question_id)
                    .map(|q| (q, Some(service_id.as_str())))
            })
    }

    /// Questions active for a service selection: core first, then each
    /// selected service's questions in selection order
    pub fn active_questions(&self, selected: &[String]) -> Vec<&Question> {
        let mut out: Vec<&Question> = self.core_questions.iter().collect();
        let mut seen = BTreeSet::new();
        for service_id in selected {
            if !seen.insert(service_id.as_str()) {
                continue;
            }
            if let Some(questions) = self.service_questions.get(service_id) {
                out.extend(questions.iter());
            }
        }
        out
    }
}

/// Where a candidate file keeps its readiness config
#[derive(Clone, Copy)]
enum ConfigLocation {
    /// The whole document is the config
    Document,
    /// The config sits under the `"readiness"` key
    PackageKey,
}

/// Candidate files in discovery order
const CANDIDATES: [(&str, ConfigLocation); 3] = [
    (".readinessrc.json", ConfigLocation::Document),
    ("readiness.config.json", ConfigLocation::Document),
    ("package.json", ConfigLocation::PackageKey),
];

const PACKAGE_KEY: &str = "readiness";

/// Discover and load a config file from the project root
///
/// The first existing candidate wins: `.readinessrc.json`, then
/// `readiness.config.json`, then the `"readiness"` key in `package.json`.
/// A `package.json` without that key is skipped.
///
/// Returns `None` if no config file is found (use built-in config).
pub fn discover_config(project_root: &Path) -> Result<Option<(AssessmentConfig, PathBuf)>> {
    for (name, location) in CANDIDATES {
        let path = project_root.join(name);
        if !path.is_file() {
            continue;
        }

        let document = read_json(&path)?;
        let value = match location {
            ConfigLocation::Document => document,
            ConfigLocation::PackageKey => match document.get(PACKAGE_KEY) {
                Some(value) => value.clone(),
                None => {
                    tracing::debug!(path = %path.display(), "no readiness key, skipping");
                    continue;
                }
            },
        };

        let config = config_from_value(value, &path)?;
        return Ok(Some((config, path)));
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<AssessmentConfig> {
    config_from_value(read_json(path)?, path)
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

/// Deserialize and validate, attributing errors to `path`
fn config_from_value(value: serde_json::Value, path: &Path) -> Result<AssessmentConfig> {
    let config: AssessmentConfig = serde_json::from_value(value)
        .with_context(|| format!("invalid config in: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    tracing::debug!(path = %path.display(), variant = %config.variant, "loaded config file");
    Ok(config)
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file. Otherwise, discovers
/// config from the project root. Falls back to the built-in config for
/// `variant` (agency when unspecified). A loaded config whose variant
/// differs from an explicitly requested one is rejected.
pub fn load_and_resolve(
    project_root: &Path,
    config_path: Option<&Path>,
    variant: Option<Variant>,
) -> Result<ResolvedConfig> {
    let loaded = match config_path {
        Some(path) => Some((load_config_file(path)?, path.to_path_buf())),
        None => discover_config(project_root)?,
    };

    let (config, source_path) = match loaded {
        Some((config, path)) => {
            if let Some(requested) = variant {
                if requested != config.variant {
                    anyhow::bail!(
                        "config {} is for variant '{}', but '{}' was requested",
                        path.display(),
                        config.variant,
                        requested
                    );
                }
            }
            (config, Some(path))
        }
        None => {
            let variant = variant.unwrap_or(Variant::Agency);
            tracing::debug!(%variant, "no config file found, using built-in config");
            (AssessmentConfig::builtin(variant)?, None)
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MINIMAL: &str = r#"{
        "variant": "agency",
        "questions": {
            "core": [
                {"id": "q1", "dimension": "operational", "options": [{"text": "a", "score": 1}, {"text": "b", "score": 5}]}
            ],
            "perService": {
                "seo": [{"id": "s1", "dimension": "ai", "options": [{"text": "a", "score": 3}]}]
            }
        },
        "serviceVulnerabilityTable": {"seo": 75, "content_creation": 85}
    }"#;

    fn minimal() -> AssessmentConfig {
        serde_json::from_str(MINIMAL).unwrap()
    }

    #[test]
    fn test_builtin_configs_are_valid() {
        for variant in [Variant::Agency, Variant::InHouse] {
            let config = AssessmentConfig::builtin(variant).expect("built-in config should parse");
            config.validate().expect("built-in config should be valid");
            assert_eq!(config.variant, variant);
            let resolved = config.resolve().unwrap();
            assert!(!resolved.core_questions.is_empty());
            assert!(resolved.config_path.is_none());
        }
    }

    #[test]
    fn test_minimal_config_defaults() {
        let resolved = minimal().resolve().unwrap();
        assert_eq!(resolved.dimensions, Dimension::ALL.to_vec());
        assert_eq!(resolved.readiness_thresholds, ReadinessThresholds::default());
        assert_eq!(
            resolved.vulnerability_thresholds,
            VulnerabilityThresholds::default()
        );
        assert_eq!(resolved.recommendation_limit, DEFAULT_LIMIT);
        assert_eq!(resolved.missing_dimension, MissingDimensionPolicy::Neutral);
        assert_eq!(resolved.core_questions[0].weight, 1.0);
    }

    #[test]
    fn test_reject_unknown_fields() {
        let json = r#"{"variant": "agency", "unknown_field": true}"#;
        let result: Result<AssessmentConfig, _> = serde_json::from_str(json);
        assert!(result.is_err(), "unknown fields should be rejected");
    }

    #[test]
    fn test_reject_duplicate_question_ids() {
        let mut config = minimal();
        let mut dup = config.questions.core[0].clone();
        dup.dimension = Dimension::Ai;
        config.questions.per_service.get_mut("seo").unwrap().push(dup);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_unlisted_dimension() {
        let mut config = minimal();
        config.dimensions = vec![Dimension::Operational];
        // s1 uses the ai dimension
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_option_score_above_five() {
        let mut config = minimal();
        config.questions.core[0].options[1].score = 6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_question_without_options() {
        let mut config = minimal();
        config.questions.core[0].options.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_bad_weights() {
        let mut config = minimal();
        config.questions.core[0].weight = 0.0;
        assert!(config.validate().is_err());
        config.questions.core[0].weight = 11.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_baseline_out_of_range() {
        let mut config = minimal();
        config
            .service_vulnerability_table
            .insert("seo".to_string(), 120.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_per_service_without_baseline() {
        let mut config = minimal();
        config.service_vulnerability_table.remove("seo");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_unordered_thresholds() {
        let json = r#"{"variant": "agency", "thresholds": {"readinessMedium": 70, "readinessHigh": 50}}"#;
        let config: AssessmentConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_zero_recommendation_limit() {
        let json = r#"{"variant": "agency", "recommendationLimit": 0}"#;
        let config: AssessmentConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_thresholds_use_defaults_for_rest() {
        let json = r#"{"variant": "in_house", "thresholds": {"vulnerabilityHigh": 80}}"#;
        let config: AssessmentConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.vulnerability_thresholds.medium, 40.0);
        assert_eq!(resolved.vulnerability_thresholds.high, 80.0);
        assert_eq!(resolved.readiness_thresholds.high, 60.0);
    }

    #[test]
    fn test_find_question_reports_owner() {
        let resolved = minimal().resolve().unwrap();
        let (q, owner) = resolved.find_question("q1").unwrap();
        assert_eq!(q.id, "q1");
        assert_eq!(owner, None);
        let (_, owner) = resolved.find_question("s1").unwrap();
        assert_eq!(owner, Some("seo"));
        assert!(resolved.find_question("missing").is_none());
    }

    #[test]
    fn test_active_questions_follow_selection() {
        let resolved = minimal().resolve().unwrap();
        let none: Vec<&str> = resolved
            .active_questions(&["content_creation".to_string()])
            .iter()
            .map(|q| q.id.as_str())
            .collect();
        assert_eq!(none, vec!["q1"]);

        let with_seo: Vec<&str> = resolved
            .active_questions(&["seo".to_string(), "seo".to_string()])
            .iter()
            .map(|q| q.id.as_str())
            .collect();
        assert_eq!(with_seo, vec!["q1", "s1"]);
    }

    #[test]
    fn test_service_name_falls_back_to_id() {
        let resolved = ResolvedConfig::builtin(Variant::Agency).unwrap();
        assert_eq!(resolved.service_name("seo"), "SEO");
        assert_eq!(resolved.service_name("unknown_thing"), "unknown_thing");
    }

    #[test]
    fn test_discover_readinessrc() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".readinessrc.json");
        fs::write(&config_path, MINIMAL).unwrap();

        let result = discover_config(dir.path()).unwrap();
        let (config, path) = result.unwrap();
        assert_eq!(config.variant, Variant::Agency);
        assert_eq!(path, config_path);
    }

    #[test]
    fn test_discover_package_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{
            "name": "marketing-site",
            "version": "1.0.0",
            "readiness": {"variant": "in_house", "recommendationLimit": 3}
        }"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.variant, Variant::InHouse);
        assert_eq!(config.recommendation_limit, Some(3));
    }

    #[test]
    fn test_discover_package_json_without_readiness_key() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "site"}"#).unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_package_key_reports_package_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "site", "readiness": {"variant": "agency", "bogus": 1}}"#,
        )
        .unwrap();
        let err = discover_config(dir.path()).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("invalid config in"));
        assert!(message.contains("package.json"));
    }

    #[test]
    fn test_discover_priority_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".readinessrc.json"),
            r#"{"variant": "agency", "recommendationLimit": 1}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("readiness.config.json"),
            r#"{"variant": "agency", "recommendationLimit": 2}"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(
            config.recommendation_limit,
            Some(1),
            ".readinessrc.json should take priority"
        );
    }

    #[test]
    fn test_load_and_resolve_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = load_and_resolve(dir.path(), None, Some(Variant::InHouse)).unwrap();
        assert!(resolved.config_path.is_none());
        assert_eq!(resolved.variant, Variant::InHouse);
        assert!(resolved.is_known_service("content_production"));
    }

    #[test]
    fn test_load_and_resolve_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("custom.json");
        fs::write(&config_path, MINIMAL).unwrap();

        let resolved = load_and_resolve(dir.path(), Some(&config_path), None).unwrap();
        assert_eq!(resolved.config_path, Some(config_path));
        assert_eq!(resolved.service_ids().count(), 2);
    }

    #[test]
    fn test_load_and_resolve_rejects_variant_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("custom.json");
        fs::write(&config_path, MINIMAL).unwrap();

        let result = load_and_resolve(dir.path(), Some(&config_path), Some(Variant::InHouse));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("broken.json");
        fs::write(&config_path, "{ not json").unwrap();
        let err = load_config_file(&config_path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
    }
}
