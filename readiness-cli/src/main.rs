//! Readiness CLI - AI readiness assessment for agencies and in-house teams

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output
// - Diagnostics go to stderr, results to stdout

use anyhow::Context;
use clap::{Parser, Subcommand};
use readiness_core::config::{self, ResolvedConfig};
use readiness_core::report::write_json;
use readiness_core::{
    load_input, render_json, render_text, AssessmentInput, Assessor, MissingDimensionPolicy,
    Variant,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "readiness")]
#[command(about = "AI readiness assessment: dimension scores, service exposure and valuation")]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a submission of answers
    Assess {
        /// Path to the answers JSON file
        answers: PathBuf,

        /// Assessment variant (default: taken from the submission, then agency)
        #[arg(long)]
        variant: Option<VariantArg>,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Also write the JSON results to this path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Fail when a dimension has no answers instead of scoring it neutral
        #[arg(long)]
        strict: bool,

        /// Show at most N recommendations (overrides config file)
        #[arg(long)]
        top: Option<usize>,
    },
    /// List the questions active for a service selection
    Questions {
        /// Assessment variant
        #[arg(long)]
        variant: Option<VariantArg>,

        /// Comma-separated service ids
        #[arg(long, value_delimiter = ',')]
        services: Vec<String>,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate or inspect configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without running an assessment
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (built-in defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Variant to show when no config file is found
        #[arg(long)]
        variant: Option<VariantArg>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum VariantArg {
    Agency,
    #[value(alias = "in_house")]
    InHouse,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Agency => Variant::Agency,
            VariantArg::InHouse => Variant::InHouse,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Assess {
            answers,
            variant,
            config: config_path,
            format,
            output,
            strict,
            top,
        } => {
            if !answers.exists() {
                anyhow::bail!("Path does not exist: {}", answers.display());
            }

            let mut input = load_input(&answers)?;
            let requested = apply_variant_flag(&mut input, variant.map(Variant::from));
            let resolved = load_config(config_path.as_deref(), requested)?;

            tracing::debug!(
                variant = %resolved.variant,
                services = input.selected_services.len(),
                answers = input.answers.len(),
                "running assessment"
            );
            let assessor = build_assessor(resolved, top, strict)?;

            let results = assessor
                .assess(&input)
                .with_context(|| format!("failed to assess {}", answers.display()))?;

            if let Some(output_path) = &output {
                write_json(output_path, &results)?;
                eprintln!("Results written to: {}", output_path.display());
            }

            match format {
                OutputFormat::Text => print!("{}", render_text(&results)),
                OutputFormat::Json => println!("{}", render_json(&results)),
            }
        }
        Commands::Questions {
            variant,
            services,
            config: config_path,
        } => {
            let resolved = load_config(config_path.as_deref(), variant.map(Variant::from))?;

            for service_id in &services {
                if !resolved.is_known_service(service_id) {
                    anyhow::bail!(
                        "unknown service '{}' (known: {})",
                        service_id,
                        resolved.service_ids().collect::<Vec<_>>().join(", ")
                    );
                }
            }

            print!("{}", render_questions(&resolved, &services));
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref(), None);

                match resolved {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using built-in configuration.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path, variant } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(
                    &project_root,
                    path.as_deref(),
                    variant.map(Variant::from),
                )
                .context("failed to load configuration")?;

                print!("{}", render_config(&resolved));
            }
        },
    }

    Ok(())
}

/// Variant to load config for; an explicit flag replaces the submission's own
fn apply_variant_flag(input: &mut AssessmentInput, flag: Option<Variant>) -> Option<Variant> {
    if let Some(variant) = flag {
        input.variant = Some(variant);
    }
    input.variant
}

/// Assessor with CLI overrides applied on top of the resolved config
fn build_assessor(
    mut resolved: ResolvedConfig,
    top: Option<usize>,
    strict: bool,
) -> anyhow::Result<Assessor> {
    if let Some(top) = top {
        if top == 0 {
            anyhow::bail!("--top must be at least 1");
        }
        resolved.recommendation_limit = top;
    }

    let assessor = Assessor::new(resolved);
    Ok(if strict {
        assessor.with_missing_dimension(MissingDimensionPolicy::Fail)
    } else {
        assessor
    })
}

fn load_config(
    config_path: Option<&Path>,
    variant: Option<Variant>,
) -> anyhow::Result<ResolvedConfig> {
    let project_root = std::env::current_dir()?;
    let resolved = config::load_and_resolve(&project_root, config_path, variant)
        .context("failed to load configuration")?;

    if let Some(path) = &resolved.config_path {
        eprintln!("Using config: {}", path.display());
    }
    Ok(resolved)
}

fn render_questions(config: &ResolvedConfig, services: &[String]) -> String {
    let mut out = String::new();
    for question in config.active_questions(services) {
        let owner = config
            .find_question(&question.id)
            .and_then(|(_, owner)| owner)
            .map(|service_id| format!(" [{}]", config.service_name(service_id)))
            .unwrap_or_default();
        out.push_str(&format!(
            "{} ({}, weight {}){}\n",
            question.id,
            question.dimension.label(),
            question.weight,
            owner
        ));
        if !question.text.is_empty() {
            out.push_str(&format!("  {}\n", question.text));
        }
        for (index, option) in question.options.iter().enumerate() {
            out.push_str(&format!("    {}: {} (score {})\n", index, option.text, option.score));
        }
    }
    out
}

fn render_config(resolved: &ResolvedConfig) -> String {
    let mut out = String::new();
    out.push_str("Configuration:\n");
    match &resolved.config_path {
        Some(p) => out.push_str(&format!("  Source: {}\n", p.display())),
        None => out.push_str("  Source: built-in (no config file found)\n"),
    }
    out.push_str(&format!("  Variant: {}\n", resolved.variant));
    out.push('\n');

    out.push_str("Dimensions:\n");
    for dimension in &resolved.dimensions {
        let count = resolved
            .core_questions
            .iter()
            .filter(|q| q.dimension == *dimension)
            .count();
        out.push_str(&format!("  {}: {} core questions\n", dimension.label(), count));
    }
    out.push('\n');

    out.push_str("Thresholds:\n");
    out.push_str(&format!(
        "  readiness: medium > {}, high > {}\n",
        resolved.readiness_thresholds.medium, resolved.readiness_thresholds.high
    ));
    out.push_str(&format!(
        "  vulnerability: medium > {}, high > {}\n",
        resolved.vulnerability_thresholds.medium, resolved.vulnerability_thresholds.high
    ));
    out.push('\n');

    out.push_str(&format!("Services ({}):\n", resolved.vulnerability_table.len()));
    for (service_id, vulnerability) in &resolved.vulnerability_table {
        let questions = resolved
            .service_questions
            .get(service_id)
            .map(Vec::len)
            .unwrap_or(0);
        out.push_str(&format!(
            "  {} ({}): vulnerability {}, {} questions\n",
            service_id,
            resolved.service_name(service_id),
            vulnerability,
            questions
        ));
    }
    out.push('\n');

    out.push_str(&format!(
        "Recommendations: up to {}\n",
        resolved.recommendation_limit
    ));
    out.push_str(&format!(
        "Missing dimensions: {}\n",
        match resolved.missing_dimension {
            MissingDimensionPolicy::Neutral => "neutral",
            MissingDimensionPolicy::Fail => "fail",
        }
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::collections::BTreeMap;

    fn in_house_submission(variant: Option<Variant>) -> AssessmentInput {
        let answers: BTreeMap<String, usize> = [
            "ops_processes",
            "ops_tooling",
            "fin_budget_control",
            "fin_agency_spend",
            "ai_usage",
            "ai_governance",
            "strat_leadership",
            "strat_skills_plan",
        ]
        .into_iter()
        .map(|id| (id.to_string(), 1))
        .collect();
        AssessmentInput {
            variant,
            selected_services: vec!["brand_strategy".to_string()],
            answers,
            risk_factors: Vec::new(),
            ebitda: None,
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_questions_include_selected_service() {
        let resolved = ResolvedConfig::builtin(Variant::Agency).unwrap();
        let out = render_questions(&resolved, &["seo".to_string()]);
        assert!(out.contains("ops_workflows (Operational"));
        assert!(out.contains("svc_seo_automation"));
        assert!(out.contains("[SEO]"));
        assert!(!out.contains("svc_content_ai_drafts"));
    }

    #[test]
    fn test_render_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".readinessrc.json");
        std::fs::write(
            &path,
            r#"{
                "variant": "in_house",
                "questions": {"core": [{"id": "q1", "dimension": "ai", "options": [
                    {"text": "a", "score": 1}, {"text": "b", "score": 5}]}]},
                "serviceVulnerabilityTable": {"events": 25},
                "recommendationLimit": 2
            }"#,
        )
        .unwrap();

        let resolved = config::load_and_resolve(dir.path(), None, None).unwrap();
        let out = render_config(&resolved);
        assert!(out.contains("Variant: in_house"));
        assert!(out.contains("events (events): vulnerability 25, 0 questions"));
        assert!(out.contains("Recommendations: up to 2"));
    }

    #[test]
    fn test_variant_flag_overrides_submission_variant() {
        let mut input = in_house_submission(Some(Variant::Agency));
        let requested = apply_variant_flag(&mut input, Some(Variant::InHouse));
        assert_eq!(requested, Some(Variant::InHouse));

        let resolved = ResolvedConfig::builtin(Variant::InHouse).unwrap();
        let results = build_assessor(resolved, None, false)
            .unwrap()
            .assess(&input)
            .unwrap();
        assert_eq!(results.variant, Variant::InHouse);
    }

    #[test]
    fn test_submission_variant_used_without_flag() {
        let mut input = in_house_submission(Some(Variant::InHouse));
        assert_eq!(apply_variant_flag(&mut input, None), Some(Variant::InHouse));

        let mut unspecified = in_house_submission(None);
        assert_eq!(apply_variant_flag(&mut unspecified, None), None);
    }

    #[test]
    fn test_top_overrides_recommendation_limit() {
        let resolved = ResolvedConfig::builtin(Variant::InHouse).unwrap();
        let assessor = build_assessor(resolved.clone(), Some(2), false).unwrap();
        assert_eq!(assessor.config().recommendation_limit, 2);
        let results = assessor.assess(&in_house_submission(None)).unwrap();
        assert!(results.recommendations.len() <= 2);

        assert!(build_assessor(resolved, Some(0), false).is_err());
    }

    #[test]
    fn test_strict_fails_on_missing_dimension() {
        let mut input = in_house_submission(None);
        input.answers.retain(|id, _| id.starts_with("ops_"));

        let resolved = ResolvedConfig::builtin(Variant::InHouse).unwrap();
        assert!(build_assessor(resolved.clone(), None, false)
            .unwrap()
            .assess(&input)
            .is_ok());
        assert!(build_assessor(resolved, None, true)
            .unwrap()
            .assess(&input)
            .is_err());
    }
}
