//! Readiness core library - AI readiness assessment scoring for agencies and in-house marketing teams

// Global invariants enforced in this crate:
// - Scoring is pure and synchronous
// - No global mutable state; configuration is passed explicitly
// - No randomness, clocks, threads, or async
// - Deterministic iteration order must be explicit
// - Identical input yields byte-for-byte identical output

pub mod assessor;
pub mod config;
pub mod error;
pub mod insight;
pub mod model;
pub mod recommend;
pub mod report;
pub mod scorer;
pub mod service;
pub mod session;
pub mod valuation;

pub use assessor::{AssessmentInput, Assessor, BusinessContext};
pub use config::{AssessmentConfig, ResolvedConfig};
pub use error::{ScoringError, SessionError};
pub use model::{Answer, AnswerSet, Dimension, Question, Variant};
pub use report::{render_json, render_text, Results};
pub use scorer::MissingDimensionPolicy;
pub use session::{Session, Step};

use anyhow::{Context, Result};
use std::path::Path;

/// Load an assessment submission from a JSON file
pub fn load_input(path: &Path) -> Result<AssessmentInput> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse answers file: {}", path.display()))
}

/// Assess a submission file against a resolved configuration
pub fn assess_file(path: &Path, config: &ResolvedConfig) -> Result<Results> {
    let input = load_input(path)?;
    let results = Assessor::new(config.clone())
        .assess(&input)
        .with_context(|| format!("failed to assess {}", path.display()))?;
    Ok(results)
}
