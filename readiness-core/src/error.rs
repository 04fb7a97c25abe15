//! Typed errors for scoring and session handling
//!
//! Scoring functions never substitute defaults on their own. Callers pick a
//! `MissingDimensionPolicy` or handle the error explicitly.

use crate::model::{Dimension, Variant};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("no answers contribute to dimension '{0}'")]
    MissingDimension(Dimension),
    #[error("malformed answer for question '{question_id}': {reason}")]
    MalformedAnswer { question_id: String, reason: String },
    #[error("at least one service must be selected")]
    EmptyServiceSelection,
    #[error("unknown service: {0}")]
    UnknownService(String),
    #[error("unknown question: {0}")]
    UnknownQuestion(String),
    #[error("malformed input '{field}': {reason}")]
    MalformedInput { field: &'static str, reason: String },
}

impl ScoringError {
    pub(crate) fn malformed_answer(question_id: &str, reason: impl Into<String>) -> Self {
        ScoringError::MalformedAnswer {
            question_id: question_id.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("step '{step}' is not complete: {reason}")]
    StepIncomplete { step: &'static str, reason: String },
    #[error("operation not allowed in step '{0}'")]
    InvalidStep(&'static str),
    #[error("no configuration for variant '{0}'")]
    UnsupportedVariant(Variant),
    #[error("question '{0}' is not part of the current selection")]
    InactiveQuestion(String),
    #[error("question '{question_id}' has no option {option_index}")]
    InvalidOption {
        question_id: String,
        option_index: usize,
    },
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}
