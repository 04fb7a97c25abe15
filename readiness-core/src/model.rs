//! Assessment domain types shared by the scorer, the session and the config
//!
//! Questions are static configuration. Answers are created when a user picks
//! an option, overwritten on reselect and never removed within a session
//! (except when the question they belong to leaves the active set).

use crate::error::ScoringError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Highest raw score an answer option may carry
pub const MAX_OPTION_SCORE: u8 = 5;

/// Assessment dimension
///
/// Declaration order is the canonical output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Operational,
    Financial,
    #[serde(alias = "transformation", alias = "ai_readiness")]
    Ai,
    Strategic,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Operational,
        Dimension::Financial,
        Dimension::Ai,
        Dimension::Strategic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Operational => "operational",
            Dimension::Financial => "financial",
            Dimension::Ai => "ai",
            Dimension::Strategic => "strategic",
        }
    }

    /// Human-readable label used in text reports and insights
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Operational => "Operational efficiency",
            Dimension::Financial => "Financial resilience",
            Dimension::Ai => "AI readiness",
            Dimension::Strategic => "Strategic positioning",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assessment variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Agency,
    #[serde(alias = "in-house", alias = "inhouse")]
    InHouse,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Agency => "agency",
            Variant::InHouse => "in_house",
        }
    }

    /// What the selectable units are called for this variant
    pub fn units_label(&self) -> &'static str {
        match self {
            Variant::Agency => "services",
            Variant::InHouse => "activities",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agency" => Ok(Variant::Agency),
            "in_house" | "in-house" | "inhouse" => Ok(Variant::InHouse),
            other => Err(format!("unknown variant '{}' (expected agency or in_house)", other)),
        }
    }
}

/// One selectable option of a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnswerOption {
    pub text: String,
    pub score: u8,
}

fn default_weight() -> f64 {
    1.0
}

/// A weighted multiple-choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub dimension: Dimension,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub text: String,
    pub options: Vec<AnswerOption>,
}

/// A recorded answer to a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub option_index: usize,
    pub score: u8,
    pub dimension: Dimension,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl Answer {
    /// Unweighted answer, as produced by callers that only know the raw score
    pub fn new(question_id: impl Into<String>, score: u8, dimension: Dimension) -> Self {
        Answer {
            question_id: question_id.into(),
            option_index: 0,
            score,
            dimension,
            weight: 1.0,
        }
    }

    /// Resolve an option pick against its question
    pub fn from_question(question: &Question, option_index: usize) -> Result<Self, ScoringError> {
        let option = question.options.get(option_index).ok_or_else(|| {
            ScoringError::malformed_answer(
                &question.id,
                format!(
                    "option index {} out of range ({} options)",
                    option_index,
                    question.options.len()
                ),
            )
        })?;

        let answer = Answer {
            question_id: question.id.clone(),
            option_index,
            score: option.score,
            dimension: question.dimension,
            weight: question.weight,
        };
        answer.check()?;
        Ok(answer)
    }

    /// Reject scores outside 0..=5 and unusable weights
    pub fn check(&self) -> Result<(), ScoringError> {
        if self.score > MAX_OPTION_SCORE {
            return Err(ScoringError::malformed_answer(
                &self.question_id,
                format!("score {} exceeds {}", self.score, MAX_OPTION_SCORE),
            ));
        }
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(ScoringError::malformed_answer(
                &self.question_id,
                format!("weight must be positive and finite (got {})", self.weight),
            ));
        }
        Ok(())
    }
}

/// Answers keyed by question id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    answers: BTreeMap<String, Answer>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the answer for its question, returning the previous one
    pub fn record(&mut self, answer: Answer) -> Option<Answer> {
        self.answers.insert(answer.question_id.clone(), answer)
    }

    pub fn get(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.answers.contains_key(question_id)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Answers in question id order
    pub fn iter(&self) -> impl Iterator<Item = &Answer> {
        self.answers.values()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&Answer) -> bool) {
        self.answers.retain(|_, answer| keep(answer));
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }
}

impl FromIterator<Answer> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = Answer>>(iter: I) -> Self {
        let mut set = AnswerSet::new();
        for answer in iter {
            set.record(answer);
        }
        set
    }
}
