//! Dimension scoring
//!
//! Global invariants enforced:
//! - Deterministic scores (ordered maps, fixed summation order)
//! - Monotonic rescale from the 0..=5 option scale to 0..=100
//! - Missing dimensions are resolved by an explicit policy, never silently

use crate::error::ScoringError;
use crate::model::{Answer, AnswerSet, Dimension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Score substituted for a dimension without answers under the neutral policy
pub const NEUTRAL_SCORE: f64 = 50.0;

/// What to do when a requested dimension has no contributing answers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDimensionPolicy {
    /// Substitute `NEUTRAL_SCORE`
    #[default]
    Neutral,
    /// Fail with `ScoringError::MissingDimension`
    Fail,
}

/// Per-dimension scores in canonical dimension order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionScores {
    scores: BTreeMap<Dimension, f64>,
}

impl DimensionScores {
    pub fn get(&self, dimension: Dimension) -> Option<f64> {
        self.scores.get(&dimension).copied()
    }

    /// Score for a dimension, or the neutral score if it was not requested
    pub fn get_or_neutral(&self, dimension: Dimension) -> f64 {
        self.get(dimension).unwrap_or(NEUTRAL_SCORE)
    }

    pub fn insert(&mut self, dimension: Dimension, score: f64) {
        self.scores.insert(dimension, score);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        self.scores.iter().map(|(d, s)| (*d, *s))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Highest-scoring dimension; ties resolve to the earlier dimension
    pub fn strongest(&self) -> Option<(Dimension, f64)> {
        self.iter()
            .fold(None, |best: Option<(Dimension, f64)>, (d, s)| match best {
                Some((_, bs)) if bs >= s => best,
                _ => Some((d, s)),
            })
    }

    /// Lowest-scoring dimension; ties resolve to the earlier dimension
    pub fn weakest(&self) -> Option<(Dimension, f64)> {
        self.iter()
            .fold(None, |worst: Option<(Dimension, f64)>, (d, s)| match worst {
                Some((_, ws)) if ws <= s => worst,
                _ => Some((d, s)),
            })
    }

    pub(crate) fn into_inner(self) -> BTreeMap<Dimension, f64> {
        self.scores
    }

    pub(crate) fn from_inner(scores: BTreeMap<Dimension, f64>) -> Self {
        DimensionScores { scores }
    }
}

/// Rescale an average raw score to 0..=100
///
/// Formula: (avg - 1) * 25, clamped to [0, 100]. An average below 1 maps to 0.
pub fn rescale(avg: f64) -> f64 {
    ((avg - 1.0) * 25.0).clamp(0.0, 100.0)
}

/// Weighted mean of raw answer scores, validating each answer
fn weighted_mean<'a, I>(answers: I) -> Result<Option<f64>, ScoringError>
where
    I: IntoIterator<Item = &'a Answer>,
{
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for answer in answers {
        answer.check()?;
        weighted_sum += f64::from(answer.score) * answer.weight;
        total_weight += answer.weight;
    }

    if total_weight > 0.0 {
        Ok(Some(weighted_sum / total_weight))
    } else {
        Ok(None)
    }
}

/// Score an arbitrary answer subset on the 0..=100 scale
///
/// Returns `None` when the subset is empty.
pub fn score_answers<'a, I>(answers: I) -> Result<Option<f64>, ScoringError>
where
    I: IntoIterator<Item = &'a Answer>,
{
    Ok(weighted_mean(answers)?.map(rescale))
}

/// Compute a score for every requested dimension
///
/// Answers for dimensions outside `dimensions` are ignored.
pub fn score_dimensions(
    answers: &AnswerSet,
    dimensions: &[Dimension],
    policy: MissingDimensionPolicy,
) -> Result<DimensionScores, ScoringError> {
    let mut grouped: BTreeMap<Dimension, Vec<&Answer>> = BTreeMap::new();
    for answer in answers.iter() {
        grouped.entry(answer.dimension).or_default().push(answer);
    }

    let mut scores = DimensionScores::default();
    for &dimension in dimensions {
        let contributing = grouped.remove(&dimension).unwrap_or_default();
        match score_answers(contributing)? {
            Some(score) => scores.insert(dimension, score),
            None => match policy {
                MissingDimensionPolicy::Neutral => {
                    tracing::warn!(%dimension, "no answers for dimension, using neutral score");
                    scores.insert(dimension, NEUTRAL_SCORE);
                }
                MissingDimensionPolicy::Fail => {
                    return Err(ScoringError::MissingDimension(dimension));
                }
            },
        }
    }

    for (dimension, ignored) in &grouped {
        tracing::debug!(%dimension, count = ignored.len(), "ignoring answers for unscored dimension");
    }

    Ok(scores)
}

/// Overall score: the plain mean of all dimension scores
pub fn overall_score(scores: &DimensionScores) -> f64 {
    if scores.is_empty() {
        return NEUTRAL_SCORE;
    }
    let sum: f64 = scores.iter().map(|(_, s)| s).sum();
    sum / scores.len() as f64
}
