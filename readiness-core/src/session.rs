//! Assessment session state machine
//!
//! Steps run linearly: type selection, service selection, questions, contact,
//! results. `results` is terminal and only `reset` leaves it.
//!
//! Global invariants enforced:
//! - A session owns all of its state; there is no shared or global state
//! - Answers only exist for questions active under the current selection
//! - Results are computed once on entering the results step

use crate::assessor::{Assessor, BusinessContext};
use crate::config::ResolvedConfig;
use crate::error::{ScoringError, SessionError};
use crate::model::{Answer, AnswerSet, Question, Variant};
use crate::report::Results;
use crate::valuation::RiskFactor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Assessment step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    TypeSelection,
    ServiceSelection,
    Questions,
    Contact,
    Results,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::TypeSelection,
        Step::ServiceSelection,
        Step::Questions,
        Step::Contact,
        Step::Results,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::TypeSelection => "type_selection",
            Step::ServiceSelection => "service_selection",
            Step::Questions => "questions",
            Step::Contact => "contact",
            Step::Results => "results",
        }
    }

    fn next(self) -> Option<Step> {
        match self {
            Step::TypeSelection => Some(Step::ServiceSelection),
            Step::ServiceSelection => Some(Step::Questions),
            Step::Questions => Some(Step::Contact),
            Step::Contact => Some(Step::Results),
            Step::Results => None,
        }
    }

    fn prev(self) -> Option<Step> {
        match self {
            Step::TypeSelection => None,
            Step::ServiceSelection => Some(Step::TypeSelection),
            Step::Questions => Some(Step::ServiceSelection),
            Step::Contact => Some(Step::Questions),
            Step::Results => Some(Step::Contact),
        }
    }
}

/// Contact details collected before results are shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl Contact {
    fn problem(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some("name is required");
        }
        match self.email.trim().split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => None,
            _ => Some("a valid email address is required"),
        }
    }
}

/// Answered vs. total active questions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

pub struct Session {
    assessors: Vec<Assessor>,
    step: Step,
    variant: Option<Variant>,
    selected_services: Vec<String>,
    answers: AnswerSet,
    context: BusinessContext,
    contact: Option<Contact>,
    results: Option<Results>,
}

impl Session {
    /// Session over one resolved configuration per supported variant
    pub fn new(configs: Vec<ResolvedConfig>) -> Self {
        Session {
            assessors: configs.into_iter().map(Assessor::new).collect(),
            step: Step::TypeSelection,
            variant: None,
            selected_services: Vec::new(),
            answers: AnswerSet::new(),
            context: BusinessContext::default(),
            contact: None,
            results: None,
        }
    }

    /// Session over the built-in agency and in-house configurations
    pub fn builtin() -> anyhow::Result<Self> {
        Ok(Session::new(vec![
            ResolvedConfig::builtin(Variant::Agency)?,
            ResolvedConfig::builtin(Variant::InHouse)?,
        ]))
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn variant(&self) -> Option<Variant> {
        self.variant
    }

    pub fn selected_services(&self) -> &[String] {
        &self.selected_services
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn contact(&self) -> Option<&Contact> {
        self.contact.as_ref()
    }

    pub fn results(&self) -> Option<&Results> {
        self.results.as_ref()
    }

    fn require_step(&self, allowed: &[Step]) -> Result<(), SessionError> {
        if allowed.contains(&self.step) {
            Ok(())
        } else {
            Err(SessionError::InvalidStep(self.step.as_str()))
        }
    }

    fn assessor_for(&self, variant: Variant) -> Option<&Assessor> {
        self.assessors
            .iter()
            .find(|a| a.config().variant == variant)
    }

    fn current_assessor(&self) -> Option<&Assessor> {
        self.variant.and_then(|v| self.assessor_for(v))
    }

    /// Configuration of the chosen variant
    pub fn config(&self) -> Option<&ResolvedConfig> {
        self.current_assessor().map(Assessor::config)
    }

    /// Choose the assessment variant; switching variants clears later steps
    pub fn select_variant(&mut self, variant: Variant) -> Result<(), SessionError> {
        self.require_step(&[Step::TypeSelection])?;
        if self.assessor_for(variant).is_none() {
            return Err(SessionError::UnsupportedVariant(variant));
        }
        if self.variant != Some(variant) {
            self.selected_services.clear();
            self.answers.clear();
        }
        self.variant = Some(variant);
        Ok(())
    }

    /// Choose services; answers to questions that leave the active set are dropped
    pub fn select_services<I, S>(&mut self, services: I) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require_step(&[Step::ServiceSelection])?;
        let config = self
            .config()
            .ok_or(SessionError::InvalidStep(self.step.as_str()))?;

        let mut seen = BTreeSet::new();
        let mut selected = Vec::new();
        for service in services {
            let service: String = service.into();
            if !config.is_known_service(&service) {
                return Err(ScoringError::UnknownService(service).into());
            }
            if seen.insert(service.clone()) {
                selected.push(service);
            }
        }

        let active: BTreeSet<String> = config
            .active_questions(&selected)
            .into_iter()
            .map(|q| q.id.clone())
            .collect();
        let before = self.answers.len();
        self.answers.retain(|a| active.contains(&a.question_id));
        if self.answers.len() < before {
            tracing::debug!(
                dropped = before - self.answers.len(),
                "dropped answers for deselected services"
            );
        }

        self.selected_services = selected;
        Ok(())
    }

    /// Questions active for the current variant and service selection
    pub fn questions(&self) -> Vec<&Question> {
        match self.config() {
            Some(config) => config.active_questions(&self.selected_services),
            None => Vec::new(),
        }
    }

    pub fn progress(&self) -> Progress {
        let questions = self.questions();
        let answered = questions
            .iter()
            .filter(|q| self.answers.contains(&q.id))
            .count();
        Progress {
            answered,
            total: questions.len(),
        }
    }

    /// Record or overwrite the answer to an active question
    pub fn answer(&mut self, question_id: &str, option_index: usize) -> Result<(), SessionError> {
        self.require_step(&[Step::Questions])?;
        let answer = {
            let question = self
                .questions()
                .into_iter()
                .find(|q| q.id == question_id)
                .ok_or_else(|| SessionError::InactiveQuestion(question_id.to_string()))?;
            if option_index >= question.options.len() {
                return Err(SessionError::InvalidOption {
                    question_id: question_id.to_string(),
                    option_index,
                });
            }
            Answer::from_question(question, option_index)?
        };
        self.answers.record(answer);
        Ok(())
    }

    /// Risk factors and EBITDA used by the valuation
    pub fn set_business_context(
        &mut self,
        risk_factors: Vec<RiskFactor>,
        ebitda: Option<f64>,
    ) -> Result<(), SessionError> {
        self.require_step(&[Step::Questions, Step::Contact])?;
        self.context = BusinessContext {
            risk_factors,
            ebitda,
        };
        Ok(())
    }

    pub fn set_contact(&mut self, contact: Contact) -> Result<(), SessionError> {
        self.require_step(&[Step::Contact])?;
        self.contact = Some(contact);
        Ok(())
    }

    fn incomplete(&self, reason: impl Into<String>) -> SessionError {
        SessionError::StepIncomplete {
            step: self.step.as_str(),
            reason: reason.into(),
        }
    }

    fn validate_current_step(&self) -> Result<(), SessionError> {
        match self.step {
            Step::TypeSelection => {
                if self.variant.is_none() {
                    return Err(self.incomplete("choose an assessment type"));
                }
            }
            Step::ServiceSelection => {
                if self.selected_services.is_empty() {
                    return Err(self.incomplete("select at least one service"));
                }
            }
            Step::Questions => {
                let progress = self.progress();
                if progress.answered < progress.total {
                    return Err(self.incomplete(format!(
                        "{} of {} questions answered",
                        progress.answered, progress.total
                    )));
                }
            }
            Step::Contact => match &self.contact {
                None => return Err(self.incomplete("contact details are required")),
                Some(contact) => {
                    if let Some(problem) = contact.problem() {
                        return Err(self.incomplete(problem));
                    }
                }
            },
            Step::Results => return Err(SessionError::InvalidStep(self.step.as_str())),
        }
        Ok(())
    }

    /// Validate the current step and advance; leaving contact computes results
    pub fn next(&mut self) -> Result<Step, SessionError> {
        self.validate_current_step()?;
        let next = self
            .step
            .next()
            .ok_or(SessionError::InvalidStep(self.step.as_str()))?;

        if next == Step::Results {
            let assessor = self
                .current_assessor()
                .ok_or(SessionError::InvalidStep(self.step.as_str()))?;
            let results =
                assessor.assess_answers(&self.selected_services, &self.answers, &self.context)?;
            tracing::debug!(overall = results.scores.overall, "assessment complete");
            self.results = Some(results);
        }

        self.step = next;
        Ok(next)
    }

    /// Move one step back; a no-op on the first step, refused from results
    pub fn back(&mut self) -> Result<Step, SessionError> {
        if self.step == Step::Results {
            return Err(SessionError::InvalidStep(self.step.as_str()));
        }
        if let Some(prev) = self.step.prev() {
            self.step = prev;
        }
        Ok(self.step)
    }

    /// Clear all answers, selections and results and return to the first step
    pub fn reset(&mut self) {
        self.step = Step::TypeSelection;
        self.variant = None;
        self.selected_services.clear();
        self.answers.clear();
        self.context = BusinessContext::default();
        self.contact = None;
        self.results = None;
    }
}
