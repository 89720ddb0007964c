//! The survey session state machine.
//!
//! A session is `AwaitingAnswer(step)` for each step in order, then
//! `Complete`. Transitions mutate the in-memory sheet and report what the
//! caller must persist; the session itself never touches storage.

use crate::errors::DomainError;
use crate::survey::{AnswerSheet, AnswerValue, SurveyStep};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    AwaitingAnswer { step: usize },
    Complete,
}

/// Result of a successful `next` transition. Either way the caller
/// persists the full answer set; `Completed` additionally triggers
/// summary synthesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextOutcome {
    Advanced { step: usize },
    Completed,
}

#[derive(Clone, Debug)]
pub struct SurveySession<S: AnswerSheet> {
    answers: S,
    state: SessionState,
}

impl<S: AnswerSheet> SurveySession<S> {
    /// Reconstruct the initial state from persisted data: a stored summary
    /// means the survey is complete, otherwise it restarts at step 0 with
    /// the existing values filled in.
    pub fn resume(answers: S, summary_present: bool) -> Self {
        let state = if summary_present {
            SessionState::Complete
        } else {
            SessionState::AwaitingAnswer { step: 0 }
        };
        Self { answers, state }
    }

    /// Rebuild a session positioned at a known step, for stateless callers
    /// that carry the step between requests.
    pub fn at_step(answers: S, step: usize) -> Result<Self, DomainError> {
        let len = S::definition().len();
        if step >= len {
            return Err(DomainError::StepOutOfRange { step, len });
        }
        Ok(Self { answers, state: SessionState::AwaitingAnswer { step } })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn answers(&self) -> &S {
        &self.answers
    }

    pub fn into_answers(self) -> S {
        self.answers
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    pub fn current_step(&self) -> Option<usize> {
        match self.state {
            SessionState::AwaitingAnswer { step } => Some(step),
            SessionState::Complete => None,
        }
    }

    pub fn current_step_definition(&self) -> Option<&'static SurveyStep> {
        self.current_step().and_then(|step| S::definition().step(step))
    }

    fn awaiting_step(&self) -> Result<usize, DomainError> {
        self.current_step().ok_or(DomainError::SurveyComplete)
    }

    /// Accept an answer for the current step and advance. The effective
    /// value is the submitted text when non-empty, otherwise the value
    /// already on the sheet; an empty effective value is rejected. The
    /// step index never advances past the last step: finishing there
    /// transitions to `Complete` instead.
    pub fn next(&mut self, submitted: Option<&str>) -> Result<NextOutcome, DomainError> {
        let step = self.awaiting_step()?;
        let definition = S::definition();
        let step_def = definition
            .step(step)
            .ok_or(DomainError::StepOutOfRange { step, len: definition.len() })?;

        let effective = match submitted.map(str::trim).filter(|text| !text.is_empty()) {
            Some(text) => AnswerValue::from_submitted(step_def.value_kind, text),
            None => self
                .answers
                .value_at(step)
                .filter(|value| !value.is_empty())
                .ok_or(DomainError::EmptyAnswer { field: step_def.field })?,
        };
        if effective.is_empty() {
            return Err(DomainError::EmptyAnswer { field: step_def.field });
        }
        self.answers.set_at(step, Some(effective))?;

        if step + 1 == definition.len() {
            self.state = SessionState::Complete;
            Ok(NextOutcome::Completed)
        } else {
            self.state = SessionState::AwaitingAnswer { step: step + 1 };
            Ok(NextOutcome::Advanced { step: step + 1 })
        }
    }

    /// Step back one question. Saturates at 0; nothing is persisted.
    pub fn previous(&mut self) -> Result<usize, DomainError> {
        let step = self.awaiting_step()?;
        let target = step.saturating_sub(1);
        self.state = SessionState::AwaitingAnswer { step: target };
        Ok(target)
    }

    /// The current field's value flattened to plain text, as handed to the
    /// answer enhancer.
    pub fn current_value_text(&self) -> Result<String, DomainError> {
        let step = self.awaiting_step()?;
        let step_def = S::definition()
            .step(step)
            .ok_or(DomainError::StepOutOfRange { step, len: S::definition().len() })?;
        let value = self
            .answers
            .value_at(step)
            .filter(|value| !value.is_empty())
            .ok_or(DomainError::EmptyAnswer { field: step_def.field })?;
        Ok(value.as_plain_text())
    }

    /// Replace the current field with enhanced text. List fields derive
    /// their items by comma-splitting the enhanced text. The caller
    /// persists immediately; the step does not move.
    pub fn apply_enhanced(&mut self, enhanced: &str) -> Result<AnswerValue, DomainError> {
        let step = self.awaiting_step()?;
        let step_def = S::definition()
            .step(step)
            .ok_or(DomainError::StepOutOfRange { step, len: S::definition().len() })?;

        let value = AnswerValue::from_submitted(step_def.value_kind, enhanced);
        if value.is_empty() {
            return Err(DomainError::EmptyAnswer { field: step_def.field });
        }
        self.answers.set_at(step, Some(value.clone()))?;
        Ok(value)
    }

    /// Return to step 0 keeping every answered value. The caller discards
    /// the stored summary alongside.
    pub fn restart(&mut self) {
        self.state = SessionState::AwaitingAnswer { step: 0 };
    }
}
