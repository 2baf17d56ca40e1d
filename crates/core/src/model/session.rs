use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::answer::AnswerSet;
use crate::model::ids::QuestionId;
use crate::model::question::{LoadedQuestion, Question};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Operation attempted outside its valid state transition.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no test has been started")]
    NotStarted,
    #[error("session already completed")]
    Completed,
    #[error("current question was already answered")]
    AlreadyAnswered,
    #[error("current question has not been answered yet")]
    NotAnswered,
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a test run.
///
/// `NotStarted → InProgress{answered: false} → InProgress{answered: true} →
/// InProgress{index + 1, answered: false} → … → Completed`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    NotStarted,
    InProgress {
        index: usize,
        answered: bool,
        last_outcome: Option<bool>,
    },
    Completed,
}

/// Grading result for the current question, not yet applied to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub question_id: QuestionId,
    pub correct: bool,
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Transient state of one user's test run.
///
/// A plain value: handlers receive it by reference, and it can be serialized
/// to survive a UI rerun. A completed session is never restarted in place by
/// the services layer; starting a new test builds a fresh one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    questions: Vec<LoadedQuestion>,
    state: SessionState,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a session already started on `questions`.
    #[must_use]
    pub fn started(questions: Vec<LoadedQuestion>) -> Self {
        let mut session = Self::new();
        session.start(questions);
        session
    }

    /// Replace whatever was running with a fresh run over `questions`.
    ///
    /// An empty sequence completes immediately.
    pub fn start(&mut self, questions: Vec<LoadedQuestion>) {
        self.state = if questions.is_empty() {
            SessionState::Completed
        } else {
            SessionState::InProgress {
                index: 0,
                answered: false,
                last_outcome: None,
            }
        };
        self.questions = questions;
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn questions(&self) -> &[LoadedQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.state, SessionState::Completed)
    }

    /// Whether the current question has been submitted and awaits `advance`.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        matches!(self.state, SessionState::InProgress { answered: true, .. })
    }

    /// Outcome of the last submission for the current question, if any.
    #[must_use]
    pub fn last_outcome(&self) -> Option<bool> {
        match self.state {
            SessionState::InProgress {
                answered: true,
                last_outcome,
                ..
            } => last_outcome,
            _ => None,
        }
    }

    /// Index of the current question; `total()` once completed.
    #[must_use]
    pub fn current_index(&self) -> usize {
        match self.state {
            SessionState::NotStarted => 0,
            SessionState::InProgress { index, .. } => index,
            SessionState::Completed => self.questions.len(),
        }
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.total();
        let answered = match self.state {
            SessionState::NotStarted => 0,
            SessionState::InProgress {
                index, answered, ..
            } => index + usize::from(answered),
            SessionState::Completed => total,
        };
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }

    /// The question being asked together with its source file.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` or `SessionError::Completed` outside
    /// of a running test.
    pub fn current_loaded(&self) -> Result<&LoadedQuestion, SessionError> {
        match self.state {
            SessionState::NotStarted => Err(SessionError::NotStarted),
            SessionState::Completed => Err(SessionError::Completed),
            SessionState::InProgress { index, .. } => {
                self.questions.get(index).ok_or(SessionError::Completed)
            }
        }
    }

    /// The question being asked.
    ///
    /// # Errors
    ///
    /// Same as [`Session::current_loaded`].
    pub fn current(&self) -> Result<&Question, SessionError> {
        self.current_loaded().map(LoadedQuestion::question)
    }

    /// Grade `answers` against the current question without changing state.
    ///
    /// Callers persist the outcome and then call [`Session::mark_answered`],
    /// so a failed write leaves the question open for another attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyAnswered` when the current question was
    /// already submitted, or the errors of [`Session::current_loaded`].
    pub fn grade_current(&self, answers: &AnswerSet) -> Result<Submission, SessionError> {
        if self.is_answered() {
            return Err(SessionError::AlreadyAnswered);
        }
        let question = self.current()?;
        Ok(Submission {
            question_id: question.id(),
            correct: question.grade(answers),
        })
    }

    /// Record the outcome of the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyAnswered` if called twice before
    /// `advance`, or `NotStarted`/`Completed` outside of a running test.
    pub fn mark_answered(&mut self, correct: bool) -> Result<(), SessionError> {
        match self.state {
            SessionState::NotStarted => Err(SessionError::NotStarted),
            SessionState::Completed => Err(SessionError::Completed),
            SessionState::InProgress { answered: true, .. } => Err(SessionError::AlreadyAnswered),
            SessionState::InProgress { index, .. } => {
                self.state = SessionState::InProgress {
                    index,
                    answered: true,
                    last_outcome: Some(correct),
                };
                Ok(())
            }
        }
    }

    /// Grade and mark the current question in one step, without persistence.
    ///
    /// # Errors
    ///
    /// Same as [`Session::grade_current`].
    pub fn submit(&mut self, answers: &AnswerSet) -> Result<Submission, SessionError> {
        let submission = self.grade_current(answers)?;
        self.mark_answered(submission.correct)?;
        Ok(submission)
    }

    /// Move past an answered question; completes the session after the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAnswered` if the current question has not
    /// been submitted, or `NotStarted`/`Completed` outside of a running test.
    pub fn advance(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::NotStarted => Err(SessionError::NotStarted),
            SessionState::Completed => Err(SessionError::Completed),
            SessionState::InProgress {
                answered: false, ..
            } => Err(SessionError::NotAnswered),
            SessionState::InProgress { index, .. } => {
                let next = index + 1;
                self.state = if next >= self.questions.len() {
                    SessionState::Completed
                } else {
                    SessionState::InProgress {
                        index: next,
                        answered: false,
                        last_outcome: None,
                    }
                };
                Ok(())
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
