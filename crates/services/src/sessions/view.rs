use serde::{Deserialize, Serialize};

use quiz_core::model::{Question, QuestionId, Session, UserId};

/// One user's test run: who is answering plus the session state.
///
/// Plain data, so a front end can keep it across redraws or serialize it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTest {
    user_id: UserId,
    session: Session,
}

impl ActiveTest {
    #[must_use]
    pub fn new(user_id: UserId, session: Session) -> Self {
        Self { user_id, session }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

/// What the front end shows after a submission.
///
/// No pre-formatted strings; correct options keep the order the question
/// lists them in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFeedback {
    pub question_id: QuestionId,
    pub correct: bool,
    pub correct_options: Vec<String>,
    pub explanation: Option<String>,
    pub is_last: bool,
}

impl SubmissionFeedback {
    #[must_use]
    pub fn for_question(question: &Question, correct: bool, is_last: bool) -> Self {
        Self {
            question_id: question.id(),
            correct,
            correct_options: question
                .correct_in_order()
                .into_iter()
                .map(str::to_owned)
                .collect(),
            explanation: question.explanation().map(str::to_owned),
            is_last,
        }
    }
}
