use std::sync::Arc;

use quiz_core::model::{
    AnswerEvent, AnswerSet, LoadedQuestion, Question, Session, SessionProgress, UserId,
};
use storage::repository::AnswerEventRepository;

use super::view::{ActiveTest, SubmissionFeedback};
use crate::Clock;
use crate::error::SessionError;
use crate::question_bank::{LoadMode, QuestionBank};

/// Orchestrates test start and persisted answering.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    bank: Arc<QuestionBank>,
    answers: Arc<dyn AnswerEventRepository>,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        bank: Arc<QuestionBank>,
        answers: Arc<dyn AnswerEventRepository>,
    ) -> Self {
        Self {
            clock,
            bank,
            answers,
        }
    }

    /// Load `files` and start a fresh test for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Questions` if any file cannot be loaded.
    pub async fn start_test(
        &self,
        user_id: UserId,
        files: &[String],
        mode: LoadMode,
    ) -> Result<ActiveTest, SessionError> {
        let questions = self.bank.load(files, mode).await?;
        Ok(self.start_with(user_id, questions))
    }

    /// Start a test over already loaded questions.
    #[must_use]
    pub fn start_with(&self, user_id: UserId, questions: Vec<LoadedQuestion>) -> ActiveTest {
        tracing::info!(user_id = %user_id, questions = questions.len(), "test started");
        ActiveTest::new(user_id, Session::started(questions))
    }

    /// Question currently awaiting an answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::State` if the test is not running.
    pub fn current<'a>(&self, test: &'a ActiveTest) -> Result<&'a Question, SessionError> {
        Ok(test.session().current()?)
    }

    /// Grade `answers` against the current question and record the outcome.
    ///
    /// The event is appended before the session is marked answered, so a
    /// storage failure leaves the question open for another try.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::State` outside `InProgress{answered: false}`,
    /// or `SessionError::Storage` if the event cannot be appended.
    pub async fn submit(
        &self,
        test: &mut ActiveTest,
        answers: &AnswerSet,
    ) -> Result<SubmissionFeedback, SessionError> {
        let submission = test.session().grade_current(answers)?;
        let event = AnswerEvent::new(
            test.user_id(),
            submission.question_id,
            submission.correct,
            self.clock.now(),
        );
        self.answers.append_event(&event).await?;

        let session = test.session_mut();
        session.mark_answered(submission.correct)?;
        tracing::info!(
            user_id = %event.user_id,
            question_id = %event.question_id,
            correct = event.correct,
            "answer recorded"
        );

        let is_last = session.current_index() + 1 == session.total();
        let question = session.current()?;
        Ok(SubmissionFeedback::for_question(
            question,
            submission.correct,
            is_last,
        ))
    }

    /// Move past the answered question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::State` if the current question is not answered yet.
    pub fn advance(&self, test: &mut ActiveTest) -> Result<SessionProgress, SessionError> {
        let session = test.session_mut();
        session.advance()?;
        let progress = session.progress();
        if progress.is_complete {
            tracing::info!(user_id = %test.user_id(), total = progress.total, "test completed");
        }
        Ok(progress)
    }
}
