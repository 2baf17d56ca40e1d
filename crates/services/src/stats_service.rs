use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;

use quiz_core::model::UserId;
use quiz_core::stats::{self, Accuracy, Score, TrendPoint};
use storage::repository::{AnswerEventRepository, NamedAnswerEvent};

use crate::error::StatsError;
use crate::user_service::UserService;

/// Read-only aggregates over the answer log.
#[derive(Clone)]
pub struct StatsService {
    users: UserService,
    answers: Arc<dyn AnswerEventRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(users: UserService, answers: Arc<dyn AnswerEventRepository>) -> Self {
        Self { users, answers }
    }

    /// Accuracy of one user over every recorded answer.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` on backend failures.
    pub async fn per_user(&self, user_id: UserId) -> Result<Accuracy, StatsError> {
        let events = self.answers.events_for_user(user_id).await?;
        Ok(Accuracy::from_outcomes(events.iter().map(|e| e.correct)))
    }

    /// Accuracy of the user registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::User` with kind `NotFound` for unknown names.
    pub async fn per_user_by_name(&self, name: &str) -> Result<Accuracy, StatsError> {
        let user_id = self.users.resolve(name).await?;
        self.per_user(user_id).await
    }

    /// Correct/total per user name; users without answers are omitted.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` on backend failures.
    pub async fn global_summary(&self) -> Result<BTreeMap<String, Score>, StatsError> {
        let events = self.answers.all_events_named().await?;
        Ok(stats::summarize_by_user(
            events.iter().map(|e| (e.user_name.as_str(), e.event.correct)),
        ))
    }

    /// Daily accuracy per user, keyed by UTC date then name.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` on backend failures.
    pub async fn trend(&self) -> Result<BTreeMap<(NaiveDate, String), TrendPoint>, StatsError> {
        let events = self.answers.all_events_named().await?;
        Ok(stats::daily_trend(events.iter().map(trend_row)))
    }
}

fn trend_row(e: &NamedAnswerEvent) -> (&str, bool, chrono::DateTime<chrono::Utc>) {
    (e.user_name.as_str(), e.event.correct, e.event.answered_at)
}
