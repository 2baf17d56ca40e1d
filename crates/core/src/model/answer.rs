use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{QuestionId, UserId};

//
// ─── ANSWER SET ────────────────────────────────────────────────────────────────
//

/// Options selected by the user for one question. Order does not matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet(BTreeSet<String>);

impl AnswerSet {
    /// Singleton set for single-answer questions.
    #[must_use]
    pub fn single(option: impl Into<String>) -> Self {
        Self(BTreeSet::from([option.into()]))
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn as_set(&self) -> &BTreeSet<String> {
        &self.0
    }

    #[must_use]
    pub fn contains(&self, option: &str) -> bool {
        self.0.contains(option)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

//
// ─── ANSWER EVENT ──────────────────────────────────────────────────────────────
//

/// Immutable record of one graded submission.
///
/// Events are append-only; answering the same question again in a later
/// session produces another event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerEvent {
    pub user_id: UserId,
    pub question_id: QuestionId,
    pub correct: bool,
    pub answered_at: DateTime<Utc>,
}

impl AnswerEvent {
    #[must_use]
    pub fn new(
        user_id: UserId,
        question_id: QuestionId,
        correct: bool,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            question_id,
            correct,
            answered_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_collapse() {
        let set: AnswerSet = ["a", "b", "a"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains("a"));
    }

    #[test]
    fn single_is_singleton() {
        let set = AnswerSet::single("x");
        assert_eq!(set.len(), 1);
        assert!(!AnswerSet::empty().contains("x"));
    }
}
