use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grader;
use crate::model::answer::AnswerSet;
use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has no options")]
    NoOptions { id: QuestionId },

    #[error("question {id} has no correct options")]
    NoCorrectOptions { id: QuestionId },

    #[error("question {id}: correct option {option:?} is not one of its options")]
    UnknownCorrectOption { id: QuestionId, option: String },
}

//
// ─── FILE SHAPE ────────────────────────────────────────────────────────────────
//

/// Unvalidated question exactly as it appears in a question file.
///
/// Question files are JSON arrays of these objects; the field names are the
/// ones used by the existing question banks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub id: QuestionId,
    #[serde(rename = "pregunta")]
    pub prompt: String,
    #[serde(rename = "respuestas")]
    pub options: Vec<String>,
    #[serde(rename = "respuestas_correctas")]
    pub correct_options: Vec<String>,
    #[serde(
        rename = "explicacion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub explanation: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if there are no options, no correct options, or a
    /// correct option that is not listed among the options.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let id = self.id;
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions { id });
        }
        if self.correct_options.is_empty() {
            return Err(QuestionError::NoCorrectOptions { id });
        }
        if let Some(option) = self
            .correct_options
            .iter()
            .find(|c| !self.options.contains(*c))
        {
            return Err(QuestionError::UnknownCorrectOption {
                id,
                option: option.clone(),
            });
        }

        Ok(Question {
            id,
            prompt: self.prompt,
            options: self.options,
            correct_options: self.correct_options.into_iter().collect(),
            explanation: self.explanation,
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDraft", into = "QuestionDraft")]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_options: BTreeSet<String>,
    explanation: Option<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Options in the order the file lists them.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_options(&self) -> &BTreeSet<String> {
        &self.correct_options
    }

    /// Correct options in display order (the order of `options`).
    #[must_use]
    pub fn correct_in_order(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|o| self.correct_options.contains(*o))
            .map(String::as_str)
            .collect()
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// More than one correct option: the front end must offer multi-select.
    #[must_use]
    pub fn is_multi_select(&self) -> bool {
        self.correct_options.len() > 1
    }

    /// Grade a submission against this question's correct options.
    #[must_use]
    pub fn grade(&self, submitted: &AnswerSet) -> bool {
        grader::grade(submitted, &self.correct_options)
    }
}

impl TryFrom<QuestionDraft> for Question {
    type Error = QuestionError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<Question> for QuestionDraft {
    fn from(q: Question) -> Self {
        let correct_options = q
            .options
            .iter()
            .filter(|o| q.correct_options.contains(*o))
            .cloned()
            .collect();
        Self {
            id: q.id,
            prompt: q.prompt,
            options: q.options,
            correct_options,
            explanation: q.explanation,
        }
    }
}

/// A question paired with the file it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedQuestion {
    question: Question,
    source_file: String,
}

impl LoadedQuestion {
    #[must_use]
    pub fn new(question: Question, source_file: impl Into<String>) -> Self {
        Self {
            question,
            source_file: source_file.into(),
        }
    }

    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.question.id()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(options: &[&str], correct: &[&str]) -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::new(1),
            prompt: "Which?".into(),
            options: options.iter().map(ToString::to_string).collect(),
            correct_options: correct.iter().map(ToString::to_string).collect(),
            explanation: None,
        }
    }

    #[test]
    fn correct_option_must_be_listed() {
        let err = draft(&["a", "b"], &["c"]).validate().unwrap_err();
        assert!(matches!(
            err,
            QuestionError::UnknownCorrectOption { ref option, .. } if option == "c"
        ));
    }

    #[test]
    fn empty_lists_are_rejected() {
        assert!(matches!(
            draft(&[], &["a"]).validate().unwrap_err(),
            QuestionError::NoOptions { .. }
        ));
        assert!(matches!(
            draft(&["a"], &[]).validate().unwrap_err(),
            QuestionError::NoCorrectOptions { .. }
        ));
    }

    #[test]
    fn parses_question_file_entry() {
        let json = r#"{
            "id": 7,
            "pregunta": "2 + 2?",
            "respuestas": ["3", "4", "5"],
            "respuestas_correctas": ["4"],
            "explicacion": "arithmetic"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.id(), QuestionId::new(7));
        assert_eq!(q.options().len(), 3);
        assert!(!q.is_multi_select());
        assert_eq!(q.explanation(), Some("arithmetic"));
    }

    #[test]
    fn missing_correct_answers_field_fails_to_parse() {
        let json = r#"{"id": 1, "pregunta": "?", "respuestas": ["a"]}"#;
        let err = serde_json::from_str::<Question>(json).unwrap_err();
        assert!(err.to_string().contains("respuestas_correctas"));
    }

    #[test]
    fn correct_in_order_follows_option_order() {
        let q = draft(&["z", "y", "x"], &["x", "z"]).validate().unwrap();
        assert_eq!(q.correct_in_order(), vec!["z", "x"]);
        assert!(q.is_multi_select());
    }
}
