//! Answer grading.

use std::collections::BTreeSet;

use crate::model::AnswerSet;

/// Exact set equality between the submitted options and the correct ones.
///
/// Order is irrelevant and there is no partial credit: a subset or a superset
/// of the correct options is wrong.
#[must_use]
pub fn grade(submitted: &AnswerSet, correct: &BTreeSet<String>) -> bool {
    submitted.as_set() == correct
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn single_answer_matches_only_the_correct_option() {
        let correct = set(&["b"]);
        assert!(grade(&AnswerSet::single("b"), &correct));
        for wrong in ["a", "c", ""] {
            assert!(!grade(&AnswerSet::single(wrong), &correct));
        }
    }

    #[test]
    fn multi_answer_requires_exact_set() {
        let correct = set(&["a", "c"]);
        assert!(grade(&["c", "a"].into_iter().collect(), &correct));
        assert!(!grade(&AnswerSet::single("a"), &correct));
        assert!(!grade(&["a", "b", "c"].into_iter().collect(), &correct));
        assert!(!grade(&AnswerSet::empty(), &correct));
    }
}
