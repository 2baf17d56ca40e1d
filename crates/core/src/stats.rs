//! Accuracy aggregation over answer events.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

/// Correct and total answer counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub correct: u64,
    pub total: u64,
}

impl Score {
    pub fn record(&mut self, correct: bool) {
        self.total = self.total.saturating_add(1);
        if correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    /// Share of correct answers in percent, `None` when nothing was answered.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(self.correct as f64 / self.total as f64 * 100.0)
    }
}

/// Accuracy of one user, distinguishing "never answered" from a zero score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    NoData,
    Scored(Score),
}

impl Accuracy {
    #[must_use]
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = bool>) -> Self {
        let mut score = Score::default();
        for correct in outcomes {
            score.record(correct);
        }
        if score.total == 0 {
            Self::NoData
        } else {
            Self::Scored(score)
        }
    }

    #[must_use]
    pub fn score(&self) -> Option<Score> {
        match self {
            Self::NoData => None,
            Self::Scored(score) => Some(*score),
        }
    }

    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.score().and_then(|s| s.percentage())
    }
}

/// Mean accuracy and sample size for one user on one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    pub accuracy_pct: f64,
    pub samples: u64,
}

/// Totals per user name.
pub fn summarize_by_user<'a>(
    rows: impl IntoIterator<Item = (&'a str, bool)>,
) -> BTreeMap<String, Score> {
    let mut totals: BTreeMap<String, Score> = BTreeMap::new();
    for (name, correct) in rows {
        totals.entry(name.to_owned()).or_default().record(correct);
    }
    totals
}

/// Daily accuracy per user.
///
/// Days are UTC calendar dates of the answer timestamp, so an answer given
/// just after midnight UTC counts for the new day regardless of the local
/// time zone.
pub fn daily_trend<'a>(
    rows: impl IntoIterator<Item = (&'a str, bool, DateTime<Utc>)>,
) -> BTreeMap<(NaiveDate, String), TrendPoint> {
    let mut buckets: BTreeMap<(NaiveDate, String), Score> = BTreeMap::new();
    for (name, correct, answered_at) in rows {
        buckets
            .entry((answered_at.date_naive(), name.to_owned()))
            .or_default()
            .record(correct);
    }

    buckets
        .into_iter()
        .filter_map(|(key, score)| {
            score.percentage().map(|accuracy_pct| {
                (
                    key,
                    TrendPoint {
                        accuracy_pct,
                        samples: score.total,
                    },
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn no_outcomes_is_no_data() {
        let acc = Accuracy::from_outcomes(std::iter::empty());
        assert_eq!(acc, Accuracy::NoData);
        assert_eq!(acc.percentage(), None);
    }

    #[test]
    fn zero_correct_is_still_scored() {
        let acc = Accuracy::from_outcomes([false, false]);
        assert_eq!(
            acc,
            Accuracy::Scored(Score {
                correct: 0,
                total: 2
            })
        );
        assert_eq!(acc.percentage(), Some(0.0));
    }

    #[test]
    fn summary_groups_by_name() {
        let totals = summarize_by_user([("ana", true), ("bo", false), ("ana", false)]);
        assert_eq!(totals["ana"], Score { correct: 1, total: 2 });
        assert_eq!(totals["bo"], Score { correct: 0, total: 1 });
    }

    #[test]
    fn trend_splits_on_utc_midnight() {
        let day_one = fixed_now();
        let day_two = day_one + Duration::days(1);
        let trend = daily_trend([
            ("ana", true, day_one),
            ("ana", false, day_one),
            ("ana", true, day_two),
            ("bo", true, day_one),
        ]);

        assert_eq!(trend.len(), 3);
        let first = trend[&(day_one.date_naive(), "ana".to_string())];
        assert!((first.accuracy_pct - 50.0).abs() < f64::EPSILON);
        assert_eq!(first.samples, 2);
        let second = trend[&(day_two.date_naive(), "ana".to_string())];
        assert!((second.accuracy_pct - 100.0).abs() < f64::EPSILON);
    }
}
