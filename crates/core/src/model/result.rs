use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::LiveMetrics;
use crate::model::ids::LessonId;
use crate::model::session::SessionMode;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionResultError {
    #[error("accuracy must be between 0 and 100, got {0}")]
    AccuracyOutOfRange(u32),

    #[error("lesson title cannot be empty")]
    EmptyLessonTitle,
}

/// Finalized outcome of one typing attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    lesson_id: LessonId,
    lesson_title: String,
    mode: SessionMode,
    wpm: u32,
    accuracy: u32,
    error_count: u32,
    duration_secs: u32,
    completed_at: DateTime<Utc>,
}

impl SessionResult {
    pub(crate) fn finalized(
        lesson_id: LessonId,
        lesson_title: &str,
        mode: SessionMode,
        metrics: &LiveMetrics,
        duration_secs: u32,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            lesson_id,
            lesson_title: lesson_title.to_owned(),
            mode,
            wpm: metrics.wpm,
            accuracy: metrics.accuracy,
            error_count: u32::try_from(metrics.incorrect_chars).unwrap_or(u32::MAX),
            duration_secs,
            completed_at,
        }
    }

    /// Rehydrate a result from storage or the backend.
    ///
    /// # Errors
    ///
    /// Returns `SessionResultError` if accuracy exceeds 100 or the title is blank.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        lesson_id: LessonId,
        lesson_title: impl Into<String>,
        mode: SessionMode,
        wpm: u32,
        accuracy: u32,
        error_count: u32,
        duration_secs: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SessionResultError> {
        let lesson_title = lesson_title.into();
        if lesson_title.trim().is_empty() {
            return Err(SessionResultError::EmptyLessonTitle);
        }
        if accuracy > 100 {
            return Err(SessionResultError::AccuracyOutOfRange(accuracy));
        }
        Ok(Self {
            lesson_id,
            lesson_title,
            mode,
            wpm,
            accuracy,
            error_count,
            duration_secs,
            completed_at,
        })
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn lesson_title(&self) -> &str {
        &self.lesson_title
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    #[must_use]
    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    #[must_use]
    pub fn accuracy(&self) -> u32 {
        self.accuracy
    }

    #[must_use]
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Wall-clock seconds between the first keystroke and the finish.
    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

/// Aggregate over a list of past results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HistorySummary {
    pub sessions: usize,
    pub best_wpm: u32,
    pub average_wpm: u32,
    pub average_accuracy: u32,
}

impl HistorySummary {
    #[must_use]
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a SessionResult>) -> Self {
        Self::from_scores(results.into_iter().map(|r| (r.wpm, r.accuracy)))
    }

    /// Summarize `(wpm, accuracy)` pairs; averages round half up.
    #[must_use]
    pub fn from_scores(scores: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut sessions = 0_u64;
        let mut best_wpm = 0;
        let mut wpm_total = 0_u64;
        let mut accuracy_total = 0_u64;
        for (wpm, accuracy) in scores {
            sessions += 1;
            best_wpm = best_wpm.max(wpm);
            wpm_total += u64::from(wpm);
            accuracy_total += u64::from(accuracy);
        }
        if sessions == 0 {
            return Self::default();
        }
        let average = |total: u64| {
            u32::try_from((2 * total + sessions) / (2 * sessions)).unwrap_or(u32::MAX)
        };
        Self {
            sessions: usize::try_from(sessions).unwrap_or(usize::MAX),
            best_wpm,
            average_wpm: average(wpm_total),
            average_accuracy: average(accuracy_total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn result(wpm: u32, accuracy: u32) -> SessionResult {
        SessionResult::from_persisted(
            LessonId::new(101),
            "Home Row",
            SessionMode::time_boxed(30),
            wpm,
            accuracy,
            2,
            30,
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_out_of_range_accuracy() {
        let err = SessionResult::from_persisted(
            LessonId::new(1),
            "x",
            SessionMode::Unbounded,
            10,
            101,
            0,
            5,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, SessionResultError::AccuracyOutOfRange(101));
    }

    #[test]
    fn rejects_blank_title() {
        let err = SessionResult::from_persisted(
            LessonId::new(1),
            "  ",
            SessionMode::Unbounded,
            10,
            90,
            0,
            5,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, SessionResultError::EmptyLessonTitle);
    }

    #[test]
    fn summary_over_results() {
        let results = [result(40, 90), result(55, 97), result(31, 88)];
        let summary = HistorySummary::from_results(&results);
        assert_eq!(summary.sessions, 3);
        assert_eq!(summary.best_wpm, 55);
        // (40 + 55 + 31) / 3 = 42
        assert_eq!(summary.average_wpm, 42);
        // (90 + 97 + 88) / 3 = 91.67
        assert_eq!(summary.average_accuracy, 92);
    }

    #[test]
    fn empty_summary_is_zeroed() {
        assert_eq!(HistorySummary::from_scores([]), HistorySummary::default());
    }

    #[test]
    fn mode_serializes_with_kind_tag() {
        let json = serde_json::to_value(result(40, 90)).unwrap();
        assert_eq!(json["mode"]["kind"], "time_boxed");
        assert_eq!(json["mode"]["duration_secs"], 30);
    }
}
