use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::{self, CharClass, LiveMetrics};
use crate::model::lesson::LessonText;
use crate::model::result::SessionResult;

//
// ─── MODE & STATE ──────────────────────────────────────────────────────────────
//

/// How a session ends besides typing the whole text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionMode {
    /// Countdown of `duration_secs`; expiry finishes the session.
    TimeBoxed { duration_secs: u32 },
    /// Only completion finishes the session.
    Unbounded,
}

impl SessionMode {
    #[must_use]
    pub fn time_boxed(duration_secs: u32) -> Self {
        Self::TimeBoxed { duration_secs }
    }

    #[must_use]
    pub fn duration_secs(&self) -> Option<u32> {
        match self {
            SessionMode::TimeBoxed { duration_secs } => Some(*duration_secs),
            SessionMode::Unbounded => None,
        }
    }

    /// Short label used on the wire and in storage.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            SessionMode::TimeBoxed { .. } => "time",
            SessionMode::Unbounded => "words",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Running,
    Finished,
}

/// What a single input update did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputOutcome {
    /// The session left `Idle` with this input.
    pub started: bool,
    /// `Some(correct)` when the update appended a character.
    pub appended: Option<bool>,
    /// The session reached `Finished` with this input.
    pub finished: bool,
    /// The session was already finished and the input was dropped.
    pub ignored: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, or not time-boxed.
    Ignored,
    Counting { remaining: u32 },
    Expired,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One typing attempt against one lesson.
///
/// A finished session is never reopened; restarting means building a new one.
#[derive(Debug, Clone)]
pub struct TypingSession {
    lesson: LessonText,
    target_len: usize,
    typed: String,
    typed_len: usize,
    mode: SessionMode,
    time_remaining: u32,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    cap_overtype: bool,
}

impl TypingSession {
    #[must_use]
    pub fn new(lesson: LessonText, mode: SessionMode) -> Self {
        Self {
            lesson,
            target_len: lesson.char_len(),
            typed: String::new(),
            typed_len: 0,
            mode,
            time_remaining: mode.duration_secs().unwrap_or(0),
            state: SessionState::Idle,
            started_at: None,
            finished_at: None,
            cap_overtype: false,
        }
    }

    /// Truncate input longer than the target instead of keeping the extra characters.
    #[must_use]
    pub fn with_overtype_cap(mut self, cap_overtype: bool) -> Self {
        self.cap_overtype = cap_overtype;
        self
    }

    #[must_use]
    pub fn lesson(&self) -> &LessonText {
        &self.lesson
    }

    #[must_use]
    pub fn target_text(&self) -> &str {
        self.lesson.content
    }

    #[must_use]
    pub fn typed_text(&self) -> &str {
        &self.typed
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == SessionState::Finished
    }

    /// Replaces the typed buffer with the latest full input value.
    ///
    /// The first non-empty value starts the clock. Reaching the target length
    /// finishes the session in every mode.
    pub fn set_input(&mut self, full_value: &str, now: DateTime<Utc>) -> InputOutcome {
        if self.is_finished() {
            return InputOutcome {
                ignored: true,
                ..InputOutcome::default()
            };
        }

        let mut value: String = full_value.to_owned();
        let mut value_len = value.chars().count();
        if self.cap_overtype && value_len > self.target_len {
            value = value.chars().take(self.target_len).collect();
            value_len = self.target_len;
        }

        let mut outcome = InputOutcome::default();
        if self.state == SessionState::Idle && value_len > 0 {
            self.state = SessionState::Running;
            self.started_at = Some(now);
            outcome.started = true;
        }

        if value_len > self.typed_len {
            outcome.appended = Some(metrics::char_matches(
                &value,
                self.target_text(),
                value_len - 1,
            ));
        }

        self.typed = value;
        self.typed_len = value_len;

        if self.state == SessionState::Running && self.typed_len >= self.target_len {
            self.finish(now);
            outcome.finished = true;
        }
        outcome
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.state != SessionState::Running || self.mode.duration_secs().is_none() {
            return TickOutcome::Ignored;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        self.expire_if_due(now)
    }

    /// Like [`tick`](Self::tick), but derives the remaining time from the wall clock.
    pub fn tick_resynced(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let (Some(duration), Some(started_at)) = (self.mode.duration_secs(), self.started_at)
        else {
            return TickOutcome::Ignored;
        };
        if self.state != SessionState::Running {
            return TickOutcome::Ignored;
        }
        let elapsed = u32::try_from((now - started_at).num_seconds().max(0)).unwrap_or(u32::MAX);
        // Never move backwards relative to the tick counter.
        let by_clock = duration.saturating_sub(elapsed);
        self.time_remaining = by_clock.min(self.time_remaining.saturating_sub(1));
        self.expire_if_due(now)
    }

    fn expire_if_due(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.time_remaining == 0 {
            self.finish(now);
            TickOutcome::Expired
        } else {
            TickOutcome::Counting {
                remaining: self.time_remaining,
            }
        }
    }

    fn finish(&mut self, now: DateTime<Utc>) {
        self.state = SessionState::Finished;
        self.finished_at = Some(now);
    }

    /// Metrics as of `now`; frozen at the finish instant once finished.
    #[must_use]
    pub fn metrics(&self, now: DateTime<Utc>) -> LiveMetrics {
        let at = self.finished_at.unwrap_or(now);
        metrics::compute_live_metrics(&self.typed, self.target_text(), self.started_at, at)
    }

    #[must_use]
    pub fn char_classes(&self) -> Vec<CharClass> {
        metrics::classify_chars(&self.typed, self.target_text())
    }

    /// Share of the target covered by input, 0..=100.
    #[must_use]
    pub fn progress_percent(&self) -> u32 {
        if self.target_len == 0 {
            return 100;
        }
        let covered = self.typed_len.min(self.target_len);
        u32::try_from(covered * 100 / self.target_len).unwrap_or(100)
    }

    /// The finalized result, available once the session has finished.
    #[must_use]
    pub fn result(&self) -> Option<SessionResult> {
        let finished_at = self.finished_at?;
        let metrics = self.metrics(finished_at);
        let elapsed_ms = self
            .started_at
            .map_or(0, |start| (finished_at - start).num_milliseconds().max(0));
        let duration_secs = u32::try_from((elapsed_ms + 500) / 1_000).unwrap_or(u32::MAX);

        Some(SessionResult::finalized(
            self.lesson.id,
            self.lesson.title,
            self.mode,
            &metrics,
            duration_secs,
            finished_at,
        ))
    }
}
