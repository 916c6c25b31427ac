use learn_core::model::{LessonText, SessionMode, SessionState};
use learn_core::{CharClass, LiveMetrics};

/// Everything a view needs to render the practice page at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeSnapshot {
    /// Identifies the session; changes on restart and lesson switches.
    pub epoch: u64,
    pub category: &'static str,
    pub lesson: LessonText,
    pub state: SessionState,
    pub mode: SessionMode,
    pub time_remaining: u32,
    pub metrics: LiveMetrics,
    pub progress_percent: u32,
    pub char_classes: Vec<CharClass>,
    pub sound_enabled: bool,
}

impl PracticeSnapshot {
    /// Countdown formatted as `m:ss`, or `None` for unbounded sessions.
    #[must_use]
    pub fn countdown_label(&self) -> Option<String> {
        self.mode.duration_secs().map(|_| {
            let minutes = self.time_remaining / 60;
            let seconds = self.time_remaining % 60;
            format!("{minutes}:{seconds:02}")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::model::select_lesson;

    fn snapshot(mode: SessionMode, time_remaining: u32) -> PracticeSnapshot {
        PracticeSnapshot {
            epoch: 0,
            category: "beginner",
            lesson: *select_lesson("beginner", 0),
            state: SessionState::Idle,
            mode,
            time_remaining,
            metrics: LiveMetrics::default(),
            progress_percent: 0,
            char_classes: Vec::new(),
            sound_enabled: true,
        }
    }

    #[test]
    fn countdown_label_pads_seconds() {
        assert_eq!(
            snapshot(SessionMode::time_boxed(90), 65).countdown_label(),
            Some("1:05".to_string())
        );
        assert_eq!(snapshot(SessionMode::Unbounded, 0).countdown_label(), None);
    }
}
