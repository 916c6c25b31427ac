use std::sync::Arc;

use learn_core::Clock;
use learn_core::model::lesson::lessons;
use learn_core::model::{
    LessonCursor, PracticeSettings, SessionMode, SessionResult, SessionState, TickOutcome,
    TypingSession,
};
use rand::Rng;
use tokio::sync::mpsc::WeakUnboundedSender;
use tracing::{debug, info, warn};

use crate::beeper::{Beeper, Tone};
use crate::practice::{PracticeEvent, PracticeSnapshot, Ticker};

/// What a countdown tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickReport {
    /// The tick was queued by an earlier session and changed nothing.
    Stale,
    Applied,
    Finished(SessionResult),
}

/// Owns the active typing session and everything that reacts to it.
///
/// The controller is synchronous: callers hand it keystrokes and ticks and get
/// back a finalized result when a session ends. The countdown timer is started
/// when a session leaves `Idle` and cancelled on every exit from `Running`.
pub struct PracticeController {
    clock: Clock,
    beeper: Arc<dyn Beeper>,
    settings: PracticeSettings,
    mode: SessionMode,
    sound_enabled: bool,
    cursor: LessonCursor,
    session: TypingSession,
    epoch: u64,
    ticker: Option<Ticker>,
    ticks: Option<WeakUnboundedSender<PracticeEvent>>,
}

impl PracticeController {
    #[must_use]
    pub fn new(settings: PracticeSettings, clock: Clock, beeper: Arc<dyn Beeper>) -> Self {
        let cursor = LessonCursor::new(settings.category(), settings.lesson_index());
        let mode = settings.mode();
        let session = build_session(cursor, mode, &settings);
        Self {
            clock,
            beeper,
            sound_enabled: settings.sound_enabled(),
            settings,
            mode,
            cursor,
            session,
            epoch: 0,
            ticker: None,
            ticks: None,
        }
    }

    /// Deliver countdown ticks to `events` while a session is running.
    ///
    /// Without a tick channel the caller drives [`on_tick`](Self::on_tick) itself.
    #[must_use]
    pub fn with_ticks(mut self, events: WeakUnboundedSender<PracticeEvent>) -> Self {
        self.ticks = Some(events);
        self
    }

    #[must_use]
    pub fn session(&self) -> &TypingSession {
        &self.session
    }

    #[must_use]
    pub fn cursor(&self) -> LessonCursor {
        self.cursor
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    //
    // ─── KEYSTROKES AND TICKS ──────────────────────────────────────────────────
    //

    /// Feed the full current input value. Returns the result if this finished the session.
    pub fn set_input(&mut self, value: &str) -> Option<SessionResult> {
        let outcome = self.session.set_input(value, self.clock.now());
        if outcome.ignored {
            debug!(epoch = self.epoch, "input after finish ignored");
            return None;
        }

        if let Some(correct) = outcome.appended {
            if self.sound_enabled {
                self.beeper
                    .play(if correct { Tone::Click } else { Tone::Error });
            }
        }

        if outcome.started {
            info!(
                epoch = self.epoch,
                lesson = self.cursor.lesson().title,
                mode = self.mode.label(),
                "practice session started"
            );
            self.start_ticker();
        }

        if outcome.finished {
            return self.finalize();
        }
        None
    }

    /// Apply one countdown tick. Ticks from an earlier session are dropped.
    pub fn on_tick(&mut self, epoch: u64) -> TickReport {
        if epoch != self.epoch {
            debug!(epoch, current = self.epoch, "stale tick dropped");
            return TickReport::Stale;
        }
        let now = self.clock.now();
        let outcome = if self.settings.resync_timer() {
            self.session.tick_resynced(now)
        } else {
            self.session.tick(now)
        };
        match outcome {
            TickOutcome::Expired => self
                .finalize()
                .map_or(TickReport::Applied, TickReport::Finished),
            TickOutcome::Counting { .. } | TickOutcome::Ignored => TickReport::Applied,
        }
    }

    fn finalize(&mut self) -> Option<SessionResult> {
        self.stop_ticker();
        let result = self.session.result()?;
        info!(
            epoch = self.epoch,
            lesson = result.lesson_title(),
            wpm = result.wpm(),
            accuracy = result.accuracy(),
            errors = result.error_count(),
            duration_secs = result.duration_secs(),
            "practice session finished"
        );
        Some(result)
    }

    //
    // ─── LESSON AND MODE CHANGES ───────────────────────────────────────────────
    //

    /// Start over on the same lesson. A running attempt is abandoned without a result.
    pub fn restart(&mut self) {
        self.replace_session(self.cursor);
    }

    pub fn select_lesson(&mut self, category: &str, index: usize) {
        self.replace_session(LessonCursor::new(category, index));
    }

    pub fn next_lesson(&mut self) {
        self.replace_session(self.cursor.next());
    }

    pub fn previous_lesson(&mut self) {
        self.replace_session(self.cursor.previous());
    }

    /// Jump to a random lesson of the current category, other than the current one.
    pub fn shuffle_lesson(&mut self, rng: &mut impl Rng) {
        let count = lessons(self.cursor.category()).len();
        if count < 2 {
            self.restart();
            return;
        }
        let mut index = rng.random_range(0..count - 1);
        if index >= self.cursor.index() {
            index += 1;
        }
        self.replace_session(LessonCursor::new(self.cursor.category(), index));
    }

    pub fn set_mode(&mut self, mode: SessionMode) {
        self.mode = mode;
        self.replace_session(self.cursor);
    }

    fn replace_session(&mut self, cursor: LessonCursor) {
        if self.session.state() == SessionState::Running {
            info!(epoch = self.epoch, "practice session abandoned");
        }
        self.stop_ticker();
        self.epoch = self.epoch.wrapping_add(1);
        self.cursor = cursor;
        self.session = build_session(cursor, self.mode, &self.settings);
    }

    fn start_ticker(&mut self) {
        let Some(events) = self.ticks.clone() else {
            return;
        };
        self.stop_ticker();
        self.ticker = Ticker::spawn(self.epoch, events);
        if self.ticker.is_none() {
            warn!("no async runtime available; countdown will not advance");
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    /// Current view of the page.
    #[must_use]
    pub fn snapshot(&self) -> PracticeSnapshot {
        PracticeSnapshot {
            epoch: self.epoch,
            category: self.cursor.category(),
            lesson: *self.cursor.lesson(),
            state: self.session.state(),
            mode: self.session.mode(),
            time_remaining: self.session.time_remaining(),
            metrics: self.session.metrics(self.clock.now()),
            progress_percent: self.session.progress_percent(),
            char_classes: self.session.char_classes(),
            sound_enabled: self.sound_enabled,
        }
    }
}

fn build_session(cursor: LessonCursor, mode: SessionMode, settings: &PracticeSettings) -> TypingSession {
    TypingSession::new(*cursor.lesson(), mode).with_overtype_cap(settings.cap_overtype())
}
