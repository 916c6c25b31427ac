use std::sync::{Arc, Mutex, PoisonError};

/// Feedback sound played for a keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// The newest character matched the target.
    Click,
    /// The newest character did not match.
    Error,
}

/// Audio capability handed to the practice controller.
///
/// Implementations must not block; a slow device should drop tones instead.
pub trait Beeper: Send + Sync {
    fn play(&self, tone: Tone);
}

/// Silent beeper for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBeeper;

impl Beeper for NoopBeeper {
    fn play(&self, _tone: Tone) {}
}

/// Beeper that remembers what it was asked to play.
#[derive(Debug, Clone, Default)]
pub struct RecordingBeeper {
    tones: Arc<Mutex<Vec<Tone>>>,
}

impl RecordingBeeper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tones(&self) -> Vec<Tone> {
        self.tones
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Beeper for RecordingBeeper {
    fn play(&self, tone: Tone) {
        self.tones
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tone);
    }
}
