//! Live typing metrics.
//!
//! Everything here is a pure function of the typed buffer, the target text and
//! two instants. Nothing is cached between calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Characters counted as one "word" for WPM.
pub const CHARS_PER_WORD: u64 = 5;

/// Lower bound on elapsed time, so WPM stays finite on the first keystroke.
pub const MIN_ELAPSED_MS: i64 = 1;

const MS_PER_MINUTE: u64 = 60_000;

/// Rendering state of a single target glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharClass {
    Untyped,
    Correct,
    Incorrect,
}

/// Snapshot of correctness and speed at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveMetrics {
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub wpm: u32,
    pub accuracy: u32,
}

impl Default for LiveMetrics {
    fn default() -> Self {
        Self {
            correct_chars: 0,
            incorrect_chars: 0,
            wpm: 0,
            accuracy: 100,
        }
    }
}

impl LiveMetrics {
    /// Characters actually typed, correct or not.
    #[must_use]
    pub fn typed_chars(&self) -> usize {
        self.correct_chars + self.incorrect_chars
    }
}

/// Computes live metrics for `typed` against `target`.
///
/// Positions past the end of `target` count as incorrect. With no start
/// instant (nothing typed yet) WPM is 0.
#[must_use]
pub fn compute_live_metrics(
    typed: &str,
    target: &str,
    started_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> LiveMetrics {
    let (correct_chars, incorrect_chars) = count_chars(typed, target);

    let wpm = started_at.map_or(0, |start| {
        let elapsed_ms = (now - start).num_milliseconds().max(MIN_ELAPSED_MS);
        words_per_minute(correct_chars, elapsed_ms)
    });

    LiveMetrics {
        correct_chars,
        incorrect_chars,
        wpm,
        accuracy: accuracy_percent(correct_chars, incorrect_chars),
    }
}

/// Classifies every glyph of `target` against `typed`.
#[must_use]
pub fn classify_chars(typed: &str, target: &str) -> Vec<CharClass> {
    let mut typed_chars = typed.chars();
    target
        .chars()
        .map(|expected| match typed_chars.next() {
            None => CharClass::Untyped,
            Some(actual) if actual == expected => CharClass::Correct,
            Some(_) => CharClass::Incorrect,
        })
        .collect()
}

/// Whether the character at `index` of `typed` matches the target.
#[must_use]
pub fn char_matches(typed: &str, target: &str, index: usize) -> bool {
    match (typed.chars().nth(index), target.chars().nth(index)) {
        (Some(actual), Some(expected)) => actual == expected,
        _ => false,
    }
}

fn count_chars(typed: &str, target: &str) -> (usize, usize) {
    let mut expected = target.chars();
    let mut correct = 0;
    let mut total = 0;
    for actual in typed.chars() {
        total += 1;
        if expected.next() == Some(actual) {
            correct += 1;
        }
    }
    (correct, total - correct)
}

/// `round_half_up((correct / 5) / (elapsed_ms / 60000))`, in integer arithmetic.
fn words_per_minute(correct_chars: usize, elapsed_ms: i64) -> u32 {
    let elapsed_ms = u64::try_from(elapsed_ms).unwrap_or(u64::MAX).max(1);
    let correct = correct_chars as u64;
    let numerator = 2 * correct * MS_PER_MINUTE + CHARS_PER_WORD * elapsed_ms;
    let denominator = 2 * CHARS_PER_WORD * elapsed_ms;
    u32::try_from(numerator / denominator).unwrap_or(u32::MAX)
}

fn accuracy_percent(correct: usize, incorrect: usize) -> u32 {
    let total = (correct + incorrect) as u64;
    if total == 0 {
        return 100;
    }
    let rounded = (200 * correct as u64 + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(100)
}
