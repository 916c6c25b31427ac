use std::fmt::Write as _;
use std::io::{self, Write as _};

use learn_core::CharClass;
use learn_core::model::SessionResult;
use services::history::HistoryPage;
use services::{Beeper, PracticeSnapshot, Tone};

/// Rings the terminal bell on mistakes; correct keys stay quiet.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl Beeper for TerminalBell {
    fn play(&self, tone: Tone) {
        if tone == Tone::Error {
            let mut stderr = io::stderr();
            let _ = stderr.write_all(b"\x07");
            let _ = stderr.flush();
        }
    }
}

/// The lesson text with mistakes underlined by `^`.
pub fn render_lesson(snapshot: &PracticeSnapshot) -> String {
    let mut marks = String::new();
    for class in &snapshot.char_classes {
        marks.push(match class {
            CharClass::Incorrect => '^',
            CharClass::Correct | CharClass::Untyped => ' ',
        });
    }
    let marks = marks.trim_end();
    if marks.is_empty() {
        snapshot.lesson.content.to_string()
    } else {
        format!("{}\n{marks}", snapshot.lesson.content)
    }
}

pub fn render_status(snapshot: &PracticeSnapshot) -> String {
    let mut line = String::new();
    if let Some(countdown) = snapshot.countdown_label() {
        let _ = write!(line, "[{countdown}] ");
    }
    let _ = write!(
        line,
        "{} wpm | {}% accuracy | {} errors | {}% done",
        snapshot.metrics.wpm,
        snapshot.metrics.accuracy,
        snapshot.metrics.incorrect_chars,
        snapshot.progress_percent
    );
    line
}

pub fn render_result(result: &SessionResult) -> String {
    format!(
        "Finished \"{}\" ({}): {} wpm, {}% accuracy, {} errors in {}s",
        result.lesson_title(),
        result.mode().label(),
        result.wpm(),
        result.accuracy(),
        result.error_count(),
        result.duration_secs()
    )
}

pub fn render_history(page: &HistoryPage) -> String {
    let mut out = String::new();
    if page.entries.is_empty() {
        out.push_str("No typing history yet.\n");
        return out;
    }
    let _ = writeln!(
        out,
        "{:<20} {:<24} {:>5} {:>5} {:>4} {:>6} {:>5}",
        "when", "lesson", "mode", "wpm", "acc", "errors", "secs"
    );
    for entry in &page.entries {
        let when = entry
            .completed_at
            .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d %H:%M").to_string());
        let _ = writeln!(
            out,
            "{:<20} {:<24} {:>5} {:>5} {:>3}% {:>6} {:>5}",
            when, entry.lesson, entry.mode, entry.wpm, entry.accuracy, entry.errors, entry.time
        );
    }
    let summary = page.summary;
    let _ = writeln!(
        out,
        "\n{} sessions | best {} wpm | average {} wpm | average accuracy {}%",
        summary.sessions, summary.best_wpm, summary.average_wpm, summary.average_accuracy
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::LiveMetrics;
    use learn_core::model::{SessionMode, SessionState, select_lesson};

    fn snapshot(classes: Vec<CharClass>) -> PracticeSnapshot {
        PracticeSnapshot {
            epoch: 1,
            category: "beginner",
            lesson: *select_lesson("beginner", 3),
            state: SessionState::Running,
            mode: SessionMode::time_boxed(60),
            time_remaining: 42,
            metrics: LiveMetrics {
                correct_chars: 2,
                incorrect_chars: 1,
                wpm: 31,
                accuracy: 67,
            },
            progress_percent: 6,
            char_classes: classes,
            sound_enabled: true,
        }
    }

    #[test]
    fn status_line_includes_countdown() {
        let line = render_status(&snapshot(Vec::new()));
        assert_eq!(line, "[0:42] 31 wpm | 67% accuracy | 1 errors | 6% done");
    }

    #[test]
    fn mistakes_are_marked_under_the_text() {
        let rendered = render_lesson(&snapshot(vec![
            CharClass::Correct,
            CharClass::Incorrect,
            CharClass::Untyped,
        ]));
        let (_, marks) = rendered.split_once('\n').unwrap();
        assert_eq!(marks, " ^");
    }
}
