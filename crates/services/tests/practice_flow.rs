use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use learn_core::model::{
    PracticeSettings, PracticeSettingsDraft, SessionMode, SessionResult, SessionState, StudentId,
    select_lesson,
};
use learn_core::time::fixed_clock;
use services::practice::TICK_PERIOD;
use services::{
    AppServices, HistoryEntry, HistoryError, HistoryGateway, NoopBeeper, PracticeEvent,
    PracticeLoop, PracticeNotice, RecordingBeeper, SubmissionAck, Tone,
};
use tokio::sync::mpsc::UnboundedReceiver;

fn settings(duration_secs: Option<u32>) -> PracticeSettings {
    PracticeSettingsDraft {
        category: Some("beginner".into()),
        lesson_index: 3,
        duration_secs,
        ..PracticeSettingsDraft::default()
    }
    .validate()
    .unwrap()
}

fn student() -> StudentId {
    StudentId::new("stu-42").unwrap()
}

fn drain(notices: &mut UnboundedReceiver<PracticeNotice>) -> Vec<PracticeNotice> {
    let mut out = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        out.push(notice);
    }
    out
}

/// Gateway that rejects the first `failures` submissions.
struct FlakyGateway {
    failures: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl HistoryGateway for FlakyGateway {
    async fn submit(
        &self,
        _student_id: &StudentId,
        _result: &SessionResult,
    ) -> Result<SubmissionAck, HistoryError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(HistoryError::Disabled);
        }
        Ok(SubmissionAck {
            id: Some(format!("remote-{call}")),
        })
    }

    async fn fetch(&self, _student_id: &StudentId) -> Result<Vec<HistoryEntry>, HistoryError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn completed_session_is_saved_to_history() {
    let services = AppServices::in_memory(fixed_clock());
    let beeper = RecordingBeeper::new();
    let (mut practice, _handle, mut notices) =
        services.practice_loop(settings(None), Arc::new(beeper.clone()), Some(student()));

    let text = select_lesson("beginner", 3).content;
    let head: String = text.chars().take(3).collect();
    assert!(practice.handle(PracticeEvent::Input(head)).is_continue());
    services.clock().advance_millis(10_000);
    assert!(
        practice
            .handle(PracticeEvent::Input(text.to_string()))
            .is_continue()
    );

    let mut finished = None;
    let mut submitted = None;
    while submitted.is_none() {
        match notices.recv().await.unwrap() {
            PracticeNotice::Finished(result) => finished = Some(result),
            PracticeNotice::Submitted { result, ack } => submitted = Some((result, ack)),
            PracticeNotice::Updated(_) => {}
            other => panic!("unexpected notice: {other:?}"),
        }
    }
    let finished = finished.unwrap();
    let (saved, ack) = submitted.unwrap();
    assert_eq!(finished, saved);
    assert_eq!(ack.id.as_deref(), Some("1"));
    assert_eq!(finished.accuracy(), 100);
    assert_eq!(finished.duration_secs(), 10);
    assert_eq!(beeper.tones().first(), Some(&Tone::Click));

    let page = services.history_service().load(&student()).await.unwrap();
    assert_eq!(page.entries.len(), 1);
    assert_eq!(page.entries[0].lesson, "Short Words");
    assert_eq!(page.summary.sessions, 1);
    assert_eq!(page.summary.best_wpm, finished.wpm());
}

#[tokio::test]
async fn failed_submission_can_be_retried() {
    let gateway = Arc::new(FlakyGateway {
        failures: 1,
        calls: AtomicUsize::new(0),
    });
    let services = AppServices::from_gateway(fixed_clock(), gateway.clone());
    let (mut practice, _handle, mut notices) =
        services.practice_loop(settings(None), Arc::new(NoopBeeper), Some(student()));

    let text = select_lesson("beginner", 3).content;
    let _ = practice.handle(PracticeEvent::Input(text.to_string()));

    let failed = loop {
        if let PracticeNotice::SubmissionFailed { result, error } = notices.recv().await.unwrap() {
            assert!(!error.is_empty());
            break result;
        }
    };
    // The failure leaves the finished session alone.
    assert_eq!(practice.controller().snapshot().state, SessionState::Finished);

    // And never blocks the next attempt.
    let _ = practice.handle(PracticeEvent::Restart);
    let _ = practice.handle(PracticeEvent::Input("t".into()));
    assert_eq!(practice.controller().snapshot().state, SessionState::Running);

    let _ = practice.handle(PracticeEvent::Resubmit(failed.clone()));
    loop {
        if let PracticeNotice::Submitted { result, ack } = notices.recv().await.unwrap() {
            assert_eq!(result, failed);
            assert_eq!(ack.id.as_deref(), Some("remote-1"));
            break;
        }
    }
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn anonymous_practice_is_not_persisted() {
    let services = AppServices::in_memory(fixed_clock());
    let (mut practice, _handle, mut notices) =
        services.practice_loop(settings(None), Arc::new(NoopBeeper), None);

    let text = select_lesson("beginner", 3).content;
    let _ = practice.handle(PracticeEvent::Input(text.to_string()));
    tokio::task::yield_now().await;

    let notices = drain(&mut notices);
    assert!(matches!(notices.last(), Some(PracticeNotice::Finished(_))));
    let page = services.history_service().load(&student()).await.unwrap();
    assert!(page.entries.is_empty());
}

#[tokio::test]
async fn stale_ticks_and_shutdown() {
    let (mut practice, _handle, mut notices) =
        PracticeLoop::new(settings(Some(30)), fixed_clock(), Arc::new(NoopBeeper));

    let _ = practice.handle(PracticeEvent::Input("t".into()));
    let _ = practice.handle(PracticeEvent::Restart);
    drain(&mut notices);

    // The tick belongs to the abandoned session.
    let _ = practice.handle(PracticeEvent::Tick { epoch: 0 });
    assert!(drain(&mut notices).is_empty());
    assert_eq!(practice.controller().snapshot().time_remaining, 30);

    assert_eq!(practice.handle(PracticeEvent::Shutdown), ControlFlow::Break(()));
}

#[tokio::test]
async fn page_commands_publish_snapshots() {
    let (mut practice, _handle, mut notices) =
        PracticeLoop::new(settings(Some(30)), fixed_clock(), Arc::new(NoopBeeper));

    let _ = practice.handle(PracticeEvent::SelectLesson {
        category: "advanced".into(),
        index: 1,
    });
    let _ = practice.handle(PracticeEvent::SetMode(SessionMode::time_boxed(15)));
    let _ = practice.handle(PracticeEvent::SetSound(false));

    let snapshots: Vec<_> = drain(&mut notices)
        .into_iter()
        .filter_map(|notice| match notice {
            PracticeNotice::Updated(snapshot) => Some(snapshot),
            _ => None,
        })
        .collect();
    assert_eq!(snapshots.len(), 3);
    let last = snapshots.last().unwrap();
    assert_eq!(last.category, "advanced");
    assert_eq!(last.lesson, *select_lesson("advanced", 1));
    assert_eq!(last.time_remaining, 15);
    assert!(!last.sound_enabled);
    assert_eq!(last.state, SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn countdown_runs_to_expiry_on_the_real_ticker() {
    let (practice, handle, mut notices) =
        PracticeLoop::new(settings(Some(3)), fixed_clock(), Arc::new(NoopBeeper));
    let task = tokio::spawn(practice.run());

    assert!(handle.input("t"));
    let mut remaining = Vec::new();
    let result = loop {
        match notices.recv().await.unwrap() {
            PracticeNotice::Updated(snapshot) if snapshot.state == SessionState::Running => {
                remaining.push(snapshot.time_remaining);
            }
            PracticeNotice::Finished(result) => break result,
            _ => {}
        }
    };
    assert_eq!(remaining, vec![3, 2, 1]);
    assert_eq!(result.mode(), SessionMode::time_boxed(3));

    // The timer died with the session.
    tokio::time::sleep(TICK_PERIOD * 3).await;
    let late = drain(&mut notices);
    assert!(
        !late
            .iter()
            .any(|notice| matches!(notice, PracticeNotice::Updated(_))),
        "snapshot published after finish: {late:?}"
    );

    assert!(handle.shutdown());
    task.await.unwrap();
}
