use std::ops::ControlFlow;
use std::sync::Arc;

use learn_core::Clock;
use learn_core::model::{PracticeSettings, SessionResult, StudentId};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::beeper::Beeper;
use crate::history::HistoryGateway;
use crate::practice::{PracticeController, PracticeEvent, PracticeNotice, TickReport};

/// Sending side of a practice loop.
#[derive(Debug, Clone)]
pub struct PracticeHandle {
    events: UnboundedSender<PracticeEvent>,
}

impl PracticeHandle {
    /// Queue an event. Returns `false` once the loop has stopped.
    pub fn send(&self, event: PracticeEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub fn input(&self, value: impl Into<String>) -> bool {
        self.send(PracticeEvent::Input(value.into()))
    }

    pub fn shutdown(&self) -> bool {
        self.send(PracticeEvent::Shutdown)
    }
}

struct HistorySink {
    gateway: Arc<dyn HistoryGateway>,
    student_id: StudentId,
}

/// Event loop around a [`PracticeController`].
///
/// Keystrokes, ticks and page commands arrive on one channel and are applied in
/// order; snapshots and results go out on the notice channel. Finalized results
/// are handed to the history gateway on a separate task so typing never waits
/// on the network.
pub struct PracticeLoop {
    controller: PracticeController,
    events: UnboundedReceiver<PracticeEvent>,
    notices: UnboundedSender<PracticeNotice>,
    history: Option<HistorySink>,
}

impl PracticeLoop {
    #[must_use]
    pub fn new(
        settings: PracticeSettings,
        clock: Clock,
        beeper: Arc<dyn Beeper>,
    ) -> (Self, PracticeHandle, UnboundedReceiver<PracticeNotice>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        let controller =
            PracticeController::new(settings, clock, beeper).with_ticks(events_tx.downgrade());
        let practice = Self {
            controller,
            events: events_rx,
            notices: notices_tx,
            history: None,
        };
        (practice, PracticeHandle { events: events_tx }, notices_rx)
    }

    /// Persist finalized results for `student_id` through `gateway`.
    #[must_use]
    pub fn with_history(mut self, gateway: Arc<dyn HistoryGateway>, student_id: StudentId) -> Self {
        self.history = Some(HistorySink {
            gateway,
            student_id,
        });
        self
    }

    #[must_use]
    pub fn controller(&self) -> &PracticeController {
        &self.controller
    }

    /// Run until a `Shutdown` event arrives or every handle is dropped.
    pub async fn run(mut self) {
        info!(epoch = self.controller.epoch(), "practice loop started");
        self.publish_snapshot();
        while let Some(event) = self.events.recv().await {
            if self.handle(event).is_break() {
                break;
            }
        }
        info!("practice loop stopped");
    }

    /// Apply one event.
    pub fn handle(&mut self, event: PracticeEvent) -> ControlFlow<()> {
        match event {
            PracticeEvent::Input(value) => {
                let result = self.controller.set_input(&value);
                self.publish_snapshot();
                if let Some(result) = result {
                    self.finish(result);
                }
            }
            PracticeEvent::Tick { epoch } => match self.controller.on_tick(epoch) {
                TickReport::Stale => {}
                TickReport::Applied => self.publish_snapshot(),
                TickReport::Finished(result) => {
                    self.publish_snapshot();
                    self.finish(result);
                }
            },
            PracticeEvent::Restart => {
                self.controller.restart();
                self.publish_snapshot();
            }
            PracticeEvent::SelectLesson { category, index } => {
                self.controller.select_lesson(&category, index);
                self.publish_snapshot();
            }
            PracticeEvent::NextLesson => {
                self.controller.next_lesson();
                self.publish_snapshot();
            }
            PracticeEvent::PreviousLesson => {
                self.controller.previous_lesson();
                self.publish_snapshot();
            }
            PracticeEvent::ShuffleLesson => {
                self.controller.shuffle_lesson(&mut rand::rng());
                self.publish_snapshot();
            }
            PracticeEvent::SetMode(mode) => {
                self.controller.set_mode(mode);
                self.publish_snapshot();
            }
            PracticeEvent::SetSound(enabled) => {
                self.controller.set_sound_enabled(enabled);
                self.publish_snapshot();
            }
            PracticeEvent::Resubmit(result) => self.submit(result),
            PracticeEvent::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn publish_snapshot(&self) {
        let _ = self
            .notices
            .send(PracticeNotice::Updated(self.controller.snapshot()));
    }

    fn finish(&self, result: SessionResult) {
        let _ = self.notices.send(PracticeNotice::Finished(result.clone()));
        self.submit(result);
    }

    fn submit(&self, result: SessionResult) {
        let Some(sink) = &self.history else {
            debug!("no history backend configured; result not persisted");
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!("no async runtime available; result not persisted");
            let _ = self.notices.send(PracticeNotice::SubmissionFailed {
                result,
                error: "no async runtime available".into(),
            });
            return;
        };

        let gateway = Arc::clone(&sink.gateway);
        let student_id = sink.student_id.clone();
        let notices = self.notices.clone();
        runtime.spawn(async move {
            let notice = match gateway.submit(&student_id, &result).await {
                Ok(ack) => {
                    info!(id = ?ack.id, student = %student_id, "typing result saved");
                    PracticeNotice::Submitted { result, ack }
                }
                Err(err) => {
                    warn!(error = %err, student = %student_id, "failed to save typing result");
                    PracticeNotice::SubmissionFailed {
                        result,
                        error: err.to_string(),
                    }
                }
            };
            let _ = notices.send(notice);
        });
    }
}
