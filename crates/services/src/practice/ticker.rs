use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::WeakUnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::practice::PracticeEvent;

/// Interval between countdown ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A running one-second timer bound to a single session epoch.
///
/// Dropping the ticker aborts its task, so at most one timer exists per
/// controller at any time.
#[derive(Debug)]
pub struct Ticker {
    task: JoinHandle<()>,
}

impl Ticker {
    /// Spawn a ticker on the current tokio runtime.
    ///
    /// Returns `None` when called outside a runtime. The task stops on its own
    /// once every strong sender of the event channel is gone.
    #[must_use]
    pub fn spawn(epoch: u64, events: WeakUnboundedSender<PracticeEvent>) -> Option<Self> {
        let runtime = Handle::try_current().ok()?;
        let task = runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            loop {
                interval.tick().await;
                let Some(events) = events.upgrade() else {
                    break;
                };
                if events.send(PracticeEvent::Tick { epoch }).is_err() {
                    break;
                }
            }
        });
        Some(Self { task })
    }

    /// Stop the timer. Ticks already queued are left for the receiver to discard.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn ticks_every_second_until_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let started = Instant::now();
        let ticker = Ticker::spawn(3, tx.downgrade()).unwrap();

        assert_eq!(rx.recv().await, Some(PracticeEvent::Tick { epoch: 3 }));
        assert!(started.elapsed() >= TICK_PERIOD);
        assert_eq!(rx.recv().await, Some(PracticeEvent::Tick { epoch: 3 }));
        assert!(started.elapsed() >= TICK_PERIOD * 2);

        ticker.cancel();
        time::sleep(TICK_PERIOD * 5).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_channel_owner_is_gone() {
        let (tx, rx) = mpsc::unbounded_channel::<PracticeEvent>();
        let ticker = Ticker::spawn(1, tx.downgrade()).unwrap();
        drop(tx);
        drop(rx);
        time::sleep(TICK_PERIOD * 2).await;
        assert!(ticker.task.is_finished());
    }

    #[test]
    fn needs_a_runtime() {
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(Ticker::spawn(0, tx.downgrade()).is_none());
    }
}
