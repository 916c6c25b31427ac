use std::sync::Arc;

use learn_core::model::{PracticeSettings, StudentId};
use storage::repository::Storage;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use crate::Clock;
use crate::beeper::Beeper;
use crate::error::AppServicesError;
use crate::history::{HistoryGateway, HistoryService, HttpHistoryGateway, StoredHistoryGateway};
use crate::practice::{PracticeHandle, PracticeLoop, PracticeNotice};

/// Assembles app-facing services around one history backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    history: Arc<dyn HistoryGateway>,
    history_service: Arc<HistoryService>,
}

impl AppServices {
    /// Build services that keep history in `SQLite`, unless a remote backend is
    /// configured through `LEARN_API_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the backend settings are invalid or
    /// storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        if let Some(remote) = HttpHistoryGateway::from_env()? {
            info!(base_url = remote.settings().base_url(), "using remote typing history");
            return Ok(Self::from_gateway(clock, Arc::new(remote)));
        }

        let storage = Storage::sqlite(db_url).await?;
        info!(db_url, "using local typing history");
        Ok(Self::from_storage(clock, &storage))
    }

    /// Build services over an in-memory repository.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(clock, &Storage::in_memory())
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        let gateway = StoredHistoryGateway::new(Arc::clone(&storage.results));
        Self::from_gateway(clock, Arc::new(gateway))
    }

    #[must_use]
    pub fn from_gateway(clock: Clock, history: Arc<dyn HistoryGateway>) -> Self {
        let history_service = Arc::new(HistoryService::new(Arc::clone(&history)));
        Self {
            clock,
            history,
            history_service,
        }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock.clone()
    }

    #[must_use]
    pub fn history_gateway(&self) -> Arc<dyn HistoryGateway> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn history_service(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history_service)
    }

    /// Build a practice loop. Results are persisted only when a student is known.
    #[must_use]
    pub fn practice_loop(
        &self,
        settings: PracticeSettings,
        beeper: Arc<dyn Beeper>,
        student_id: Option<StudentId>,
    ) -> (PracticeLoop, PracticeHandle, UnboundedReceiver<PracticeNotice>) {
        let (practice, handle, notices) = PracticeLoop::new(settings, self.clock(), beeper);
        let practice = match student_id {
            Some(student_id) => practice.with_history(self.history_gateway(), student_id),
            None => practice,
        };
        (practice, handle, notices)
    }
}
