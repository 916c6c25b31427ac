use std::sync::Arc;

use learn_core::model::{HistorySummary, StudentId};

use crate::error::HistoryError;
use crate::history::{HistoryEntry, HistoryGateway};

/// A student's history with its aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    pub summary: HistorySummary,
}

/// Read-side service for the history screen.
#[derive(Clone)]
pub struct HistoryService {
    gateway: Arc<dyn HistoryGateway>,
}

impl HistoryService {
    #[must_use]
    pub fn new(gateway: Arc<dyn HistoryGateway>) -> Self {
        Self { gateway }
    }

    /// Load a student's history and summarize it.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the gateway cannot be read.
    pub async fn load(&self, student_id: &StudentId) -> Result<HistoryPage, HistoryError> {
        let entries = self.gateway.fetch(student_id).await?;
        let summary = HistorySummary::from_scores(
            entries
                .iter()
                .map(|entry| (entry.wpm, entry.accuracy.min(100))),
        );
        Ok(HistoryPage { entries, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::StoredHistoryGateway;
    use learn_core::model::{LessonId, SessionMode, SessionResult};
    use learn_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn load_summarizes_entries() {
        let gateway = Arc::new(StoredHistoryGateway::new(Arc::new(InMemoryRepository::new())));
        let student = StudentId::new("ana").unwrap();
        for (wpm, accuracy) in [(40, 90), (52, 96)] {
            let result = SessionResult::from_persisted(
                LessonId::new(101),
                "Home Row",
                SessionMode::time_boxed(30),
                wpm,
                accuracy,
                1,
                30,
                fixed_now(),
            )
            .unwrap();
            gateway.submit(&student, &result).await.unwrap();
        }

        let page = HistoryService::new(gateway).load(&student).await.unwrap();
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.summary.sessions, 2);
        assert_eq!(page.summary.best_wpm, 52);
        assert_eq!(page.summary.average_wpm, 46);
        assert_eq!(page.summary.average_accuracy, 93);
    }

    #[tokio::test]
    async fn empty_history_has_zeroed_summary() {
        let gateway = Arc::new(StoredHistoryGateway::new(Arc::new(InMemoryRepository::new())));
        let page = HistoryService::new(gateway)
            .load(&StudentId::new("nobody").unwrap())
            .await
            .unwrap();
        assert!(page.entries.is_empty());
        assert_eq!(page.summary, HistorySummary::default());
    }
}
