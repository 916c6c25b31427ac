use std::sync::Arc;

use async_trait::async_trait;
use learn_core::model::{SessionResult, StudentId};
use storage::repository::TypingResultRepository;
use tracing::debug;

use crate::error::HistoryError;
use crate::history::{HistoryEntry, HistoryGateway, SubmissionAck};

/// How many results a local history read returns.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// History kept in a local repository (`SQLite` or in-memory).
#[derive(Clone)]
pub struct StoredHistoryGateway {
    results: Arc<dyn TypingResultRepository>,
    limit: u32,
}

impl StoredHistoryGateway {
    #[must_use]
    pub fn new(results: Arc<dyn TypingResultRepository>) -> Self {
        Self {
            results,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

#[async_trait]
impl HistoryGateway for StoredHistoryGateway {
    async fn submit(
        &self,
        student_id: &StudentId,
        result: &SessionResult,
    ) -> Result<SubmissionAck, HistoryError> {
        let id = self.results.append_result(student_id, result).await?;
        debug!(id, student = %student_id, "typing result stored locally");
        Ok(SubmissionAck {
            id: Some(id.to_string()),
        })
    }

    async fn fetch(&self, student_id: &StudentId) -> Result<Vec<HistoryEntry>, HistoryError> {
        let rows = self.results.list_results(student_id, self.limit).await?;
        Ok(rows
            .iter()
            .map(|row| HistoryEntry::from_result(Some(row.id.to_string()), &row.result))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use learn_core::model::{LessonId, SessionMode};
    use learn_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn result(wpm: u32, minutes_ago: i64) -> SessionResult {
        SessionResult::from_persisted(
            LessonId::new(104),
            "Short Words",
            SessionMode::Unbounded,
            wpm,
            90,
            3,
            25,
            fixed_now() - Duration::minutes(minutes_ago),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn submit_then_fetch_newest_first() {
        let gateway = StoredHistoryGateway::new(Arc::new(InMemoryRepository::new()));
        let student = StudentId::new("ana").unwrap();

        let ack = gateway.submit(&student, &result(30, 10)).await.unwrap();
        assert_eq!(ack.id.as_deref(), Some("1"));
        gateway.submit(&student, &result(45, 1)).await.unwrap();

        let entries = gateway.fetch(&student).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].wpm, 45);
        assert_eq!(entries[0].mode, "words");
        assert_eq!(entries[1].id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn fetch_respects_limit() {
        let gateway =
            StoredHistoryGateway::new(Arc::new(InMemoryRepository::new())).with_limit(1);
        let student = StudentId::new("ana").unwrap();
        gateway.submit(&student, &result(30, 10)).await.unwrap();
        gateway.submit(&student, &result(45, 1)).await.unwrap();
        assert_eq!(gateway.fetch(&student).await.unwrap().len(), 1);
    }
}
