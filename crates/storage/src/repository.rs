use async_trait::async_trait;
use learn_core::model::{SessionResult, StudentId};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A stored typing result together with its row id and owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub id: i64,
    pub student_id: StudentId,
    pub result: SessionResult,
}

impl ResultRow {
    #[must_use]
    pub fn new(id: i64, student_id: StudentId, result: SessionResult) -> Self {
        Self {
            id,
            student_id,
            result,
        }
    }
}

/// Repository contract for finalized typing results.
#[async_trait]
pub trait TypingResultRepository: Send + Sync {
    /// Append a result for a student and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(
        &self,
        student_id: &StudentId,
        result: &SessionResult,
    ) -> Result<i64, StorageError>;

    /// Fetch a single result by row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: i64) -> Result<ResultRow, StorageError>;

    /// List a student's results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if rows cannot be read or decoded.
    async fn list_results(
        &self,
        student_id: &StudentId,
        limit: u32,
    ) -> Result<Vec<ResultRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    rows: Arc<Mutex<Vec<ResultRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TypingResultRepository for InMemoryRepository {
    async fn append_result(
        &self,
        student_id: &StudentId,
        result: &SessionResult,
    ) -> Result<i64, StorageError> {
        let mut guard = self
            .rows
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("row id overflow".into()))?
            + 1;
        guard.push(ResultRow::new(id, student_id.clone(), result.clone()));
        Ok(id)
    }

    async fn get_result(&self, id: i64) -> Result<ResultRow, StorageError> {
        let guard = self
            .rows
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|row| row.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_results(
        &self,
        student_id: &StudentId,
        limit: u32,
    ) -> Result<Vec<ResultRow>, StorageError> {
        let guard = self
            .rows
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<ResultRow> = guard
            .iter()
            .filter(|row| &row.student_id == student_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.result
                .completed_at()
                .cmp(&a.result.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Result repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub results: Arc<dyn TypingResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let results: Arc<dyn TypingResultRepository> = Arc::new(InMemoryRepository::new());
        Self { results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use learn_core::model::{LessonId, SessionMode};
    use learn_core::time::fixed_now;

    fn build_result(wpm: u32, minutes_ago: i64) -> SessionResult {
        SessionResult::from_persisted(
            LessonId::new(101),
            "Home Row",
            SessionMode::time_boxed(30),
            wpm,
            95,
            1,
            30,
            fixed_now() - Duration::minutes(minutes_ago),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn lists_newest_first_per_student() {
        let repo = InMemoryRepository::new();
        let ana = StudentId::new("ana").unwrap();
        let ben = StudentId::new("ben").unwrap();

        repo.append_result(&ana, &build_result(30, 20)).await.unwrap();
        repo.append_result(&ben, &build_result(70, 10)).await.unwrap();
        repo.append_result(&ana, &build_result(45, 5)).await.unwrap();

        let rows = repo.list_results(&ana, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].result.wpm(), 45);
        assert_eq!(rows[1].result.wpm(), 30);
    }

    #[tokio::test]
    async fn limit_truncates() {
        let repo = InMemoryRepository::new();
        let ana = StudentId::new("ana").unwrap();
        for i in 0..5 {
            repo.append_result(&ana, &build_result(20 + i, i64::from(i)))
                .await
                .unwrap();
        }
        assert_eq!(repo.list_results(&ana, 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_row_is_not_found() {
        let repo = InMemoryRepository::new();
        assert!(matches!(
            repo.get_result(7).await,
            Err(StorageError::NotFound)
        ));
    }
}
