use learn_core::model::{SessionResult, StudentId};

use super::SqliteRepository;
use super::mapping::{map_result_row, mode_to_columns};
use crate::repository::{ResultRow, StorageError, TypingResultRepository};

#[async_trait::async_trait]
impl TypingResultRepository for SqliteRepository {
    async fn append_result(
        &self,
        student_id: &StudentId,
        result: &SessionResult,
    ) -> Result<i64, StorageError> {
        let (mode, mode_duration_secs) = mode_to_columns(result.mode());

        let res = sqlx::query(
            r"
                INSERT INTO typing_results (
                    student_id, lesson_id, lesson_title, mode, mode_duration_secs,
                    wpm, accuracy, error_count, duration_secs, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(student_id.as_str())
        .bind(i64::from(result.lesson_id().value()))
        .bind(result.lesson_title())
        .bind(mode)
        .bind(mode_duration_secs)
        .bind(i64::from(result.wpm()))
        .bind(i64::from(result.accuracy()))
        .bind(i64::from(result.error_count()))
        .bind(i64::from(result.duration_secs()))
        .bind(result.completed_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn get_result(&self, id: i64) -> Result<ResultRow, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    id, student_id, lesson_id, lesson_title, mode, mode_duration_secs,
                    wpm, accuracy, error_count, duration_secs, completed_at
                FROM typing_results
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_result_row(&row)
    }

    async fn list_results(
        &self,
        student_id: &StudentId,
        limit: u32,
    ) -> Result<Vec<ResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, student_id, lesson_id, lesson_title, mode, mode_duration_secs,
                    wpm, accuracy, error_count, duration_secs, completed_at
                FROM typing_results
                WHERE student_id = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(student_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_result_row(&row)?);
        }
        Ok(out)
    }
}
