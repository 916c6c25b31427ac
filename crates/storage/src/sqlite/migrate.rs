use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::SqliteInitError;

/// Runs the versioned migrations for the typing results schema.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: typing results.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS typing_results (
                    id INTEGER PRIMARY KEY,
                    student_id TEXT NOT NULL,
                    lesson_id INTEGER NOT NULL CHECK (lesson_id >= 0),
                    lesson_title TEXT NOT NULL,
                    mode TEXT NOT NULL CHECK (mode IN ('time', 'words')),
                    mode_duration_secs INTEGER CHECK (mode_duration_secs > 0),
                    wpm INTEGER NOT NULL CHECK (wpm >= 0),
                    accuracy INTEGER NOT NULL CHECK (accuracy BETWEEN 0 AND 100),
                    error_count INTEGER NOT NULL CHECK (error_count >= 0),
                    duration_secs INTEGER NOT NULL CHECK (duration_secs >= 0),
                    completed_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_typing_results_student_completed
                    ON typing_results (student_id, completed_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(version = 1, "applied typing results migration");
    }

    Ok(())
}
