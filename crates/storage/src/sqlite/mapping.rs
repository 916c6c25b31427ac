use learn_core::model::{LessonId, SessionMode, SessionResult, StudentId};
use sqlx::Row;

use crate::repository::{ResultRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

/// Splits a mode into its `mode` and `mode_duration_secs` columns.
pub(crate) fn mode_to_columns(mode: SessionMode) -> (&'static str, Option<i64>) {
    (mode.label(), mode.duration_secs().map(i64::from))
}

pub(crate) fn mode_from_columns(
    label: &str,
    duration_secs: Option<i64>,
) -> Result<SessionMode, StorageError> {
    match (label, duration_secs) {
        ("time", Some(secs)) => Ok(SessionMode::time_boxed(u32_from_i64(
            "mode_duration_secs",
            secs,
        )?)),
        ("time", None) => Err(StorageError::Serialization(
            "time mode without duration".into(),
        )),
        ("words", _) => Ok(SessionMode::Unbounded),
        _ => Err(StorageError::Serialization(format!("invalid mode: {label}"))),
    }
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<ResultRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let student_id =
        StudentId::new(row.try_get::<String, _>("student_id").map_err(ser)?).map_err(ser)?;
    let lesson_id = LessonId::new(u32_from_i64(
        "lesson_id",
        row.try_get::<i64, _>("lesson_id").map_err(ser)?,
    )?);
    let mode = mode_from_columns(
        &row.try_get::<String, _>("mode").map_err(ser)?,
        row.try_get::<Option<i64>, _>("mode_duration_secs")
            .map_err(ser)?,
    )?;

    let result = SessionResult::from_persisted(
        lesson_id,
        row.try_get::<String, _>("lesson_title").map_err(ser)?,
        mode,
        u32_from_i64("wpm", row.try_get::<i64, _>("wpm").map_err(ser)?)?,
        u32_from_i64("accuracy", row.try_get::<i64, _>("accuracy").map_err(ser)?)?,
        u32_from_i64(
            "error_count",
            row.try_get::<i64, _>("error_count").map_err(ser)?,
        )?,
        u32_from_i64(
            "duration_secs",
            row.try_get::<i64, _>("duration_secs").map_err(ser)?,
        )?,
        row.try_get("completed_at").map_err(ser)?,
    )
    .map_err(ser)?;

    Ok(ResultRow::new(id, student_id, result))
}
