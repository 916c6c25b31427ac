//! Typing history: where finalized results go and how they are read back.

mod http;
mod service;
mod stored;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use learn_core::model::{SessionResult, StudentId};
use serde::{Deserialize, Serialize};

use crate::error::HistoryError;

pub use http::{HttpHistoryGateway, backend_settings_from_env};
pub use service::{HistoryPage, HistoryService};
pub use stored::StoredHistoryGateway;

/// Acknowledgement of a stored result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionAck {
    /// Backend identifier of the new record, when the backend reports one.
    pub id: Option<String>,
}

/// One past result as reported by a history backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub lesson: String,
    /// `"time"` or `"words"`.
    pub mode: String,
    pub wpm: u32,
    pub accuracy: u32,
    #[serde(default)]
    pub errors: u32,
    /// Seconds spent typing.
    #[serde(default)]
    pub time: u32,
    #[serde(default, alias = "createdAt")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl HistoryEntry {
    #[must_use]
    pub fn from_result(id: Option<String>, result: &SessionResult) -> Self {
        Self {
            id,
            lesson: result.lesson_title().to_string(),
            mode: result.mode().label().to_string(),
            wpm: result.wpm(),
            accuracy: result.accuracy(),
            errors: result.error_count(),
            time: result.duration_secs(),
            completed_at: Some(result.completed_at()),
        }
    }
}

/// Persistence capability for finalized results.
#[async_trait]
pub trait HistoryGateway: Send + Sync {
    /// Store one result for a student.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` when the backend rejects or cannot store the result.
    async fn submit(
        &self,
        student_id: &StudentId,
        result: &SessionResult,
    ) -> Result<SubmissionAck, HistoryError>;

    /// Read a student's past results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` when the backend cannot be read.
    async fn fetch(&self, student_id: &StudentId) -> Result<Vec<HistoryEntry>, HistoryError>;
}
