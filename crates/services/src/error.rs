//! Shared error types for the services crate.

use thiserror::Error;

use learn_core::model::{BackendSettingsError, SessionResultError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by history gateways.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    #[error("history backend is not configured")]
    Disabled,
    #[error("history backend URL is invalid")]
    InvalidUrl,
    #[error("history request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Result(#[from] SessionResultError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Backend(#[from] BackendSettingsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_errors_read_as_sentences() {
        assert_eq!(
            HistoryError::InvalidUrl.to_string(),
            "history backend URL is invalid"
        );
        assert_eq!(
            HistoryError::HttpStatus(reqwest::StatusCode::BAD_GATEWAY).to_string(),
            "history request failed with status 502 Bad Gateway"
        );
    }
}
