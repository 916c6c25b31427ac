use std::env;

use async_trait::async_trait;
use learn_core::model::{
    BackendSettings, BackendSettingsDraft, BackendSettingsError, SessionResult, StudentId,
};
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::HistoryError;
use crate::history::{HistoryEntry, HistoryGateway, SubmissionAck};

const HISTORY_PATH: &str = "api/typing-history";

/// Read backend settings from `LEARN_API_BASE_URL` and `LEARN_API_TOKEN`.
///
/// Returns `Ok(None)` when no base URL is set.
///
/// # Errors
///
/// Returns `BackendSettingsError` if the base URL is set but invalid.
pub fn backend_settings_from_env() -> Result<Option<BackendSettings>, BackendSettingsError> {
    let Ok(base_url) = env::var("LEARN_API_BASE_URL") else {
        return Ok(None);
    };
    if base_url.trim().is_empty() {
        return Ok(None);
    }
    BackendSettingsDraft {
        base_url,
        api_token: env::var("LEARN_API_TOKEN").ok(),
    }
    .validate()
    .map(Some)
}

/// History stored by the learning platform's REST backend.
#[derive(Clone)]
pub struct HttpHistoryGateway {
    client: Client,
    settings: BackendSettings,
}

impl HttpHistoryGateway {
    /// Build a gateway from the environment, if a backend is configured.
    ///
    /// # Errors
    ///
    /// Returns `BackendSettingsError` if the configured base URL is invalid.
    pub fn from_env() -> Result<Option<Self>, BackendSettingsError> {
        Ok(backend_settings_from_env()?.map(Self::new))
    }

    #[must_use]
    pub fn new(settings: BackendSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    fn submit_url(&self) -> Result<Url, HistoryError> {
        Url::parse(&format!("{}/{HISTORY_PATH}", self.settings.base_url()))
            .map_err(|_| HistoryError::InvalidUrl)
    }

    fn history_url(&self, student_id: &StudentId) -> Result<Url, HistoryError> {
        let mut url = self.submit_url()?;
        url.path_segments_mut()
            .map_err(|()| HistoryError::InvalidUrl)?
            .push(student_id.as_str());
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.settings.api_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl HistoryGateway for HttpHistoryGateway {
    async fn submit(
        &self,
        student_id: &StudentId,
        result: &SessionResult,
    ) -> Result<SubmissionAck, HistoryError> {
        let payload = SubmitPayload::new(student_id, result);
        let response = self
            .authorize(self.client.post(self.submit_url()?))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HistoryError::HttpStatus(response.status()));
        }

        // Not every backend echoes the record; a body we cannot read is still a success.
        let id = response.json::<Value>().await.ok().as_ref().and_then(record_id);
        debug!(id = ?id, student = %student_id, "typing result submitted");
        Ok(SubmissionAck { id })
    }

    async fn fetch(&self, student_id: &StudentId) -> Result<Vec<HistoryEntry>, HistoryError> {
        let response = self
            .authorize(self.client.get(self.history_url(student_id)?))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HistoryError::HttpStatus(response.status()));
        }

        Ok(response.json::<Vec<HistoryEntry>>().await?)
    }
}

/// Body of `POST /api/typing-history`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitPayload<'a> {
    student_id: &'a str,
    wpm: u32,
    accuracy: u32,
    errors: u32,
    mode: &'static str,
    lesson: &'a str,
    time: u32,
}

impl<'a> SubmitPayload<'a> {
    fn new(student_id: &'a StudentId, result: &'a SessionResult) -> Self {
        Self {
            student_id: student_id.as_str(),
            wpm: result.wpm(),
            accuracy: result.accuracy(),
            errors: result.error_count(),
            mode: result.mode().label(),
            lesson: result.lesson_title(),
            time: result.duration_secs(),
        }
    }
}

fn record_id(body: &Value) -> Option<String> {
    let record = body.get("data").unwrap_or(body);
    match record.get("_id").or_else(|| record.get("id"))? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::model::{LessonId, SessionMode};
    use learn_core::time::fixed_now;
    use serde_json::json;

    fn gateway(token: Option<&str>) -> HttpHistoryGateway {
        HttpHistoryGateway::new(
            BackendSettingsDraft {
                base_url: "https://lms.example.com/".into(),
                api_token: token.map(str::to_string),
            }
            .validate()
            .unwrap(),
        )
    }

    #[test]
    fn payload_uses_backend_field_names() {
        let student = StudentId::new("stu-1").unwrap();
        let result = SessionResult::from_persisted(
            LessonId::new(301),
            "Numbers",
            SessionMode::time_boxed(30),
            37,
            91,
            4,
            30,
            fixed_now(),
        )
        .unwrap();

        let body = serde_json::to_value(SubmitPayload::new(&student, &result)).unwrap();
        assert_eq!(
            body,
            json!({
                "studentId": "stu-1",
                "wpm": 37,
                "accuracy": 91,
                "errors": 4,
                "mode": "time",
                "lesson": "Numbers",
                "time": 30
            })
        );
    }

    #[test]
    fn urls_are_built_under_the_base() {
        let gateway = gateway(None);
        assert_eq!(
            gateway.submit_url().unwrap().as_str(),
            "https://lms.example.com/api/typing-history"
        );
        let student = StudentId::new("a b/c").unwrap();
        assert_eq!(
            gateway.history_url(&student).unwrap().as_str(),
            "https://lms.example.com/api/typing-history/a%20b%2Fc"
        );
    }

    #[test]
    fn bearer_token_is_attached_when_configured() {
        let gateway = gateway(Some("secret"));
        let request = gateway
            .authorize(gateway.client.get("https://lms.example.com"))
            .build()
            .unwrap();
        assert_eq!(
            request.headers()["authorization"].to_str().unwrap(),
            "Bearer secret"
        );

        let anonymous = self::gateway(None);
        let request = anonymous
            .authorize(anonymous.client.get("https://lms.example.com"))
            .build()
            .unwrap();
        assert!(request.headers().get("authorization").is_none());
    }

    #[test]
    fn record_id_reads_common_shapes() {
        assert_eq!(record_id(&json!({ "_id": "abc" })), Some("abc".into()));
        assert_eq!(record_id(&json!({ "data": { "id": 12 } })), Some("12".into()));
        assert_eq!(record_id(&json!({ "ok": true })), None);
    }
}
