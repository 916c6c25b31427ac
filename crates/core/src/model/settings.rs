use thiserror::Error;
use url::Url;

use crate::model::lesson::resolve_category;
use crate::model::session::SessionMode;

/// Longest countdown a practice session may be configured with.
pub const MAX_DURATION_SECS: u32 = 600;

/// Countdown used when none is configured.
pub const DEFAULT_DURATION_SECS: u32 = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PracticeSettingsError {
    #[error("duration must be between 1 and {MAX_DURATION_SECS} seconds, got {0}")]
    InvalidDuration(u32),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendSettingsError {
    #[error("invalid base URL")]
    InvalidBaseUrl,
}

//
// ─── PRACTICE ──────────────────────────────────────────────────────────────────
//

/// Validated knobs for a practice page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PracticeSettings {
    category: &'static str,
    lesson_index: usize,
    mode: SessionMode,
    sound_enabled: bool,
    cap_overtype: bool,
    resync_timer: bool,
}

#[derive(Clone, Debug)]
pub struct PracticeSettingsDraft {
    pub category: Option<String>,
    pub lesson_index: usize,
    /// `None` selects unbounded (completion-only) sessions.
    pub duration_secs: Option<u32>,
    pub sound_enabled: bool,
    pub cap_overtype: bool,
    pub resync_timer: bool,
}

impl Default for PracticeSettingsDraft {
    fn default() -> Self {
        Self {
            category: None,
            lesson_index: 0,
            duration_secs: Some(DEFAULT_DURATION_SECS),
            sound_enabled: true,
            cap_overtype: false,
            resync_timer: false,
        }
    }
}

impl PracticeSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft.
    ///
    /// Unknown categories are not an error; they resolve to the default one.
    ///
    /// # Errors
    ///
    /// Returns `PracticeSettingsError::InvalidDuration` for a zero or oversized countdown.
    pub fn validate(self) -> Result<PracticeSettings, PracticeSettingsError> {
        let mode = match self.duration_secs {
            Some(secs) if secs == 0 || secs > MAX_DURATION_SECS => {
                return Err(PracticeSettingsError::InvalidDuration(secs));
            }
            Some(secs) => SessionMode::time_boxed(secs),
            None => SessionMode::Unbounded,
        };
        let category = resolve_category(self.category.as_deref().unwrap_or_default());

        Ok(PracticeSettings {
            category,
            lesson_index: self.lesson_index,
            mode,
            sound_enabled: self.sound_enabled,
            cap_overtype: self.cap_overtype,
            resync_timer: self.resync_timer,
        })
    }
}

impl PracticeSettings {
    #[must_use]
    pub fn category(&self) -> &'static str {
        self.category
    }

    #[must_use]
    pub fn lesson_index(&self) -> usize {
        self.lesson_index
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    #[must_use]
    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    #[must_use]
    pub fn cap_overtype(&self) -> bool {
        self.cap_overtype
    }

    #[must_use]
    pub fn resync_timer(&self) -> bool {
        self.resync_timer
    }
}

impl Default for PracticeSettings {
    fn default() -> Self {
        Self {
            category: resolve_category(""),
            lesson_index: 0,
            mode: SessionMode::time_boxed(DEFAULT_DURATION_SECS),
            sound_enabled: true,
            cap_overtype: false,
            resync_timer: false,
        }
    }
}

//
// ─── BACKEND ───────────────────────────────────────────────────────────────────
//

/// Where typing results are sent and read back from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendSettings {
    base_url: String,
    api_token: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct BackendSettingsDraft {
    pub base_url: String,
    pub api_token: Option<String>,
}

impl BackendSettingsDraft {
    /// Validate and normalize the draft.
    ///
    /// # Errors
    ///
    /// Returns `BackendSettingsError` if the base URL is blank or not an http(s) URL.
    pub fn validate(self) -> Result<BackendSettings, BackendSettingsError> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url).map_err(|_| BackendSettingsError::InvalidBaseUrl)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BackendSettingsError::InvalidBaseUrl);
        }

        Ok(BackendSettings {
            base_url,
            api_token: normalize_optional(self.api_token),
        })
    }
}

impl BackendSettings {
    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
