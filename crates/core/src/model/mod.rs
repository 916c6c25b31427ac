mod ids;
pub mod lesson;
mod result;
mod session;
pub mod settings;

pub use ids::{LessonId, ParseIdError, StudentId};
pub use lesson::{LessonCursor, LessonText, select_lesson};
pub use result::{HistorySummary, SessionResult, SessionResultError};
pub use session::{InputOutcome, SessionMode, SessionState, TickOutcome, TypingSession};
pub use settings::{
    BackendSettings, BackendSettingsDraft, BackendSettingsError, PracticeSettings,
    PracticeSettingsDraft, PracticeSettingsError,
};
