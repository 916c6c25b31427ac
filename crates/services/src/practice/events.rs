use learn_core::model::{SessionMode, SessionResult};

use crate::history::SubmissionAck;
use crate::practice::PracticeSnapshot;

/// Inputs accepted by the practice loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PracticeEvent {
    /// The full current value of the input box.
    Input(String),
    /// One countdown tick for the session started under `epoch`.
    Tick { epoch: u64 },
    Restart,
    SelectLesson { category: String, index: usize },
    NextLesson,
    PreviousLesson,
    ShuffleLesson,
    SetMode(SessionMode),
    SetSound(bool),
    /// Retry persisting a result whose submission failed.
    Resubmit(SessionResult),
    Shutdown,
}

/// Outputs published by the practice loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PracticeNotice {
    Updated(PracticeSnapshot),
    Finished(SessionResult),
    Submitted {
        result: SessionResult,
        ack: SubmissionAck,
    },
    SubmissionFailed {
        result: SessionResult,
        error: String,
    },
}
