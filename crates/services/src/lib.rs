#![forbid(unsafe_code)]

pub mod app_services;
pub mod beeper;
pub mod error;
pub mod history;
pub mod practice;

pub use learn_core::Clock;

pub use app_services::AppServices;
pub use beeper::{Beeper, NoopBeeper, RecordingBeeper, Tone};
pub use error::{AppServicesError, HistoryError};
pub use history::{
    HistoryEntry, HistoryGateway, HistoryPage, HistoryService, HttpHistoryGateway,
    StoredHistoryGateway, SubmissionAck,
};
pub use practice::{
    PracticeController, PracticeEvent, PracticeHandle, PracticeLoop, PracticeNotice,
    PracticeSnapshot, TickReport,
};
