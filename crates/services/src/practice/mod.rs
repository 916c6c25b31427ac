//! Practice page orchestration: a synchronous controller plus the async loop
//! that feeds it keystrokes and timer ticks.

mod controller;
mod events;
mod snapshot;
mod ticker;
mod workflow;

pub use controller::{PracticeController, TickReport};
pub use events::{PracticeEvent, PracticeNotice};
pub use snapshot::PracticeSnapshot;
pub use ticker::{TICK_PERIOD, Ticker};
pub use workflow::{PracticeHandle, PracticeLoop};
