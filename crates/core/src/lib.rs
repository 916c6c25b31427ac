#![forbid(unsafe_code)]

pub mod metrics;
pub mod model;
pub mod time;

pub use metrics::{CharClass, LiveMetrics, classify_chars, compute_live_metrics};
pub use time::Clock;
