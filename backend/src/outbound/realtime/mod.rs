//! In-process real-time fan-out.

mod alert_hub;

pub use alert_hub::{AlertHub, DEFAULT_HUB_CAPACITY};
