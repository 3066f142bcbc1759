//! Business logic services.

pub mod status_bridge;

pub use status_bridge::{map_task_status, StatusBridge, StatusUpdate};
