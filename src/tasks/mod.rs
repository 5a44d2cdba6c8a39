//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - TTL Cleanup: Purges expired fallback entries at configured intervals
//! - Health Probe: Re-checks Redis so routing returns to it after an outage

mod cleanup;
mod probe;

pub use cleanup::spawn_cleanup_task;
pub use probe::spawn_health_probe;
