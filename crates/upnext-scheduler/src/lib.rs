//! Durable notification scheduler for Upnext.
//!
//! This crate provides a persistent schedule of pending episode
//! notifications that:
//! - Keeps at most one pending entry per episode id (upsert replaces)
//! - Survives crashes and restarts via a JSON state file
//! - Fires a registered handler at or after each entry's target instant
//! - Fires entries whose target passed while the process was down,
//!   leaving lateness handling to the handler

mod error;
mod scheduler;
mod types;

pub use error::SchedulerError;
pub use scheduler::{NotificationHandler, Scheduler};
pub use types::ScheduledNotification;
