//! Scheduler types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pending notification for one episode.
///
/// The schedule key is the episode id rendered as a string; at most one
/// pending entry exists per key. `fire_at` is both the target instant and
/// the payload handed to the handler for its lateness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledNotification {
    /// Schedule key: the episode id as a string.
    pub key: String,
    /// The episode this notification is for.
    pub episode_id: i64,
    /// When the notification should fire (the episode's air instant).
    pub fire_at: DateTime<Utc>,
    /// When this entry was created or last replaced.
    pub scheduled_at: DateTime<Utc>,
}

impl ScheduledNotification {
    /// Create a new pending notification for an episode.
    pub fn new(episode_id: i64, fire_at: DateTime<Utc>) -> Self {
        Self {
            key: episode_id.to_string(),
            episode_id,
            fire_at,
            scheduled_at: Utc::now(),
        }
    }

    /// Check if this notification is due to fire.
    pub fn is_due(&self) -> bool {
        self.fire_at <= Utc::now()
    }
}
