//! Notification scheduler implementation.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, watch};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{ScheduledNotification, SchedulerError};

/// Minimum sleep duration between scheduler checks.
const MIN_SLEEP_SECS: u64 = 1;

/// Maximum sleep duration between scheduler checks.
const MAX_SLEEP_SECS: u64 = 60;

/// Type alias for the handler invoked when a notification fires.
///
/// The handler owns its own error classification and logging; the scheduler
/// only guarantees it is invoked at or after the entry's target instant.
pub type NotificationHandler = Arc<
    dyn Fn(ScheduledNotification) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync,
>;

/// The notification scheduler.
///
/// Pending entries live in memory behind a lock and are mirrored to a JSON
/// state file on every change, so a restart picks up exactly the schedule
/// that was pending when the process stopped.
pub struct Scheduler {
    state_path: PathBuf,
    pending: Arc<RwLock<HashMap<String, ScheduledNotification>>>,
}

impl Scheduler {
    /// Load the scheduler from its state file.
    ///
    /// A missing file is an empty schedule. Entries whose target instant has
    /// already passed are kept; they fire on the first loop pass.
    pub fn load(state_path: impl Into<PathBuf>) -> Result<Self, SchedulerError> {
        let state_path = state_path.into();

        if let Some(parent) = state_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SchedulerError::Persist {
                path: state_path.clone(),
                source,
            })?;
        }

        let entries: Vec<ScheduledNotification> = match std::fs::read_to_string(&state_path) {
            Ok(json) => serde_json::from_str(&json).map_err(|source| SchedulerError::Corrupt {
                path: state_path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(SchedulerError::Load {
                    path: state_path,
                    source,
                });
            }
        };

        let overdue = entries.iter().filter(|e| e.is_due()).count();
        info!(
            count = entries.len(),
            overdue,
            path = %state_path.display(),
            "loaded pending notifications"
        );

        let pending = entries.into_iter().map(|e| (e.key.clone(), e)).collect();

        Ok(Self {
            state_path,
            pending: Arc::new(RwLock::new(pending)),
        })
    }

    /// Schedule or replace the pending notification for an episode.
    ///
    /// Exactly one entry exists per key afterwards, at the given target
    /// instant. The replacement and the state write happen under one write
    /// lock, so concurrent upserts for the same key cannot interleave.
    pub async fn upsert(
        &self,
        episode_id: i64,
        fire_at: DateTime<Utc>,
    ) -> Result<ScheduledNotification, SchedulerError> {
        let entry = ScheduledNotification::new(episode_id, fire_at);

        let mut pending = self.pending.write().await;
        match pending.insert(entry.key.clone(), entry.clone()) {
            Some(old) if old.fire_at != entry.fire_at => {
                debug!(
                    key = %entry.key,
                    old_fire_at = %old.fire_at,
                    new_fire_at = %entry.fire_at,
                    "replaced pending notification with corrected target"
                );
            }
            Some(_) => {}
            None => debug!(key = %entry.key, fire_at = %entry.fire_at, "scheduled notification"),
        }
        self.persist(&pending)?;

        Ok(entry)
    }

    /// Remove the pending notification for a key, if any.
    pub async fn remove(&self, key: &str) -> Result<Option<ScheduledNotification>, SchedulerError> {
        let mut pending = self.pending.write().await;
        let removed = pending.remove(key);
        if removed.is_some() {
            self.persist(&pending)?;
        }
        Ok(removed)
    }

    /// All pending entries, unordered.
    pub async fn pending(&self) -> Vec<ScheduledNotification> {
        self.pending.read().await.values().cloned().collect()
    }

    /// Get the pending entry for a key.
    pub async fn get(&self, key: &str) -> Option<ScheduledNotification> {
        self.pending.read().await.get(key).cloned()
    }

    /// Remove and return every entry that is due to fire.
    ///
    /// The entries are deleted from the schedule before the caller sees them;
    /// a re-upsert for the same key arms a fresh entry instead of racing the
    /// in-flight one. A failed state write is logged but does not withhold
    /// the entries, so a due notification is never silently lost.
    pub async fn take_due(&self) -> Vec<ScheduledNotification> {
        let mut pending = self.pending.write().await;

        let due_keys: Vec<String> = pending
            .values()
            .filter(|e| e.is_due())
            .map(|e| e.key.clone())
            .collect();

        let mut due: Vec<ScheduledNotification> = due_keys
            .iter()
            .filter_map(|key| pending.remove(key))
            .collect();
        due.sort_by_key(|e| e.fire_at);

        if !due.is_empty()
            && let Err(e) = self.persist(&pending)
        {
            warn!(error = %e, "failed to persist schedule after removing due entries");
        }

        due
    }

    /// Calculate how long to sleep until the next entry is due.
    pub async fn calculate_sleep_duration(&self) -> std::time::Duration {
        let pending = self.pending.read().await;
        let now = Utc::now();

        let next_due = pending.values().map(|e| e.fire_at).min();

        let secs = match next_due {
            Some(next) => {
                let diff = (next - now).num_seconds();
                (diff.max(MIN_SLEEP_SECS as i64) as u64).min(MAX_SLEEP_SECS)
            }
            None => MAX_SLEEP_SECS,
        };

        std::time::Duration::from_secs(secs)
    }

    /// Run the scheduler loop.
    ///
    /// Each due entry is handed to `handler` on its own task, so a slow
    /// dispatch never delays the loop or other entries. Entries for distinct
    /// keys may run concurrently; same-key serialization follows from
    /// `take_due` removing an entry before it fires.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>, handler: NotificationHandler) {
        info!("notification scheduler started");

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            for entry in self.take_due().await {
                info!(key = %entry.key, fire_at = %entry.fire_at, "firing notification");
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    handler(entry).await;
                });
            }

            let sleep_duration = self.calculate_sleep_duration().await;

            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("scheduler received shutdown signal");
                    }
                }

                _ = sleep(sleep_duration) => {}
            }
        }

        info!("notification scheduler stopped");
    }

    /// Write the pending set to the state file, sorted by target instant.
    fn persist(&self, pending: &HashMap<String, ScheduledNotification>) -> Result<(), SchedulerError> {
        let mut entries: Vec<&ScheduledNotification> = pending.values().collect();
        entries.sort_by_key(|e| (e.fire_at, e.key.clone()));

        let json = serde_json::to_string_pretty(&entries)?;
        std::fs::write(&self.state_path, json).map_err(|source| SchedulerError::Persist {
            path: self.state_path.clone(),
            source,
        })?;

        Ok(())
    }

    /// Path of the backing state file.
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }
}
