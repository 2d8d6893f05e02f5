//! Calendar polling: discovers upcoming episodes and schedules notifications.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use upnext_scheduler::Scheduler;
use upnext_sonarr::{SonarrClient, SonarrError};

use crate::config::Config;

/// Polls the Sonarr calendar on an interval and upserts one pending
/// notification per qualifying episode.
pub struct Poller {
    sonarr: Arc<SonarrClient>,
    scheduler: Arc<Scheduler>,
    config: Config,
}

impl Poller {
    pub fn new(sonarr: Arc<SonarrClient>, scheduler: Arc<Scheduler>, config: Config) -> Self {
        Self {
            sonarr,
            scheduler,
            config,
        }
    }

    /// Run one poll cycle. Returns how many episodes were scheduled.
    ///
    /// A calendar query failure aborts the whole cycle before anything is
    /// scheduled; the next tick retries with no carried state.
    pub async fn poll_once(&self) -> Result<usize, SonarrError> {
        let start = Utc::now();
        let end = start + self.config.lookahead;
        debug!(start = %start, end = %end, "querying airing window");

        let episodes = self
            .sonarr
            .calendar(start, end, self.config.include_unmonitored)
            .await?;
        info!(count = episodes.len(), "calendar retrieved");

        let mut scheduled = 0;
        for episode in episodes {
            if self.config.premieres_only && !episode.is_premiere() {
                debug!(episode = %episode.log_label(), "skipping non-premiere");
                continue;
            }

            // No air instant, nothing to schedule.
            let Some(air_date_utc) = episode.air_date_utc else {
                debug!(episode = %episode.log_label(), "skipping episode without an air date");
                continue;
            };

            // The monitored flag is checked at dispatch time, not here: it
            // can change between discovery and air time.
            match self.scheduler.upsert(episode.id, air_date_utc).await {
                Ok(_) => {
                    debug!(
                        episode = %episode.log_label(),
                        air_date = %air_date_utc,
                        "notification scheduled"
                    );
                    scheduled += 1;
                }
                Err(e) => {
                    warn!(episode = %episode.log_label(), error = %e, "failed to persist schedule entry");
                }
            }
        }

        Ok(scheduled)
    }

    /// Run the poll loop until shutdown.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            lookahead_secs = self.config.lookahead.num_seconds(),
            "calendar poller started"
        );

        let mut interval = tokio::time::interval(self.config.poll_interval);

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }

                _ = interval.tick() => {
                    match self.poll_once().await {
                        Ok(scheduled) => debug!(scheduled, "poll cycle complete"),
                        Err(e) => {
                            // Fatal to this cycle only; the next tick retries.
                            error!(error = %e, "calendar poll failed; {}", e.remediation());
                        }
                    }
                }
            }
        }

        info!("calendar poller stopped");
    }
}
