//! Deferred notification dispatch: the task body fired by the scheduler.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info};

use upnext_notify::{NotificationTransport, RenderError, TemplateRenderer, build_variables};
use upnext_sonarr::{SonarrClient, SonarrError};

use crate::config::Config;

/// Terminal result of one dispatch. No outcome is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Fired too long after its target instant; dropped unsent.
    Stale,
    /// The episode no longer exists in the library; dropped unsent.
    NotFound,
    /// The episode is unmonitored and unmonitored episodes are excluded.
    Unmonitored,
    /// Rendered and delivered.
    Sent,
    /// Rendered but the transport reported no successful delivery.
    SendFailed,
}

/// Hard dispatch failures, classified by the daemon's top-level handler.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The episode re-fetch failed with something other than "not found".
    #[error(transparent)]
    Source(#[from] SonarrError),

    /// Both the user and the built-in template failed to render.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Re-validates, renders, and sends a scheduled notification.
pub struct Dispatcher {
    sonarr: Arc<SonarrClient>,
    renderer: Arc<TemplateRenderer>,
    transport: Arc<dyn NotificationTransport>,
    config: Config,
}

impl Dispatcher {
    pub fn new(
        sonarr: Arc<SonarrClient>,
        renderer: Arc<TemplateRenderer>,
        transport: Arc<dyn NotificationTransport>,
        config: Config,
    ) -> Self {
        Self {
            sonarr,
            renderer,
            transport,
            config,
        }
    }

    /// Dispatch the notification scheduled for `episode_id` at `fire_at`.
    pub async fn dispatch(
        &self,
        episode_id: i64,
        fire_at: DateTime<Utc>,
    ) -> Result<DispatchOutcome, DispatchError> {
        debug!(episode_id, "preparing notification");

        // Guard against scheduler backlog, clock skew, or downtime replaying
        // long-stale work after a restart.
        let age = Utc::now() - fire_at;
        if age > self.config.staleness_threshold {
            debug!(
                episode_id,
                age_secs = age.num_seconds(),
                "dropping stale notification"
            );
            return Ok(DispatchOutcome::Stale);
        }

        // Re-fetch: the episode may have changed or been deleted since it
        // was scheduled.
        let episode = match self.sonarr.episode(episode_id).await {
            Ok(episode) => episode,
            Err(SonarrError::NotFound) => {
                debug!(episode_id, "episode no longer exists, skipping notification");
                return Ok(DispatchOutcome::NotFound);
            }
            Err(e) => return Err(e.into()),
        };

        // Monitored state as of air time, not discovery time.
        if !(episode.monitored || self.config.include_unmonitored) {
            debug!(
                episode = %episode.log_label(),
                "episode is not monitored, skipping notification"
            );
            return Ok(DispatchOutcome::Unmonitored);
        }

        let vars = build_variables(&episode, self.config.timezone);
        let title = self.renderer.render("title", &vars)?;
        let body = self.renderer.render("body", &vars)?;

        let attachment = if self.config.include_posters {
            episode.poster_url()
        } else {
            None
        };
        if let Some(url) = attachment {
            debug!(url, "attaching poster");
        }

        info!(episode = %episode.log_label(), "sending notification");
        match self.transport.send(&title, &body, attachment).await {
            Ok(true) => {
                debug!(episode = %episode.log_label(), "notification delivered");
                Ok(DispatchOutcome::Sent)
            }
            Ok(false) => {
                error!(episode = %episode.log_label(), "notification was not delivered");
                Ok(DispatchOutcome::SendFailed)
            }
            Err(e) => {
                error!(episode = %episode.log_label(), error = %e, "notification delivery failed");
                Ok(DispatchOutcome::SendFailed)
            }
        }
    }
}
