//! Process configuration, fixed at startup.

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use chrono::Duration;
use chrono_tz::Tz;

use upnext_sonarr::SonarrConfig;

/// Read-only configuration shared by the poller and dispatcher.
///
/// One struct, built once from the CLI and passed into each component at
/// construction; no component reads settings from anywhere else.
#[derive(Debug, Clone)]
pub struct Config {
    pub sonarr: SonarrConfig,
    /// Where notifications go: an `https://` webhook or `discord://id/token`.
    pub notification_url: String,
    /// How often the calendar poller ticks.
    pub poll_interval: StdDuration,
    /// How far ahead of now the poller searches for airing episodes.
    pub lookahead: Duration,
    /// Maximum lateness before a fired notification is dropped unsent.
    pub staleness_threshold: Duration,
    /// Only notify for season premieres.
    pub premieres_only: bool,
    /// Also notify for unmonitored episodes.
    pub include_unmonitored: bool,
    /// Attach the series poster when one exists.
    pub include_posters: bool,
    /// Display timezone for air dates in templates.
    pub timezone: Tz,
    /// Directory of user template overrides, if any.
    pub templates_dir: Option<PathBuf>,
    /// The schedule state file.
    pub state_file: PathBuf,
    /// Send a test notification on startup.
    pub test_notification: bool,
}

/// Default schedule state file location.
pub fn default_state_file() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("upnext")
        .join("schedule.json")
}
