//! Upnext: Sonarr episode air-time notifier.
//!
//! Single-purpose daemon: poll the Sonarr calendar for upcoming episodes,
//! keep one durable pending notification per episode, and send it at air
//! time after re-checking the episode still exists and is still monitored.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{Datelike, Utc};
use clap::Parser;
use miette::Result;
use minijinja::value::Value;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use upnext::config::{Config, default_state_file};
use upnext::daemon;
use upnext_notify::TemplateRenderer;
use upnext_sonarr::SonarrConfig;

/// Parse boolean from environment variable, accepting common truthy values.
/// Accepts "1", "true", "yes", "on" (case-insensitive) as true.
/// Accepts "0", "false", "no", "off", "" (case-insensitive) as false.
fn parse_bool_env(s: &str) -> Result<bool, String> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(format!(
            "invalid boolean value '{}', expected 1/true/yes/on or 0/false/no/off",
            s
        )),
    }
}

#[derive(Parser)]
#[command(name = "upnext")]
#[command(about = "Sonarr episode air-time notifier", long_about = None)]
struct Cli {
    /// Sonarr base URL
    #[arg(long, env = "UPNEXT_SONARR_URL")]
    sonarr_url: String,

    /// Sonarr API key
    #[arg(long, env = "UPNEXT_SONARR_API_KEY")]
    sonarr_api_key: String,

    /// Send the API key as an `apikey` query parameter instead of the
    /// X-Api-Key header (for proxies that strip custom headers)
    #[arg(long, env = "UPNEXT_SONARR_API_KEY_IN_URL", value_parser = parse_bool_env, default_value = "false")]
    sonarr_api_key_in_url: bool,

    /// Basic auth username in front of Sonarr
    #[arg(long, env = "UPNEXT_SONARR_USERNAME")]
    sonarr_username: Option<String>,

    /// Basic auth password in front of Sonarr
    #[arg(long, env = "UPNEXT_SONARR_PASSWORD")]
    sonarr_password: Option<String>,

    /// Notification URL: an https:// webhook or discord://<id>/<token>
    #[arg(long, env = "UPNEXT_NOTIFICATION_URL")]
    notification_url: String,

    /// Calendar poll interval in seconds
    #[arg(long, env = "UPNEXT_POLL_INTERVAL", default_value = "60", value_parser = clap::value_parser!(u64).range(1..=86_400))]
    poll_interval: u64,

    /// How far ahead to look for airing episodes, in seconds
    #[arg(long, env = "UPNEXT_LOOKAHEAD", default_value = "86400")]
    lookahead: u64,

    /// Drop a notification that fires later than this many seconds after
    /// its target instant
    #[arg(long, env = "UPNEXT_STALENESS_THRESHOLD", default_value = "120")]
    staleness_threshold: u64,

    /// Only notify for season premieres
    #[arg(long, env = "UPNEXT_PREMIERES_ONLY", value_parser = parse_bool_env, default_value = "false")]
    premieres_only: bool,

    /// Also notify for unmonitored episodes
    #[arg(long, env = "UPNEXT_INCLUDE_UNMONITORED", value_parser = parse_bool_env, default_value = "false")]
    include_unmonitored: bool,

    /// Attach the series poster when one exists
    #[arg(long, env = "UPNEXT_INCLUDE_POSTERS", value_parser = parse_bool_env, default_value = "false")]
    include_posters: bool,

    /// Display timezone for air dates
    #[arg(long, env = "UPNEXT_TIMEZONE", default_value = "UTC")]
    timezone: chrono_tz::Tz,

    /// Directory of user template overrides (*.j2)
    #[arg(long, env = "UPNEXT_TEMPLATES_DIR")]
    templates_dir: Option<PathBuf>,

    /// Schedule state file
    #[arg(long, env = "UPNEXT_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Send a test notification on startup
    #[arg(long, env = "UPNEXT_TEST_NOTIFICATION", value_parser = parse_bool_env, default_value = "false")]
    test_notification: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "upnext=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config {
        sonarr: SonarrConfig {
            url: cli.sonarr_url,
            api_key: cli.sonarr_api_key,
            api_key_in_url: cli.sonarr_api_key_in_url,
            username: cli.sonarr_username,
            password: cli.sonarr_password,
        },
        notification_url: cli.notification_url,
        poll_interval: std::time::Duration::from_secs(cli.poll_interval),
        lookahead: chrono::Duration::seconds(cli.lookahead as i64),
        staleness_threshold: chrono::Duration::seconds(cli.staleness_threshold as i64),
        premieres_only: cli.premieres_only,
        include_unmonitored: cli.include_unmonitored,
        include_posters: cli.include_posters,
        timezone: cli.timezone,
        templates_dir: cli.templates_dir,
        state_file: cli.state_file.unwrap_or_else(default_state_file),
        test_notification: cli.test_notification,
    };

    print_banner(&config);

    daemon::run(config).await
}

/// Render and print the startup banner through the default template set.
fn print_banner(config: &Config) {
    let renderer = TemplateRenderer::new();

    let mut vars = BTreeMap::new();
    vars.insert(
        "version".to_string(),
        Value::from(env!("CARGO_PKG_VERSION")),
    );
    vars.insert(
        "year".to_string(),
        Value::from(Utc::now().with_timezone(&config.timezone).year()),
    );

    match renderer.render("startup", &vars) {
        Ok(banner) => println!("\n{banner}\n"),
        Err(e) => warn!(error = %e, "failed to render startup banner"),
    }
}
