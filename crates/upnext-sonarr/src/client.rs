//! Sonarr HTTP client implementation.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::debug;

use crate::{Episode, SonarrError};

/// Connection settings for a Sonarr instance.
#[derive(Debug, Clone)]
pub struct SonarrConfig {
    /// Base URL of the instance, without the `/api/v3` suffix.
    pub url: String,
    pub api_key: String,
    /// Send the API key as an `apikey` query parameter instead of the
    /// `X-Api-Key` header (some reverse proxies strip custom headers).
    pub api_key_in_url: bool,
    /// Basic auth in front of Sonarr, if any.
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Client for the Sonarr v3 API.
pub struct SonarrClient {
    http: Client,
    config: SonarrConfig,
    base_url: String,
}

impl SonarrClient {
    /// Create a new client for the configured instance.
    pub fn new(config: SonarrConfig) -> Self {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        let base_url = format!("{}/api/v3", config.url.trim_end_matches('/'));

        Self {
            http,
            config,
            base_url,
        }
    }

    /// Build an authenticated GET request for an API path.
    fn get(&self, path: &str) -> RequestBuilder {
        let mut request = self.http.get(format!("{}{}", self.base_url, path));

        if self.config.api_key_in_url {
            request = request.query(&[("apikey", self.config.api_key.as_str())]);
        } else {
            request = request.header("X-Api-Key", &self.config.api_key);
        }

        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            request = request.basic_auth(username, Some(password));
        }

        request
    }

    /// List calendar episodes airing within `[start, end)`.
    ///
    /// `include_unmonitored` widens the server-side filter; the monitored
    /// check at dispatch time is what decides whether anything is sent.
    pub async fn calendar(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        include_unmonitored: bool,
    ) -> Result<Vec<Episode>, SonarrError> {
        let response = self
            .get("/calendar")
            .query(&[
                ("start", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("end", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("unmonitored", include_unmonitored.to_string()),
                ("includeSeries", "true".to_string()),
            ])
            .send()
            .await
            .map_err(classify_send_error)?;

        let response = check_status(response)?;
        let episodes: Vec<Episode> = response.json().await.map_err(SonarrError::Decode)?;

        debug!(count = episodes.len(), "retrieved calendar");
        Ok(episodes)
    }

    /// Re-fetch a single calendar episode by id.
    ///
    /// Returns [`SonarrError::NotFound`] when the episode has disappeared
    /// from the library since it was scheduled.
    pub async fn episode(&self, id: i64) -> Result<Episode, SonarrError> {
        let response = self
            .get(&format!("/calendar/{id}"))
            .send()
            .await
            .map_err(classify_send_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SonarrError::NotFound);
        }

        let response = check_status(response)?;
        let episode: Episode = response.json().await.map_err(SonarrError::Decode)?;

        debug!(episode_id = id, "retrieved episode");
        Ok(episode)
    }

    /// The resolved API base URL (for log messages).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Split request failures into "instance unreachable" and everything else.
fn classify_send_error(err: reqwest::Error) -> SonarrError {
    if err.is_connect() || err.is_timeout() {
        SonarrError::Unreachable(err)
    } else {
        SonarrError::Http(err)
    }
}

/// Map non-success statuses onto the error taxonomy.
fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SonarrError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED => Err(SonarrError::Rejected),
        status => Err(SonarrError::Status(status)),
    }
}
