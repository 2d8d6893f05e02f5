//! Wire models for the Sonarr v3 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A calendar episode as returned by `/api/v3/calendar`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: i64,
    pub title: String,
    pub season_number: i32,
    pub episode_number: i32,
    /// Airing instant in UTC. Absent when Sonarr has no air date yet.
    #[serde(default)]
    pub air_date_utc: Option<DateTime<Utc>>,
    /// Runtime in minutes.
    #[serde(default)]
    pub runtime: i32,
    pub monitored: bool,
    /// Embedded series record (queried with `includeSeries=true`).
    pub series: Series,
}

/// The series a calendar episode belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub title: String,
    #[serde(default)]
    pub network: Option<String>,
    /// External ids. Sonarr reports 0 (or an empty string for IMDB) when it
    /// has no mapping, so 0/empty means absent.
    #[serde(default)]
    pub tvdb_id: Option<i64>,
    #[serde(default)]
    pub tmdb_id: Option<i64>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub images: Vec<SeriesImage>,
}

/// A tagged series image (poster, banner, fanart, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesImage {
    pub cover_type: String,
    #[serde(default)]
    pub remote_url: Option<String>,
}

impl Episode {
    /// Label used in logs: `Show S1E2 — Title (42)`.
    pub fn log_label(&self) -> String {
        format!(
            "{} S{}E{} — {} ({})",
            self.series.title, self.season_number, self.episode_number, self.title, self.id
        )
    }

    /// First poster URL in the series image list, if any.
    pub fn poster_url(&self) -> Option<&str> {
        self.series
            .images
            .iter()
            .find(|image| image.cover_type == "poster")
            .and_then(|image| image.remote_url.as_deref())
    }

    /// Whether this episode opens its season.
    pub fn is_premiere(&self) -> bool {
        self.episode_number == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn episode_json() -> serde_json::Value {
        serde_json::json!({
            "id": 42,
            "title": "Pilot",
            "seasonNumber": 1,
            "episodeNumber": 1,
            "airDateUtc": "2024-01-01T00:00:00Z",
            "runtime": 45,
            "monitored": true,
            "series": {
                "title": "Test Show",
                "network": "HBO",
                "tvdbId": 121361,
                "tmdbId": 1399,
                "imdbId": "tt0944947",
                "images": [
                    {"coverType": "banner", "remoteUrl": "https://example.com/banner.jpg"},
                    {"coverType": "poster", "remoteUrl": "https://example.com/poster.jpg"}
                ]
            }
        })
    }

    #[test]
    fn test_episode_deserializes_from_camel_case() {
        let episode: Episode = serde_json::from_value(episode_json()).unwrap();
        assert_eq!(episode.id, 42);
        assert_eq!(episode.season_number, 1);
        assert_eq!(episode.series.title, "Test Show");
        assert_eq!(episode.series.tvdb_id, Some(121361));
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let json = serde_json::json!({
            "id": 7,
            "title": "Untitled",
            "seasonNumber": 2,
            "episodeNumber": 3,
            "monitored": false,
            "series": {"title": "Bare Show"}
        });

        let episode: Episode = serde_json::from_value(json).unwrap();
        assert_eq!(episode.air_date_utc, None);
        assert_eq!(episode.runtime, 0);
        assert_eq!(episode.series.network, None);
        assert!(episode.series.images.is_empty());
    }

    #[test]
    fn test_poster_url_picks_first_poster() {
        let episode: Episode = serde_json::from_value(episode_json()).unwrap();
        assert_eq!(episode.poster_url(), Some("https://example.com/poster.jpg"));
    }

    #[test]
    fn test_poster_url_absent_when_no_poster_tagged() {
        let mut json = episode_json();
        json["series"]["images"] = serde_json::json!([
            {"coverType": "banner", "remoteUrl": "https://example.com/banner.jpg"}
        ]);
        let episode: Episode = serde_json::from_value(json).unwrap();
        assert_eq!(episode.poster_url(), None);
    }

    #[test]
    fn test_is_premiere() {
        let mut episode: Episode = serde_json::from_value(episode_json()).unwrap();
        assert!(episode.is_premiere());
        episode.episode_number = 4;
        assert!(!episode.is_premiere());
    }

    #[test]
    fn test_log_label() {
        let episode: Episode = serde_json::from_value(episode_json()).unwrap();
        assert_eq!(episode.log_label(), "Test Show S1E1 — Pilot (42)");
    }
}
