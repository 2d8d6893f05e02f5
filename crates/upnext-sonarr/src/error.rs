//! Error types for the Sonarr client.

use thiserror::Error;

/// Errors that can occur when talking to Sonarr.
#[derive(Debug, Error)]
pub enum SonarrError {
    /// Sonarr could not be reached at all (connection, DNS, timeout).
    #[error("Sonarr is unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// Sonarr rejected our credentials.
    #[error("Sonarr rejected the request (HTTP 401)")]
    Rejected,

    /// The requested episode does not exist (HTTP 404 on a re-fetch).
    #[error("episode not found")]
    NotFound,

    /// Sonarr responded with an unexpected status code.
    #[error("Sonarr responded with HTTP {0}")]
    Status(reqwest::StatusCode),

    /// Transport-level failure after the connection was established.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("failed to decode Sonarr response: {0}")]
    Decode(#[source] reqwest::Error),
}

impl SonarrError {
    /// Operator-facing hint appended to error-level logs.
    pub fn remediation(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => {
                "check UPNEXT_SONARR_URL and make sure Sonarr is running and reachable"
            }
            Self::Rejected => {
                "check UPNEXT_SONARR_API_KEY and, if set, UPNEXT_SONARR_USERNAME / UPNEXT_SONARR_PASSWORD"
            }
            _ => "check UPNEXT_SONARR_URL and UPNEXT_SONARR_API_KEY",
        }
    }
}
