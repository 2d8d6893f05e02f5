//! Error types for rendering and delivery.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the template renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Neither the user set nor the built-in set could render the template.
    #[error("failed to render template '{name}': {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// A user template directory or file could not be read at startup.
    #[error("failed to read template source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the notification transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The notification endpoint could not be reached.
    #[error("notification transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured notification URL is not usable.
    #[error("invalid notification URL: {0}")]
    InvalidUrl(String),
}
