//! Sonarr v3 API client for Upnext.
//!
//! Upnext treats Sonarr as the single source of truth for episodes: every
//! read re-derives the episode from the API, nothing is cached between
//! calls. The client covers the two operations the notifier needs, the
//! calendar window query and the single-episode re-fetch.

mod client;
mod error;
mod types;

pub use client::{SonarrClient, SonarrConfig};
pub use error::SonarrError;
pub use types::{Episode, Series, SeriesImage};
