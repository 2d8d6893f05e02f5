//! Notification rendering and delivery for Upnext.
//!
//! Three pieces live here:
//! - the template renderer, with built-in defaults a user template set can
//!   override and a fallback that keeps a broken template from dropping a
//!   notification,
//! - the episode variable builder, a pure transform from a Sonarr episode
//!   to the flat mapping templates render against,
//! - the outbound transport trait and its webhook/Discord implementations.

mod error;
mod templates;
mod transport;
mod variables;

pub use error::{RenderError, TransportError};
pub use templates::TemplateRenderer;
pub use transport::{
    DiscordTransport, NotificationTransport, WebhookTransport, transport_for_url,
};
pub use variables::build_variables;
