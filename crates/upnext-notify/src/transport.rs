//! Outbound notification delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::TransportError;

/// The narrow interface the dispatcher sends through.
///
/// `Ok(delivered)` reports whether the endpoint accepted the notification;
/// transport-level failures (connection, DNS, timeout) are errors. The
/// dispatcher treats both a `false` and an error as a delivery failure and
/// never retries.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(
        &self,
        title: &str,
        body: &str,
        attachment: Option<&str>,
    ) -> Result<bool, TransportError>;
}

/// Generic JSON webhook: POST `{title, body, attachment}` to a URL.
pub struct WebhookTransport {
    http: Client,
    url: String,
}

impl WebhookTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: default_client(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl NotificationTransport for WebhookTransport {
    async fn send(
        &self,
        title: &str,
        body: &str,
        attachment: Option<&str>,
    ) -> Result<bool, TransportError> {
        let response = self
            .http
            .post(&self.url)
            .json(&json!({
                "title": title,
                "body": body,
                "attachment": attachment,
            }))
            .send()
            .await?;

        let delivered = response.status().is_success();
        debug!(status = %response.status(), delivered, "posted webhook notification");
        Ok(delivered)
    }
}

/// Discord webhook: one embed per notification, poster as the embed image.
pub struct DiscordTransport {
    http: Client,
    webhook_url: String,
}

impl DiscordTransport {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            http: default_client(),
            webhook_url: webhook_url.into(),
        }
    }
}

#[async_trait]
impl NotificationTransport for DiscordTransport {
    async fn send(
        &self,
        title: &str,
        body: &str,
        attachment: Option<&str>,
    ) -> Result<bool, TransportError> {
        let mut embed = json!({
            "title": title,
            "description": body,
        });
        if let Some(url) = attachment {
            embed["image"] = json!({ "url": url });
        }

        let response = self
            .http
            .post(&self.webhook_url)
            .json(&json!({ "embeds": [embed] }))
            .send()
            .await?;

        let delivered = response.status().is_success();
        debug!(status = %response.status(), delivered, "posted Discord notification");
        Ok(delivered)
    }
}

/// Build a transport from a notification URL.
///
/// `discord://<webhook-id>/<token>` selects the Discord transport; plain
/// `http(s)://` URLs get the generic webhook.
pub fn transport_for_url(url: &str) -> Result<Box<dyn NotificationTransport>, TransportError> {
    if let Some(rest) = url.strip_prefix("discord://") {
        let (id, token) = rest
            .trim_end_matches('/')
            .split_once('/')
            .ok_or_else(|| {
                TransportError::InvalidUrl(format!(
                    "expected discord://<webhook-id>/<token>, got {url}"
                ))
            })?;
        if id.is_empty() || token.is_empty() {
            return Err(TransportError::InvalidUrl(format!(
                "expected discord://<webhook-id>/<token>, got {url}"
            )));
        }
        return Ok(Box::new(DiscordTransport::new(format!(
            "https://discord.com/api/webhooks/{id}/{token}"
        ))));
    }

    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(Box::new(WebhookTransport::new(url)));
    }

    Err(TransportError::InvalidUrl(format!(
        "unsupported notification URL scheme: {url}"
    )))
}

fn default_client() -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .expect("failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_webhook_posts_title_body_attachment() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(json!({
                "title": "t",
                "body": "b",
                "attachment": "https://example.com/poster.jpg",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = WebhookTransport::new(format!("{}/hook", server.uri()));
        let delivered = transport
            .send("t", "b", Some("https://example.com/poster.jpg"))
            .await
            .unwrap();
        assert!(delivered);
    }

    #[tokio::test]
    async fn test_webhook_reports_rejection_as_not_delivered() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = WebhookTransport::new(server.uri());
        let delivered = transport.send("t", "b", None).await.unwrap();
        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_discord_embed_includes_image() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "embeds": [{
                    "title": "t",
                    "description": "b",
                    "image": {"url": "https://example.com/poster.jpg"},
                }],
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let transport = DiscordTransport::new(server.uri());
        let delivered = transport
            .send("t", "b", Some("https://example.com/poster.jpg"))
            .await
            .unwrap();
        assert!(delivered);
    }

    #[test]
    fn test_transport_for_url_schemes() {
        assert!(transport_for_url("https://example.com/hook").is_ok());
        assert!(transport_for_url("discord://123/abc").is_ok());
        assert!(matches!(
            transport_for_url("discord://missing-token"),
            Err(TransportError::InvalidUrl(_))
        ));
        assert!(matches!(
            transport_for_url("redis://localhost"),
            Err(TransportError::InvalidUrl(_))
        ));
    }
}
