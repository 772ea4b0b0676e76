//! services/bot/src/adapters/transport.rs
//!
//! Chat transport backed by an HTTP bridge. The bridge owns the chat session
//! (pairing, delivery, contact resolution); it pushes inbound events to our
//! webhook and exposes `POST /messages` for replies and URLs for media.

use async_trait::async_trait;
use serde::Serialize;
use site_report_core::domain::Attachment;
use site_report_core::ports::{ChatTransport, PortError, PortResult};
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// An adapter that implements the `ChatTransport` port over the bridge's HTTP API.
#[derive(Clone)]
pub struct HttpBridgeTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBridgeTransport {
    /// Creates a new `HttpBridgeTransport` for the bridge at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Attachment locators are either absolute URLs or paths on the bridge.
    fn attachment_url(&self, locator: &str) -> String {
        if locator.starts_with("http://") || locator.starts_with("https://") {
            locator.to_string()
        } else {
            format!("{}/{}", self.base_url, locator.trim_start_matches('/'))
        }
    }
}

#[async_trait]
impl ChatTransport for HttpBridgeTransport {
    async fn send_message(&self, chat_id: &str, text: &str) -> PortResult<()> {
        self.client
            .post(format!("{}/messages", self.base_url))
            .json(&OutgoingMessage { chat_id, text })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        debug!(chat = %chat_id, "reply delivered to bridge");
        Ok(())
    }

    async fn download_attachment(&self, attachment: &Attachment) -> PortResult<Vec<u8>> {
        let url = self.attachment_url(&attachment.locator);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PortError::NotFound(format!("attachment {url}")));
        }
        let response = response
            .error_for_status()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        debug!(url = %url, bytes = bytes.len(), "attachment downloaded");
        Ok(bytes.to_vec())
    }
}
