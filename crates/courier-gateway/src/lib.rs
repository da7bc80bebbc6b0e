//! HTTP client for the external messaging gateway.
//!
//! The gateway performs the actual account linking and wire-protocol
//! send/receive; this crate only speaks its REST surface: `/v1/about`,
//! `/v1/qrcodelink`, `/v2/send`, and `/v1/receive/{account}`.

mod receive;
mod types;

pub mod error;

pub use error::{Error, Result};
pub use receive::Subscription;
pub use types::About;

#[cfg(test)]
mod tests;

use std::time::Duration;

use reqwest::Client;
use types::{ErrorBody, ReceiveItem, SendRequest};

/// Connection settings for the gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
  /// e.g. `http://signal-cli:8080`
  pub base_url:    String,
  /// The linked account (phone number) this daemon acts as.
  pub account:     String,
  /// Device name presented during the linking handshake.
  pub device_name: String,
}

/// Async HTTP client for the messaging gateway.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based. No retry
/// policy lives here; the bootstrap sequencer and the dispatch loop each
/// apply their own.
#[derive(Clone)]
pub struct GatewayClient {
  client: Client,
  config: GatewayConfig,
}

impl GatewayClient {
  pub fn new(config: GatewayConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// Read the optional `{"error": …}` body from a failed response.
  async fn error_message(resp: reqwest::Response) -> String {
    resp
      .json::<ErrorBody>()
      .await
      .ok()
      .and_then(|b| b.error)
      .unwrap_or_default()
  }

  // ── Health / linking ──────────────────────────────────────────────────────

  /// `GET /v1/about` — the gateway's status endpoint.
  pub async fn about(&self) -> Result<About> {
    let resp = self.client.get(self.url("/v1/about")).send().await?;

    if !resp.status().is_success() {
      let status = resp.status().as_u16();
      let message = Self::error_message(resp).await;
      return Err(Error::Gateway { status, message });
    }
    Ok(resp.json().await?)
  }

  /// Whether the gateway answers its status endpoint at all.
  pub async fn check_health(&self) -> bool { self.about().await.is_ok() }

  /// `GET /v1/qrcodelink?device_name=<name>` — request the linking artifact
  /// (a QR code image) for this device.
  pub async fn link_device(&self) -> Result<Vec<u8>> {
    let resp = self
      .client
      .get(self.url("/v1/qrcodelink"))
      .query(&[("device_name", self.config.device_name.as_str())])
      .send()
      .await?;

    if !resp.status().is_success() {
      let status = resp.status();
      let message = Self::error_message(resp).await;
      return Err(Error::Linking(format!(
        "gateway rejected link request ({status}): {message}"
      )));
    }
    Ok(resp.bytes().await?.to_vec())
  }

  // ── Messaging ─────────────────────────────────────────────────────────────

  /// `POST /v2/send` — dispatch one message to one recipient.
  pub async fn send(&self, recipient: &str, content: &str) -> Result<()> {
    let body = SendRequest {
      number:     &self.config.account,
      recipients: vec![recipient],
      message:    content,
    };

    let resp = self
      .client
      .post(self.url("/v2/send"))
      .json(&body)
      .send()
      .await?;

    if !resp.status().is_success() {
      let status = resp.status().as_u16();
      let message = Self::error_message(resp).await;
      return Err(Error::Delivery {
        recipient: recipient.to_string(),
        status,
        message,
      });
    }
    Ok(())
  }

  /// `GET /v1/receive/{account}` — drain the gateway's accumulated inbound
  /// envelopes. Envelopes without message text are dropped here.
  pub(crate) async fn fetch_events(
    &self,
  ) -> Result<Vec<courier_core::message::InboundEvent>> {
    let resp = self
      .client
      .get(self.url(&format!("/v1/receive/{}", self.config.account)))
      .send()
      .await?;

    if !resp.status().is_success() {
      let status = resp.status().as_u16();
      let message = Self::error_message(resp).await;
      return Err(Error::Gateway { status, message });
    }

    let items: Vec<ReceiveItem> = resp.json().await?;
    Ok(items.into_iter().filter_map(ReceiveItem::into_event).collect())
  }

  /// A long-lived subscription over the receive endpoint.
  pub fn subscribe(&self, poll_interval: Duration) -> Subscription {
    Subscription::new(self.clone(), poll_interval)
  }
}
