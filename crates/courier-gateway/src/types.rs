//! Wire types for the gateway REST surface.
//!
//! The envelope shapes mirror what the signal-cli-style REST gateway emits;
//! only the fields this system consumes are modeled.

use chrono::{DateTime, TimeZone, Utc};
use courier_core::message::InboundEvent;
use serde::{Deserialize, Serialize};

/// `GET /v1/about` response.
#[derive(Debug, Clone, Deserialize)]
pub struct About {
  pub mode:    String,
  pub version: String,
}

/// Error body optionally attached to non-200 gateway responses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
  pub error: Option<String>,
}

/// `POST /v2/send` request body.
#[derive(Debug, Serialize)]
pub struct SendRequest<'a> {
  pub number:     &'a str,
  pub recipients: Vec<&'a str>,
  pub message:    &'a str,
}

// ─── Receive envelopes ───────────────────────────────────────────────────────

/// One item of the `GET /v1/receive/{account}` response array.
#[derive(Debug, Deserialize)]
pub struct ReceiveItem {
  pub envelope: Envelope,
}

#[derive(Debug, Deserialize)]
pub struct Envelope {
  pub source:    String,
  /// Epoch milliseconds of gateway receipt.
  pub timestamp: i64,
  /// Absent for non-message envelopes (read receipts, typing indicators).
  #[serde(rename = "dataMessage")]
  pub data_message: Option<DataMessage>,
}

#[derive(Debug, Deserialize)]
pub struct DataMessage {
  pub message: Option<String>,
  #[serde(rename = "groupInfo")]
  pub group_info: Option<GroupInfo>,
}

#[derive(Debug, Deserialize)]
pub struct GroupInfo {
  #[serde(rename = "groupId")]
  pub group_id: Option<String>,
}

impl ReceiveItem {
  /// Map a wire envelope to a domain event. Returns `None` for envelopes
  /// that carry no message text.
  pub fn into_event(self) -> Option<InboundEvent> {
    let envelope = self.envelope;
    let data = envelope.data_message?;
    let content = data.message?;

    Some(InboundEvent {
      source:    envelope.source,
      group_id:  data.group_info.and_then(|g| g.group_id),
      content,
      timestamp: millis_to_dt(envelope.timestamp),
    })
  }
}

fn millis_to_dt(millis: i64) -> DateTime<Utc> {
  Utc
    .timestamp_millis_opt(millis)
    .single()
    .unwrap_or_else(Utc::now)
}
