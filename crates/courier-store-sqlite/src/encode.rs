//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, which preserve ordering and
//! sub-second precision through the round trip. Statuses are stored as the
//! lowercase strings defined on the core enums.

use chrono::{DateTime, Utc};
use courier_core::message::{
  OutgoingMessage, OutgoingStatus, ReceivedMessage, ReceivedStatus,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row shapes ──────────────────────────────────────────────────────────────

/// A `messages_received` row as read straight out of SQLite.
pub struct RawReceived {
  pub id:          i64,
  pub received_at: String,
  pub source:      String,
  pub group_id:    Option<String>,
  pub content:     String,
  pub status:      String,
}

impl RawReceived {
  pub fn into_received(self) -> Result<ReceivedMessage> {
    Ok(ReceivedMessage {
      id:          self.id,
      received_at: decode_dt(&self.received_at)?,
      source:      self.source,
      group_id:    self.group_id,
      content:     self.content,
      status:      ReceivedStatus::parse(&self.status).map_err(Error::Core)?,
    })
  }
}

/// An `outgoing_messages` row as read straight out of SQLite.
pub struct RawOutgoing {
  pub id:                  i64,
  pub received_message_id: Option<i64>,
  pub recipient:           String,
  pub content:             String,
  pub status:              String,
  pub sent_at:             Option<String>,
}

impl RawOutgoing {
  pub fn into_outgoing(self) -> Result<OutgoingMessage> {
    Ok(OutgoingMessage {
      id:                  self.id,
      received_message_id: self.received_message_id,
      recipient:           self.recipient,
      content:             self.content,
      status:              OutgoingStatus::parse(&self.status).map_err(Error::Core)?,
      sent_at:             self.sent_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
