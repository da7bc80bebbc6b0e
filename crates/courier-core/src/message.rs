//! Message types — the two persisted records and the inbound gateway event.
//!
//! Both records are owned by the store; status is never cached in memory.
//! Every transition is a direct write against the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned identifier; monotonically increasing per table.
pub type MessageId = i64;

// ─── Received side ───────────────────────────────────────────────────────────

/// Lifecycle of a received message.
///
/// Transitions are strictly forward: `New → Processing → Processed` when a
/// worker claims the row, or `New → Processed` directly on the synchronous
/// intake path. No transition ever regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceivedStatus {
  New,
  Processing,
  Processed,
}

impl ReceivedStatus {
  /// The column value used by storage backends.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::New => "new",
      Self::Processing => "processing",
      Self::Processed => "processed",
    }
  }

  pub fn parse(s: &str) -> Result<Self, crate::Error> {
    match s {
      "new" => Ok(Self::New),
      "processing" => Ok(Self::Processing),
      "processed" => Ok(Self::Processed),
      other => Err(crate::Error::UnknownStatus(other.to_string())),
    }
  }
}

/// A message received from the gateway, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivedMessage {
  pub id:          MessageId,
  pub received_at: DateTime<Utc>,
  /// Sender identifier (account/phone number).
  pub source:      String,
  /// Group-channel identifier; `None` for direct messages.
  pub group_id:    Option<String>,
  pub content:     String,
  pub status:      ReceivedStatus,
}

/// Input for [`MessageStore::insert_received`](crate::store::MessageStore).
/// The id and initial status are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewReceived {
  pub received_at: DateTime<Utc>,
  pub source:      String,
  pub group_id:    Option<String>,
  pub content:     String,
}

// ─── Outgoing side ───────────────────────────────────────────────────────────

/// Lifecycle of an outgoing message. `Pending → Sent` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutgoingStatus {
  Pending,
  Sent,
}

impl OutgoingStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Sent => "sent",
    }
  }

  pub fn parse(s: &str) -> Result<Self, crate::Error> {
    match s {
      "pending" => Ok(Self::Pending),
      "sent" => Ok(Self::Sent),
      other => Err(crate::Error::UnknownStatus(other.to_string())),
    }
  }
}

/// A reply queued for delivery, as persisted.
///
/// `sent_at` is `Some` iff `status == Sent`; it is written once, on the
/// transition, and never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingMessage {
  pub id:                  MessageId,
  /// The received message that caused this reply, if any.
  pub received_message_id: Option<MessageId>,
  pub recipient:           String,
  pub content:             String,
  pub status:              OutgoingStatus,
  pub sent_at:             Option<DateTime<Utc>>,
}

/// Input for [`MessageStore::insert_outgoing`](crate::store::MessageStore).
#[derive(Debug, Clone)]
pub struct NewOutgoing {
  pub received_message_id: Option<MessageId>,
  pub recipient:           String,
  pub content:             String,
}

// ─── Gateway events ──────────────────────────────────────────────────────────

/// An inbound message event as delivered by the gateway subscription,
/// before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
  pub source:    String,
  pub group_id:  Option<String>,
  pub content:   String,
  pub timestamp: DateTime<Utc>,
}
