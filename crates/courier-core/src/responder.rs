//! Responder logic — maps a received message to at most one reply.
//!
//! Pure functions; persistence and delivery are the daemon's concern.

use crate::message::ReceivedMessage;

/// Command prefix that routes a message to the compute worker instead of
/// being answered inline.
pub const COMPUTE_PREFIX: &str = "!compute";

/// What the intake path should do with the received row after the reply
/// (if any) has been durably queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
  /// Mark the received message processed immediately.
  MarkProcessed,
  /// Leave the row `new`; the compute worker claims and finishes it.
  Defer,
}

/// A reply decided by [`decide`], not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
  pub recipient:   String,
  pub content:     String,
  pub disposition: Disposition,
}

/// Where a reply to `message` should go.
///
/// A message from our own account is a self-test/sync note and is answered
/// to ourselves. Otherwise group messages are answered in the group and
/// direct messages back to the sender.
pub fn resolve_recipient(message: &ReceivedMessage, own_account: &str) -> String {
  if message.source == own_account {
    return own_account.to_string();
  }
  match &message.group_id {
    Some(group) => group.clone(),
    None => message.source.clone(),
  }
}

/// Decide the reply for a stored received message.
///
/// Command matching is exact and case-sensitive:
/// - `"Ping"` answers `"Pong"`.
/// - a `!compute` command is acknowledged immediately and deferred to the
///   compute worker for the actual result.
/// - anything else is echoed back.
pub fn decide(message: &ReceivedMessage, own_account: &str) -> Reply {
  let recipient = resolve_recipient(message, own_account);

  if message.content == "Ping" {
    Reply {
      recipient,
      content: "Pong".to_string(),
      disposition: Disposition::MarkProcessed,
    }
  } else if message.content.starts_with(COMPUTE_PREFIX) {
    Reply {
      recipient,
      content: "Processing your request...".to_string(),
      disposition: Disposition::Defer,
    }
  } else {
    Reply {
      recipient,
      content: format!("Echo: {}", message.content),
      disposition: Disposition::MarkProcessed,
    }
  }
}
