//! Error type for `courier-gateway`.
//!
//! The client never retries internally; callers decide retry vs. fatal.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Transport-level failure: the gateway is unreachable or the connection
  /// broke mid-request.
  #[error("gateway transport error: {0}")]
  Http(#[from] reqwest::Error),

  /// The gateway answered, but with a non-success status.
  #[error("gateway returned {status}: {message}")]
  Gateway { status: u16, message: String },

  /// A specific send attempt failed. The affected outgoing message stays
  /// `pending` and is retried on the next dispatch cycle.
  #[error("delivery to {recipient} failed ({status}): {message}")]
  Delivery {
    recipient: String,
    status:    u16,
    message:   String,
  },

  /// The gateway refused or could not complete the linking handshake.
  #[error("linking failed: {0}")]
  Linking(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
