//! Error type for `courier-store-sqlite`.

use courier_core::message::MessageId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] courier_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Attempted to advance a message that was never stored.
  #[error("received message not found: {0}")]
  ReceivedNotFound(MessageId),

  #[error("outgoing message not found: {0}")]
  OutgoingNotFound(MessageId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
