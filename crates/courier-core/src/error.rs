//! Error types for `courier-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A status column held a value outside the lifecycle vocabulary.
  #[error("unknown message status: {0:?}")]
  UnknownStatus(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
