//! The `MessageStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `courier-store-sqlite`). The daemon loops depend on this abstraction, not
//! on any concrete backend.
//!
//! All methods return `Send` futures so the trait can be used across
//! concurrently spawned tokio tasks.

use std::future::Future;

use crate::message::{
  MessageId, NewOutgoing, NewReceived, OutgoingMessage, ReceivedMessage,
};

/// Abstraction over the durable mailbox between reception and delivery.
///
/// The store exclusively owns persisted message state. Cross-loop
/// coordination happens only through atomic conditional status updates —
/// never a separate read followed by a write.
pub trait MessageStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Received ──────────────────────────────────────────────────────────

  /// Persist an inbound message with status `new` and return the stored
  /// record (id assigned by the store).
  fn insert_received(
    &self,
    input: NewReceived,
  ) -> impl Future<Output = Result<ReceivedMessage, Self::Error>> + Send + '_;

  /// Atomically select one `new` record, advance it to `processing`, and
  /// return it. Returns `None` when no `new` record exists.
  ///
  /// Under concurrent callers each `new` row is handed to at most one
  /// claimant: the select-and-update is a single indivisible operation
  /// against the backend.
  fn claim_next_new(
    &self,
  ) -> impl Future<Output = Result<Option<ReceivedMessage>, Self::Error>> + Send + '_;

  /// Advance a received message to `processed`. Idempotent.
  fn mark_processed(
    &self,
    id: MessageId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Retrieve a received message by id. Returns `None` if not found.
  fn get_received(
    &self,
    id: MessageId,
  ) -> impl Future<Output = Result<Option<ReceivedMessage>, Self::Error>> + Send + '_;

  // ── Outgoing ──────────────────────────────────────────────────────────

  /// Queue a reply with status `pending` and return the stored record.
  fn insert_outgoing(
    &self,
    input: NewOutgoing,
  ) -> impl Future<Output = Result<OutgoingMessage, Self::Error>> + Send + '_;

  /// Snapshot of all currently `pending` outgoing messages. No lock is
  /// held while the caller works through the returned set.
  fn list_pending(
    &self,
  ) -> impl Future<Output = Result<Vec<OutgoingMessage>, Self::Error>> + Send + '_;

  /// Advance an outgoing message to `sent`, recording `sent_at` once.
  /// Idempotent: a second call leaves the original `sent_at` untouched.
  fn mark_sent(
    &self,
    id: MessageId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Retrieve an outgoing message by id. Returns `None` if not found.
  fn get_outgoing(
    &self,
    id: MessageId,
  ) -> impl Future<Output = Result<Option<OutgoingMessage>, Self::Error>> + Send + '_;
}
