//! [`SqliteStore`] — the SQLite implementation of [`MessageStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;

use courier_core::{
  message::{
    MessageId, NewOutgoing, NewReceived, OutgoingMessage, OutgoingStatus,
    ReceivedMessage, ReceivedStatus,
  },
  store::MessageStore,
};

use crate::{
  encode::{RawOutgoing, RawReceived, encode_dt},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Courier message store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// operations funnel through one serialized connection, so every status
/// transition executes as a single indivisible statement.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── MessageStore impl ───────────────────────────────────────────────────────

impl MessageStore for SqliteStore {
  type Error = Error;

  // ── Received ──────────────────────────────────────────────────────────────

  async fn insert_received(&self, input: NewReceived) -> Result<ReceivedMessage> {
    let at_str   = encode_dt(input.received_at);
    let source   = input.source.clone();
    let group_id = input.group_id.clone();
    let content  = input.content.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO messages_received (received_at, source, group_id, content, status)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![at_str, source, group_id, content, ReceivedStatus::New.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(ReceivedMessage {
      id,
      received_at: input.received_at,
      source:      input.source,
      group_id:    input.group_id,
      content:     input.content,
      status:      ReceivedStatus::New,
    })
  }

  async fn claim_next_new(&self) -> Result<Option<ReceivedMessage>> {
    // Claim-and-advance as one statement. The subquery and the UPDATE are a
    // single indivisible operation, so two concurrent claimants can never
    // both see the same row as 'new'.
    let raw: Option<RawReceived> = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              "UPDATE messages_received
               SET status = ?1
               WHERE id = (
                 SELECT id FROM messages_received
                 WHERE status = ?2
                 ORDER BY id
                 LIMIT 1
               )
               RETURNING id, received_at, source, group_id, content, status",
              rusqlite::params![
                ReceivedStatus::Processing.as_str(),
                ReceivedStatus::New.as_str(),
              ],
              |row| {
                Ok(RawReceived {
                  id:          row.get(0)?,
                  received_at: row.get(1)?,
                  source:      row.get(2)?,
                  group_id:    row.get(3)?,
                  content:     row.get(4)?,
                  status:      row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReceived::into_received).transpose()
  }

  async fn mark_processed(&self, id: MessageId) -> Result<()> {
    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE messages_received SET status = ?1 WHERE id = ?2",
          rusqlite::params![ReceivedStatus::Processed.as_str(), id],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(Error::ReceivedNotFound(id));
    }
    Ok(())
  }

  async fn get_received(&self, id: MessageId) -> Result<Option<ReceivedMessage>> {
    let raw: Option<RawReceived> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, received_at, source, group_id, content, status
               FROM messages_received WHERE id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawReceived {
                  id:          row.get(0)?,
                  received_at: row.get(1)?,
                  source:      row.get(2)?,
                  group_id:    row.get(3)?,
                  content:     row.get(4)?,
                  status:      row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReceived::into_received).transpose()
  }

  // ── Outgoing ──────────────────────────────────────────────────────────────

  async fn insert_outgoing(&self, input: NewOutgoing) -> Result<OutgoingMessage> {
    let received_message_id = input.received_message_id;
    let recipient           = input.recipient.clone();
    let content             = input.content.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO outgoing_messages (received_message_id, recipient, content, status)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            received_message_id,
            recipient,
            content,
            OutgoingStatus::Pending.as_str(),
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(OutgoingMessage {
      id,
      received_message_id: input.received_message_id,
      recipient:           input.recipient,
      content:             input.content,
      status:              OutgoingStatus::Pending,
      sent_at:             None,
    })
  }

  async fn list_pending(&self) -> Result<Vec<OutgoingMessage>> {
    let raws: Vec<RawOutgoing> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, received_message_id, recipient, content, status, sent_at
           FROM outgoing_messages
           WHERE status = ?1
           ORDER BY id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![OutgoingStatus::Pending.as_str()], |row| {
            Ok(RawOutgoing {
              id:                  row.get(0)?,
              received_message_id: row.get(1)?,
              recipient:           row.get(2)?,
              content:             row.get(3)?,
              status:              row.get(4)?,
              sent_at:             row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOutgoing::into_outgoing).collect()
  }

  async fn mark_sent(&self, id: MessageId) -> Result<()> {
    let at_str = encode_dt(chrono::Utc::now());

    // Conditional on 'pending' so sent_at is written exactly once; a second
    // call is a no-op rather than an overwrite.
    let (advanced, exists) = self
      .conn
      .call(move |conn| {
        let affected = conn.execute(
          "UPDATE outgoing_messages
           SET status = ?1, sent_at = ?2
           WHERE id = ?3 AND status = ?4",
          rusqlite::params![
            OutgoingStatus::Sent.as_str(),
            at_str,
            id,
            OutgoingStatus::Pending.as_str(),
          ],
        )?;

        if affected > 0 {
          return Ok((true, true));
        }

        let exists: bool = conn
          .query_row(
            "SELECT 1 FROM outgoing_messages WHERE id = ?1",
            rusqlite::params![id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        Ok((false, exists))
      })
      .await?;

    if !advanced && !exists {
      return Err(Error::OutgoingNotFound(id));
    }
    Ok(())
  }

  async fn get_outgoing(&self, id: MessageId) -> Result<Option<OutgoingMessage>> {
    let raw: Option<RawOutgoing> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, received_message_id, recipient, content, status, sent_at
               FROM outgoing_messages WHERE id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawOutgoing {
                  id:                  row.get(0)?,
                  received_message_id: row.get(1)?,
                  recipient:           row.get(2)?,
                  content:             row.get(3)?,
                  status:              row.get(4)?,
                  sent_at:             row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawOutgoing::into_outgoing).transpose()
  }
}
