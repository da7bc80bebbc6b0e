//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::HashSet;

use chrono::{TimeZone, Utc};
use courier_core::{
  message::{NewOutgoing, NewReceived, OutgoingStatus, ReceivedStatus},
  store::MessageStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn received(source: &str, group_id: Option<&str>, content: &str) -> NewReceived {
  NewReceived {
    received_at: Utc::now(),
    source:      source.to_string(),
    group_id:    group_id.map(str::to_string),
    content:     content.to_string(),
  }
}

fn outgoing(received_id: Option<i64>, recipient: &str, content: &str) -> NewOutgoing {
  NewOutgoing {
    received_message_id: received_id,
    recipient:           recipient.to_string(),
    content:             content.to_string(),
  }
}

// ─── Received ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_received_starts_new() {
  let s = store().await;

  let msg = s
    .insert_received(received("+1555", None, "Hello"))
    .await
    .unwrap();
  assert_eq!(msg.status, ReceivedStatus::New);

  let fetched = s.get_received(msg.id).await.unwrap().unwrap();
  assert_eq!(fetched.source, "+1555");
  assert_eq!(fetched.content, "Hello");
  assert_eq!(fetched.status, ReceivedStatus::New);
}

#[tokio::test]
async fn group_id_none_round_trips_as_none() {
  let s = store().await;

  let direct = s
    .insert_received(received("+1555", None, "dm"))
    .await
    .unwrap();
  let grouped = s
    .insert_received(received("+1555", Some("group.abc"), "gm"))
    .await
    .unwrap();

  let direct = s.get_received(direct.id).await.unwrap().unwrap();
  let grouped = s.get_received(grouped.id).await.unwrap().unwrap();
  assert_eq!(direct.group_id, None);
  assert_eq!(grouped.group_id, Some("group.abc".to_string()));
}

#[tokio::test]
async fn received_at_round_trips_without_precision_loss() {
  let s = store().await;

  // A timestamp with sub-second precision, as gateway receipt times have.
  let at = Utc.timestamp_millis_opt(1_720_000_000_123).unwrap();
  let msg = s
    .insert_received(NewReceived {
      received_at: at,
      source:      "+1555".to_string(),
      group_id:    None,
      content:     "hi".to_string(),
    })
    .await
    .unwrap();

  let fetched = s.get_received(msg.id).await.unwrap().unwrap();
  assert_eq!(fetched.received_at, at);
}

#[tokio::test]
async fn claim_advances_to_processing() {
  let s = store().await;
  let msg = s
    .insert_received(received("+1555", None, "!compute x"))
    .await
    .unwrap();

  let claimed = s.claim_next_new().await.unwrap().unwrap();
  assert_eq!(claimed.id, msg.id);
  assert_eq!(claimed.status, ReceivedStatus::Processing);

  let fetched = s.get_received(msg.id).await.unwrap().unwrap();
  assert_eq!(fetched.status, ReceivedStatus::Processing);
}

#[tokio::test]
async fn claim_on_empty_store_returns_none() {
  let s = store().await;
  assert!(s.claim_next_new().await.unwrap().is_none());
}

#[tokio::test]
async fn claim_skips_non_new_rows() {
  let s = store().await;
  let first = s.insert_received(received("+1", None, "a")).await.unwrap();
  let second = s.insert_received(received("+2", None, "b")).await.unwrap();
  s.mark_processed(first.id).await.unwrap();

  let claimed = s.claim_next_new().await.unwrap().unwrap();
  assert_eq!(claimed.id, second.id);
  assert!(s.claim_next_new().await.unwrap().is_none());
}

#[tokio::test]
async fn claims_partition_rows_exactly() {
  let s = store().await;

  const ROWS: i64 = 40;
  const WORKERS: usize = 8;

  let mut expected = HashSet::new();
  for i in 0..ROWS {
    let msg = s
      .insert_received(received("+1555", None, &format!("msg {i}")))
      .await
      .unwrap();
    expected.insert(msg.id);
  }

  // Each worker claims until the store is drained; no row may be handed to
  // more than one worker.
  let mut handles = Vec::new();
  for _ in 0..WORKERS {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      let mut claimed = Vec::new();
      while let Some(msg) = s.claim_next_new().await.unwrap() {
        claimed.push(msg.id);
        tokio::task::yield_now().await;
      }
      claimed
    }));
  }

  let mut seen = HashSet::new();
  let mut total = 0usize;
  for handle in handles {
    for id in handle.await.unwrap() {
      assert!(seen.insert(id), "row {id} claimed twice");
      total += 1;
    }
  }

  assert_eq!(total as i64, ROWS);
  assert_eq!(seen, expected);
}

#[tokio::test]
async fn mark_processed_is_idempotent() {
  let s = store().await;
  let msg = s.insert_received(received("+1555", None, "x")).await.unwrap();

  s.mark_processed(msg.id).await.unwrap();
  s.mark_processed(msg.id).await.unwrap();

  let fetched = s.get_received(msg.id).await.unwrap().unwrap();
  assert_eq!(fetched.status, ReceivedStatus::Processed);
}

#[tokio::test]
async fn mark_processed_unknown_id_errors() {
  let s = store().await;
  let err = s.mark_processed(9999).await.unwrap_err();
  assert!(matches!(err, Error::ReceivedNotFound(9999)));
}

// ─── Outgoing ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_outgoing_starts_pending() {
  let s = store().await;
  let out = s
    .insert_outgoing(outgoing(None, "+1555", "Pong"))
    .await
    .unwrap();

  assert_eq!(out.status, OutgoingStatus::Pending);
  assert_eq!(out.sent_at, None);

  let pending = s.list_pending().await.unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].id, out.id);
}

#[tokio::test]
async fn list_pending_excludes_sent_rows() {
  let s = store().await;
  let a = s.insert_outgoing(outgoing(None, "+1", "a")).await.unwrap();
  let b = s.insert_outgoing(outgoing(None, "+2", "b")).await.unwrap();

  s.mark_sent(a.id).await.unwrap();

  let pending = s.list_pending().await.unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].id, b.id);
}

#[tokio::test]
async fn mark_sent_sets_sent_at_exactly_once() {
  let s = store().await;
  let out = s.insert_outgoing(outgoing(None, "+1555", "x")).await.unwrap();

  s.mark_sent(out.id).await.unwrap();
  let first = s.get_outgoing(out.id).await.unwrap().unwrap();
  assert_eq!(first.status, OutgoingStatus::Sent);
  let sent_at = first.sent_at.expect("sent_at set on transition");

  // Second call is a no-op: status stays sent, sent_at is untouched.
  s.mark_sent(out.id).await.unwrap();
  let second = s.get_outgoing(out.id).await.unwrap().unwrap();
  assert_eq!(second.sent_at, Some(sent_at));
}

#[tokio::test]
async fn mark_sent_unknown_id_errors() {
  let s = store().await;
  let err = s.mark_sent(4242).await.unwrap_err();
  assert!(matches!(err, Error::OutgoingNotFound(4242)));
}

#[tokio::test]
async fn outgoing_references_received_row() {
  let s = store().await;
  let msg = s
    .insert_received(received("+1555", None, "Ping"))
    .await
    .unwrap();
  let out = s
    .insert_outgoing(outgoing(Some(msg.id), "+1555", "Pong"))
    .await
    .unwrap();

  let fetched = s.get_outgoing(out.id).await.unwrap().unwrap();
  assert_eq!(fetched.received_message_id, Some(msg.id));
}
