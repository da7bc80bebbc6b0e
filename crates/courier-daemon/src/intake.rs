//! Intake: persist inbound events and queue the responder's reply.

use std::time::Duration;

use courier_core::{
  message::{InboundEvent, NewOutgoing, NewReceived},
  responder::{self, Disposition},
  store::MessageStore,
};
use courier_gateway::Subscription;
use tokio::time::sleep;
use tracing::{error, info};

/// Persist one inbound event, decide the reply, and queue it.
///
/// The outgoing record is created before the received row is marked
/// processed: a crash in between re-evaluates the message on restart and at
/// worst duplicates the reply, never drops it.
pub async fn process_event<S: MessageStore>(
  store:   &S,
  account: &str,
  event:   InboundEvent,
) -> Result<(), S::Error> {
  let message = store
    .insert_received(NewReceived {
      received_at: event.timestamp,
      source:      event.source,
      group_id:    event.group_id,
      content:     event.content,
    })
    .await?;
  info!(id = message.id, source = %message.source, "stored received message");

  let reply = responder::decide(&message, account);
  store
    .insert_outgoing(NewOutgoing {
      received_message_id: Some(message.id),
      recipient:           reply.recipient.clone(),
      content:             reply.content,
    })
    .await?;
  info!(id = message.id, recipient = %reply.recipient, "queued reply");

  match reply.disposition {
    Disposition::MarkProcessed => store.mark_processed(message.id).await?,
    // The compute worker claims the row and finishes it.
    Disposition::Defer => {}
  }
  Ok(())
}

/// Consume the gateway subscription forever.
///
/// A failed poll or a failed store write is logged and retried on the next
/// iteration; nothing here ends the loop.
pub async fn run_intake_loop<S: MessageStore>(
  store:            S,
  mut subscription: Subscription,
  account:          String,
  retry_delay:      Duration,
) {
  loop {
    match subscription.next_event().await {
      Ok(event) => {
        if let Err(error) = process_event(&store, &account, event).await {
          error!(%error, "failed to process inbound event");
        }
      }
      Err(error) => {
        error!(%error, "inbound poll failed");
        sleep(retry_delay).await;
      }
    }
  }
}
