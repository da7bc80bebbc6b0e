//! Dispatch: deliver pending outgoing messages through the gateway.

use std::time::Duration;

use courier_core::store::MessageStore;
use courier_gateway::GatewayClient;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// One dispatch cycle: snapshot the pending set and attempt each send.
///
/// A failed send leaves its record `pending` for the next cycle — unbounded
/// retry by re-poll, no per-message backoff, no dead-letter. Store failures
/// propagate to the caller.
pub async fn dispatch_pending<S: MessageStore>(
  store:   &S,
  gateway: &GatewayClient,
) -> Result<(), S::Error> {
  let pending = store.list_pending().await?;
  if pending.is_empty() {
    return Ok(());
  }
  debug!(count = pending.len(), "dispatching pending messages");

  for message in pending {
    match gateway.send(&message.recipient, &message.content).await {
      Ok(()) => {
        store.mark_sent(message.id).await?;
        info!(id = message.id, recipient = %message.recipient, "sent message");
      }
      Err(error) => {
        warn!(
          id = message.id,
          recipient = %message.recipient,
          %error,
          "send failed; message stays pending"
        );
      }
    }
  }
  Ok(())
}

/// Poll-and-send forever at a fixed interval.
pub async fn run_dispatch_loop<S: MessageStore>(
  store:    S,
  gateway:  GatewayClient,
  interval: Duration,
) {
  loop {
    if let Err(error) = dispatch_pending(&store, &gateway).await {
      error!(%error, "dispatch cycle failed");
    }
    sleep(interval).await;
  }
}
