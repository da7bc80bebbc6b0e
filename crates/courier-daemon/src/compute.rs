//! Compute worker: a single-consumer work queue over `new` received rows.
//!
//! `claim_next_new`'s atomic claim is what keeps two workers from
//! double-processing a row; this module never reads-then-writes status
//! separately.

use std::time::Duration;

use courier_core::{
  message::NewOutgoing,
  responder::{self, COMPUTE_PREFIX},
  store::MessageStore,
};
use tokio::time::sleep;
use tracing::{error, info};

/// Claim one `new` row and finish it.
///
/// Rows carrying a `!compute` command get their deferred result queued;
/// anything else claimed here (e.g. a row orphaned by a crash between
/// intake's reply and its processed mark) is marked processed with no
/// output. Returns whether a row was claimed.
pub async fn compute_step<S: MessageStore>(
  store:   &S,
  account: &str,
  delay:   Duration,
) -> Result<bool, S::Error> {
  let Some(message) = store.claim_next_new().await? else {
    return Ok(false);
  };
  info!(id = message.id, "processing message");

  if message.content.starts_with(COMPUTE_PREFIX) {
    // Stand-in for the real computation.
    sleep(delay).await;
    let result = format!("Computed result for {}", message.content);

    store
      .insert_outgoing(NewOutgoing {
        received_message_id: Some(message.id),
        recipient:           responder::resolve_recipient(&message, account),
        content:             result,
      })
      .await?;
  }

  store.mark_processed(message.id).await?;
  info!(id = message.id, "completed message");
  Ok(true)
}

/// Drain claimed work forever, sleeping the poll interval when the queue is
/// empty.
pub async fn run_compute_loop<S: MessageStore>(
  store:         S,
  account:       String,
  poll_interval: Duration,
  delay:         Duration,
) {
  loop {
    match compute_step(&store, &account, delay).await {
      Ok(true) => {}
      Ok(false) => sleep(poll_interval).await,
      Err(error) => {
        error!(%error, "compute step failed");
        sleep(poll_interval).await;
      }
    }
  }
}
