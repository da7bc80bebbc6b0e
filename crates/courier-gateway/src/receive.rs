//! The inbound event subscription.

use std::{collections::VecDeque, time::Duration};

use courier_core::message::InboundEvent;
use tokio::time::sleep;

use crate::{GatewayClient, Result};

/// A long-lived pull subscription over the gateway's receive endpoint.
///
/// Each poll drains the gateway's accumulated envelopes into an internal
/// buffer; [`next_event`](Self::next_event) hands them out one at a time and
/// sleeps the poll interval between empty polls.
pub struct Subscription {
  client:        GatewayClient,
  poll_interval: Duration,
  buffer:        VecDeque<InboundEvent>,
}

impl Subscription {
  pub(crate) fn new(client: GatewayClient, poll_interval: Duration) -> Self {
    Self {
      client,
      poll_interval,
      buffer: VecDeque::new(),
    }
  }

  /// Block until the next inbound event arrives.
  ///
  /// Errors surface to the caller per poll; the subscription itself stays
  /// usable afterwards, so an intake loop can log and call again.
  pub async fn next_event(&mut self) -> Result<InboundEvent> {
    loop {
      if let Some(event) = self.buffer.pop_front() {
        return Ok(event);
      }

      let batch = self.client.fetch_events().await?;
      if batch.is_empty() {
        sleep(self.poll_interval).await;
      } else {
        tracing::debug!(count = batch.len(), "received inbound batch");
        self.buffer.extend(batch);
      }
    }
  }
}
