//! One-time startup: store availability and the gateway link handshake.
//!
//! Failures here are fatal — the steady-state loops never start unless the
//! sequencer reaches [`LinkState::Linked`] and the store opens within its
//! retry budget.

use std::{
  future::Future,
  io,
  path::{Path, PathBuf},
  time::Duration,
};

use courier_gateway::{About, GatewayClient};
use courier_store_sqlite::SqliteStore;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, warn};

/// Health probe budget during linking.
pub const HEALTH_ATTEMPTS: u32 = 5;
/// Store open budget at startup.
pub const STORE_ATTEMPTS: u32 = 10;
/// Spacing between bootstrap retry attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Marker file recording a completed handshake; its presence skips linking
/// on later startups.
pub const LINK_MARKER: &str = ".linked";
/// File the QR artifact is written to for the operator to scan.
pub const QR_FILENAME: &str = "link-qr.png";

#[derive(Debug, Error)]
pub enum BootstrapError {
  #[error("gateway health probe failed after {attempts} attempts: {last}")]
  HealthExhausted {
    attempts: u32,
    last:     courier_gateway::Error,
  },

  #[error("store unavailable after {attempts} attempts: {last}")]
  StoreExhausted {
    attempts: u32,
    last:     courier_store_sqlite::Error,
  },

  #[error(transparent)]
  Gateway(#[from] courier_gateway::Error),

  #[error("io error: {0}")]
  Io(#[from] io::Error),
}

// ─── Store startup ───────────────────────────────────────────────────────────

/// Open the store, retrying transient failures with bounded backoff.
/// Schema creation is part of `open` and is idempotent.
pub async fn open_store(path: &Path) -> Result<SqliteStore, BootstrapError> {
  let mut attempt = 0;
  loop {
    attempt += 1;
    match SqliteStore::open(path).await {
      Ok(store) => {
        info!(path = %path.display(), "store opened");
        return Ok(store);
      }
      Err(error) => {
        warn!(attempt, limit = STORE_ATTEMPTS, %error, "store open failed");
        if attempt >= STORE_ATTEMPTS {
          return Err(BootstrapError::StoreExhausted { attempts: attempt, last: error });
        }
      }
    }
    sleep(RETRY_DELAY).await;
  }
}

// ─── Link sequencer ──────────────────────────────────────────────────────────

/// States of the one-time link handshake, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
  Unlinked,
  AwaitingGatewayHealth,
  AwaitingLinkCode,
  AwaitingUserScan,
  Linked,
}

/// Drives the link handshake with the gateway: probe health, request the QR
/// artifact, wait for the operator to scan it, re-verify, persist the marker.
pub struct LinkSequencer<'a> {
  gateway:         &'a GatewayClient,
  data_dir:        PathBuf,
  state:           LinkState,
  health_attempts: u32,
  retry_delay:     Duration,
}

impl<'a> LinkSequencer<'a> {
  pub fn new(gateway: &'a GatewayClient, data_dir: impl Into<PathBuf>) -> Self {
    Self {
      gateway,
      data_dir: data_dir.into(),
      state: LinkState::Unlinked,
      health_attempts: HEALTH_ATTEMPTS,
      retry_delay: RETRY_DELAY,
    }
  }

  /// Override the probe budget; tests use short delays.
  pub fn with_retry_policy(mut self, attempts: u32, delay: Duration) -> Self {
    self.health_attempts = attempts;
    self.retry_delay = delay;
    self
  }

  pub fn state(&self) -> LinkState { self.state }

  /// Run the handshake to completion, or short-circuit if the marker from a
  /// previous run exists.
  ///
  /// `wait_for_scan` receives the path of the written QR artifact and
  /// resolves once the operator confirms the scan (stdin in the binary, a
  /// no-op in tests).
  pub async fn run<F, Fut>(&mut self, wait_for_scan: F) -> Result<(), BootstrapError>
  where
    F: FnOnce(PathBuf) -> Fut,
    Fut: Future<Output = io::Result<()>>,
  {
    let marker = self.data_dir.join(LINK_MARKER);
    if tokio::fs::try_exists(&marker).await? {
      info!("link marker present; skipping handshake");
      self.state = LinkState::Linked;
      return Ok(());
    }

    tokio::fs::create_dir_all(&self.data_dir).await?;

    self.state = LinkState::AwaitingGatewayHealth;
    let about = self.probe_health().await?;
    info!(mode = %about.mode, version = %about.version, "gateway reachable");

    self.state = LinkState::AwaitingLinkCode;
    let artifact = self.gateway.link_device().await?;

    let qr_path = self.data_dir.join(QR_FILENAME);
    tokio::fs::write(&qr_path, &artifact).await?;
    info!(path = %qr_path.display(), "link artifact written");

    self.state = LinkState::AwaitingUserScan;
    wait_for_scan(qr_path).await?;

    // The operator may have cycled the gateway into its steady-state mode;
    // re-verify reachability before declaring success.
    let about = self.probe_health().await?;
    info!(mode = %about.mode, "gateway reachable after linking");

    tokio::fs::write(&marker, b"linked").await?;
    self.state = LinkState::Linked;
    Ok(())
  }

  async fn probe_health(&self) -> Result<About, BootstrapError> {
    let mut attempt = 0;
    loop {
      attempt += 1;
      match self.gateway.about().await {
        Ok(about) => return Ok(about),
        Err(error) => {
          warn!(attempt, limit = self.health_attempts, %error, "gateway health probe failed");
          if attempt >= self.health_attempts {
            return Err(BootstrapError::HealthExhausted { attempts: attempt, last: error });
          }
        }
      }
      sleep(self.retry_delay).await;
    }
  }
}
