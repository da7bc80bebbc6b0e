//! `courierd` — relays messages between the gateway and automated
//! responders, with a SQLite mailbox in between.
//!
//! # Usage
//!
//! ```
//! courierd --config config.toml          # link if needed, then run
//! courierd --config config.toml link     # run only the link handshake
//! ```

use std::{io, path::PathBuf};

use anyhow::{Context as _, anyhow};
use clap::{Parser, Subcommand};
use courier_daemon::{
  bootstrap::{self, LinkSequencer},
  compute::run_compute_loop,
  config::DaemonConfig,
  dispatch::run_dispatch_loop,
  intake::run_intake_loop,
};
use courier_gateway::GatewayClient;
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "courierd", about = "Message relay daemon")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
  /// Link if needed, then run the relay loops (the default).
  Run,
  /// Run only the link handshake, then exit.
  Link,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let config = DaemonConfig::load(&cli.config)
    .context("failed to read configuration")?;

  let gateway = GatewayClient::new(config.gateway_config())
    .context("failed to build gateway client")?;

  // The handshake gates everything; a failure here exits non-zero.
  let mut sequencer = LinkSequencer::new(&gateway, &config.data_dir);
  sequencer
    .run(wait_for_scan)
    .await
    .context("link handshake failed")?;

  if matches!(cli.command, Some(Command::Link)) {
    tracing::info!("linking complete");
    return Ok(());
  }

  let store = bootstrap::open_store(&config.store_path)
    .await
    .context("store unavailable")?;

  let intake = tokio::spawn(run_intake_loop(
    store.clone(),
    gateway.subscribe(config.receive_interval()),
    config.account.clone(),
    config.receive_interval(),
  ));
  let dispatch = tokio::spawn(run_dispatch_loop(
    store.clone(),
    gateway.clone(),
    config.dispatch_interval(),
  ));
  let compute = tokio::spawn(run_compute_loop(
    store,
    config.account.clone(),
    config.compute_interval(),
    config.compute_delay(),
  ));

  tracing::info!(account = %config.account, "relay loops started");

  // The loops only return by panicking; reaching any non-signal arm is an
  // error worth a non-zero exit.
  tokio::select! {
    _ = tokio::signal::ctrl_c() => {
      tracing::info!("interrupt received; shutting down");
      Ok(())
    }
    result = intake => Err(loop_exited("intake", result)),
    result = dispatch => Err(loop_exited("dispatch", result)),
    result = compute => Err(loop_exited("compute", result)),
  }
}

fn loop_exited(name: &str, result: Result<(), tokio::task::JoinError>) -> anyhow::Error {
  match result {
    Ok(()) => anyhow!("{name} loop exited unexpectedly"),
    Err(error) => anyhow!("{name} loop panicked: {error}"),
  }
}

/// Operator confirmation for the link handshake: point at the QR artifact
/// and block until Enter is pressed.
async fn wait_for_scan(qr_path: PathBuf) -> io::Result<()> {
  println!("Link artifact written to {}", qr_path.display());
  println!("Scan it with the messaging app on your phone, then press Enter...");

  let mut line = String::new();
  BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
  Ok(())
}
