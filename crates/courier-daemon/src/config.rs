//! Daemon configuration, deserialised from `config.toml` and
//! `COURIER_`-prefixed environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use courier_gateway::GatewayConfig;
use serde::Deserialize;

/// Runtime configuration for `courierd`.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
  /// Base URL of the gateway, e.g. `http://signal-cli:8080`.
  pub gateway_url: String,
  /// The linked account (phone number) this daemon acts as.
  pub account:     String,
  #[serde(default = "default_device_name")]
  pub device_name: String,
  #[serde(default = "default_store_path")]
  pub store_path:  PathBuf,
  /// Holds the link marker and the QR artifact.
  #[serde(default = "default_data_dir")]
  pub data_dir:    PathBuf,

  #[serde(default = "default_receive_interval")]
  pub receive_interval_secs:  u64,
  #[serde(default = "default_dispatch_interval")]
  pub dispatch_interval_secs: u64,
  #[serde(default = "default_compute_interval")]
  pub compute_interval_secs:  u64,
  /// Stand-in duration for the deferred computation.
  #[serde(default = "default_compute_delay")]
  pub compute_delay_secs:     u64,
}

fn default_device_name() -> String { "courier".to_string() }
fn default_store_path() -> PathBuf { PathBuf::from("data/courier.db") }
fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_receive_interval() -> u64 { 5 }
fn default_dispatch_interval() -> u64 { 10 }
fn default_compute_interval() -> u64 { 5 }
fn default_compute_delay() -> u64 { 5 }

impl DaemonConfig {
  /// Layer the TOML file (optional) under `COURIER_*` environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("COURIER"))
      .build()?
      .try_deserialize()
  }

  pub fn gateway_config(&self) -> GatewayConfig {
    GatewayConfig {
      base_url:    self.gateway_url.clone(),
      account:     self.account.clone(),
      device_name: self.device_name.clone(),
    }
  }

  pub fn receive_interval(&self) -> Duration {
    Duration::from_secs(self.receive_interval_secs)
  }

  pub fn dispatch_interval(&self) -> Duration {
    Duration::from_secs(self.dispatch_interval_secs)
  }

  pub fn compute_interval(&self) -> Duration {
    Duration::from_secs(self.compute_interval_secs)
  }

  pub fn compute_delay(&self) -> Duration {
    Duration::from_secs(self.compute_delay_secs)
  }
}
