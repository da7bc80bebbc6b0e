//! The Courier relay daemon.
//!
//! Wires the store, the gateway client, and the responder into three
//! long-running loops (intake, dispatch, compute) gated behind a one-time
//! link handshake. The loops share no in-memory state; all coordination
//! happens through message status in the store.

pub mod bootstrap;
pub mod compute;
pub mod config;
pub mod dispatch;
pub mod intake;
