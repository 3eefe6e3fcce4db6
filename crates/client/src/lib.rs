// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent controller client
//!
//! Drives a remote agent controller over one long-lived connection:
//! request/response correlation by transaction id, standing subscriptions
//! replayed on reconnect, and probe locking.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod connect;
pub mod env;
mod error;
mod model;
mod pending;

pub use client::{AgentControllerClient, ClientConfig, ReplayFailure, ReplayReport};
pub use connect::connect;
pub use error::ClientError;
pub use model::{AgentInfo, ClientEvent, ProbeInfo};
pub use pending::{PendingTransactions, Unmatched};
